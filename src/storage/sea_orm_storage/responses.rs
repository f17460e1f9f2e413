//! 回答与评论存储操作

use super::SeaOrmStorage;
use crate::entity::response_comments::{
    ActiveModel as CommentActiveModel, Column as CommentColumn, Entity as ResponseComments,
};
use crate::entity::survey_batches::{Column as BatchColumn, Entity as SurveyBatches};
use crate::entity::survey_responses::{
    ActiveModel as ResponseActiveModel, Column as ResponseColumn, Entity as SurveyResponses,
};
use crate::errors::{Result, SurveyError};
use crate::models::common::PaginationInfo;
use crate::models::surveys::requests::CommentFilter;
use crate::models::surveys::responses::{CommentListItem, CommentPage};
use crate::models::surveys::{
    Comment, CommentClassification, NewComment, NewResponse, RespondentAttribute, SurveyResponse,
};
use sea_orm::sea_query::{Expr, ExprTrait};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, QueryTrait, Set, TransactionTrait,
};
use std::collections::{HashMap, HashSet};

impl SeaOrmStorage {
    /// 在一个事务内写入回答、评论，并累加批次计数
    pub async fn insert_response_row_impl(
        &self,
        batch_id: i64,
        response: NewResponse,
        comments: Vec<NewComment>,
    ) -> Result<(SurveyResponse, Vec<Comment>)> {
        let now = chrono::Utc::now().timestamp();

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| SurveyError::database_operation(format!("开启事务失败: {e}")))?;

        let saved_response = ResponseActiveModel::from_new_response(batch_id, &response, now)
            .insert(&txn)
            .await
            .map_err(|e| SurveyError::database_operation(format!("写入回答失败: {e}")))?;

        let mut saved_comments = Vec::with_capacity(comments.len());
        for comment in comments {
            let model = CommentActiveModel {
                response_id: Set(saved_response.id),
                question_type: Set(comment.question_type.to_string()),
                column_header: Set(comment.column_header),
                comment_text: Set(comment.text),
                llm_sentiment: Set(None),
                llm_category: Set(None),
                llm_importance: Set(None),
                llm_is_abusive: Set(false),
                is_analyzed: Set(false),
                analyzed_at: Set(None),
                ..Default::default()
            };
            let saved = model
                .insert(&txn)
                .await
                .map_err(|e| SurveyError::database_operation(format!("写入评论失败: {e}")))?;
            saved_comments.push(saved.into_comment());
        }

        SurveyBatches::update_many()
            .col_expr(
                BatchColumn::ProcessedRows,
                Expr::col(BatchColumn::ProcessedRows).add(1),
            )
            .col_expr(
                BatchColumn::ProcessedComments,
                Expr::col(BatchColumn::ProcessedComments).add(saved_comments.len() as i32),
            )
            .filter(BatchColumn::Id.eq(batch_id))
            .exec(&txn)
            .await
            .map_err(|e| SurveyError::database_operation(format!("更新批次计数失败: {e}")))?;

        txn.commit()
            .await
            .map_err(|e| SurveyError::database_operation(format!("提交事务失败: {e}")))?;

        Ok((saved_response.into_response(), saved_comments))
    }

    /// 写入分类结果，已分析过的评论不会被覆盖
    pub async fn apply_comment_classification_impl(
        &self,
        comment_id: i64,
        classification: CommentClassification,
    ) -> Result<bool> {
        let now = chrono::Utc::now().timestamp();

        let result = ResponseComments::update_many()
            .col_expr(
                CommentColumn::LlmSentiment,
                Expr::value(classification.sentiment.map(|s| s.to_string())),
            )
            .col_expr(
                CommentColumn::LlmCategory,
                Expr::value(classification.category.map(|c| c.to_string())),
            )
            .col_expr(
                CommentColumn::LlmImportance,
                Expr::value(classification.importance.map(|i| i.to_string())),
            )
            .col_expr(
                CommentColumn::LlmIsAbusive,
                Expr::value(classification.is_abusive),
            )
            .col_expr(CommentColumn::IsAnalyzed, Expr::value(true))
            .col_expr(CommentColumn::AnalyzedAt, Expr::value(Some(now)))
            .filter(CommentColumn::Id.eq(comment_id))
            .filter(CommentColumn::IsAnalyzed.eq(false))
            .exec(&self.db)
            .await
            .map_err(|e| SurveyError::database_operation(format!("写入分类结果失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 列出批次的全部回答
    pub async fn list_responses_by_batch_impl(&self, batch_id: i64) -> Result<Vec<SurveyResponse>> {
        let responses = SurveyResponses::find()
            .filter(ResponseColumn::BatchId.eq(batch_id))
            .order_by_asc(ResponseColumn::Id)
            .all(&self.db)
            .await
            .map_err(|e| SurveyError::database_operation(format!("查询回答失败: {e}")))?;

        Ok(responses.into_iter().map(|m| m.into_response()).collect())
    }

    /// 列出批次的全部评论
    pub async fn list_comments_by_batch_impl(&self, batch_id: i64) -> Result<Vec<Comment>> {
        let response_ids = SurveyResponses::find()
            .select_only()
            .column(ResponseColumn::Id)
            .filter(ResponseColumn::BatchId.eq(batch_id))
            .into_query();

        let comments = ResponseComments::find()
            .filter(CommentColumn::ResponseId.in_subquery(response_ids))
            .order_by_asc(CommentColumn::Id)
            .all(&self.db)
            .await
            .map_err(|e| SurveyError::database_operation(format!("查询评论失败: {e}")))?;

        Ok(comments.into_iter().map(|m| m.into_comment()).collect())
    }

    /// 按条件分页列出批次的评论，并附上回答者属性
    pub async fn list_comments_with_pagination_impl(
        &self,
        batch_id: i64,
        filter: &CommentFilter,
        page: u64,
        size: u64,
    ) -> Result<CommentPage> {
        let mut responses = SurveyResponses::find()
            .select_only()
            .column(ResponseColumn::Id)
            .filter(ResponseColumn::BatchId.eq(batch_id));

        // 属性筛选
        if let Some(attribute) = filter.attribute {
            responses =
                responses.filter(ResponseColumn::RespondentAttribute.eq(attribute.as_str()));
        }

        let mut select = ResponseComments::find()
            .filter(CommentColumn::ResponseId.in_subquery(responses.into_query()));

        if let Some(question_type) = filter.question_type {
            select = select.filter(CommentColumn::QuestionType.eq(question_type.as_str()));
        }
        if let Some(sentiment) = filter.sentiment {
            select = select.filter(CommentColumn::LlmSentiment.eq(sentiment.as_str()));
        }
        if let Some(category) = filter.category {
            select = select.filter(CommentColumn::LlmCategory.eq(category.as_str()));
        }
        if let Some(importance) = filter.importance {
            select = select.filter(CommentColumn::LlmImportance.eq(importance.as_str()));
        }
        if filter.analyzed_only {
            select = select.filter(CommentColumn::IsAnalyzed.eq(true));
        }
        if !filter.include_abusive {
            select = select.filter(CommentColumn::LlmIsAbusive.eq(false));
        }

        // 分页查询
        let paginator = select.order_by_asc(CommentColumn::Id).paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(|e| SurveyError::database_operation(format!("查询评论总数失败: {e}")))?;

        let comments = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(|e| SurveyError::database_operation(format!("查询评论列表失败: {e}")))?;

        // 批量查询回答者属性
        let response_ids: Vec<i64> = comments
            .iter()
            .map(|c| c.response_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        let attributes: HashMap<i64, RespondentAttribute> = if response_ids.is_empty() {
            HashMap::new()
        } else {
            SurveyResponses::find()
                .select_only()
                .column(ResponseColumn::Id)
                .column(ResponseColumn::RespondentAttribute)
                .filter(ResponseColumn::Id.is_in(response_ids))
                .into_tuple::<(i64, String)>()
                .all(&self.db)
                .await
                .map_err(|e| SurveyError::database_operation(format!("查询回答者属性失败: {e}")))?
                .into_iter()
                .map(|(id, attribute)| (id, RespondentAttribute::normalize(&attribute)))
                .collect()
        };

        let items = comments
            .into_iter()
            .map(|model| {
                let comment = model.into_comment();
                let respondent_attribute = attributes
                    .get(&comment.response_id)
                    .copied()
                    .unwrap_or(RespondentAttribute::Other);
                CommentListItem {
                    comment,
                    respondent_attribute,
                }
            })
            .collect();

        Ok(CommentPage {
            items,
            pagination: PaginationInfo::new(page, size, total),
        })
    }
}
