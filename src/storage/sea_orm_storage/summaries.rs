//! 汇总表存储操作

use super::SeaOrmStorage;
use crate::entity::comment_summaries::{
    ActiveModel as CommentSummaryActiveModel, Column as CommentSummaryColumn,
    Entity as CommentSummaries,
};
use crate::entity::score_distributions::{
    ActiveModel as DistributionActiveModel, Column as DistributionColumn,
    Entity as ScoreDistributions,
};
use crate::entity::survey_batches::{Column as BatchColumn, Entity as SurveyBatches};
use crate::entity::survey_summaries::{
    ActiveModel as SummaryActiveModel, Column as SummaryColumn, Entity as SurveySummaries,
};
use crate::errors::{Result, SurveyError};
use crate::models::summaries::{BatchAggregates, SurveySummary};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

impl SeaOrmStorage {
    /// 删除旧汇总行后写入新汇总行（同一事务）
    pub async fn replace_batch_aggregates_impl(
        &self,
        batch_id: i64,
        aggregates: &BatchAggregates,
        analyzed_comments: i32,
    ) -> Result<()> {
        let now = chrono::Utc::now().timestamp();

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| SurveyError::database_operation(format!("开启事务失败: {e}")))?;

        SurveySummaries::delete_many()
            .filter(SummaryColumn::BatchId.eq(batch_id))
            .exec(&txn)
            .await
            .map_err(|e| SurveyError::database_operation(format!("删除评分汇总失败: {e}")))?;

        ScoreDistributions::delete_many()
            .filter(DistributionColumn::BatchId.eq(batch_id))
            .exec(&txn)
            .await
            .map_err(|e| SurveyError::database_operation(format!("删除分数分布失败: {e}")))?;

        CommentSummaries::delete_many()
            .filter(CommentSummaryColumn::BatchId.eq(batch_id))
            .exec(&txn)
            .await
            .map_err(|e| SurveyError::database_operation(format!("删除评论汇总失败: {e}")))?;

        if !aggregates.summaries.is_empty() {
            let models: Vec<_> = aggregates
                .summaries
                .iter()
                .map(SummaryActiveModel::from_summary)
                .collect();
            SurveySummaries::insert_many(models)
                .exec(&txn)
                .await
                .map_err(|e| SurveyError::database_operation(format!("写入评分汇总失败: {e}")))?;
        }

        if !aggregates.distributions.is_empty() {
            let models: Vec<_> = aggregates
                .distributions
                .iter()
                .map(|d| DistributionActiveModel {
                    batch_id: Set(d.batch_id),
                    respondent_attribute: Set(d.respondent_attribute.clone()),
                    question_key: Set(d.question_key.to_string()),
                    score_value: Set(d.score_value),
                    count: Set(d.count),
                    ..Default::default()
                })
                .collect();
            ScoreDistributions::insert_many(models)
                .exec(&txn)
                .await
                .map_err(|e| SurveyError::database_operation(format!("写入分数分布失败: {e}")))?;
        }

        if !aggregates.comment_summaries.is_empty() {
            let models: Vec<_> = aggregates
                .comment_summaries
                .iter()
                .map(|c| CommentSummaryActiveModel {
                    batch_id: Set(c.batch_id),
                    respondent_attribute: Set(c.respondent_attribute.clone()),
                    analysis_type: Set(c.analysis_type.to_string()),
                    label: Set(c.label.clone()),
                    count: Set(c.count),
                    ..Default::default()
                })
                .collect();
            CommentSummaries::insert_many(models)
                .exec(&txn)
                .await
                .map_err(|e| SurveyError::database_operation(format!("写入评论汇总失败: {e}")))?;
        }

        SurveyBatches::update_many()
            .col_expr(BatchColumn::AnalyzedComments, Expr::value(analyzed_comments))
            .col_expr(BatchColumn::AggregatedAt, Expr::value(Some(now)))
            .filter(BatchColumn::Id.eq(batch_id))
            .exec(&txn)
            .await
            .map_err(|e| SurveyError::database_operation(format!("更新批次汇总时间失败: {e}")))?;

        txn.commit()
            .await
            .map_err(|e| SurveyError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(())
    }

    /// 获取批次的汇总行（按写入顺序）
    pub async fn get_batch_aggregates_impl(&self, batch_id: i64) -> Result<BatchAggregates> {
        let summaries = SurveySummaries::find()
            .filter(SummaryColumn::BatchId.eq(batch_id))
            .order_by_asc(SummaryColumn::Id)
            .all(&self.db)
            .await
            .map_err(|e| SurveyError::database_operation(format!("查询评分汇总失败: {e}")))?;

        let distributions = ScoreDistributions::find()
            .filter(DistributionColumn::BatchId.eq(batch_id))
            .order_by_asc(DistributionColumn::Id)
            .all(&self.db)
            .await
            .map_err(|e| SurveyError::database_operation(format!("查询分数分布失败: {e}")))?;

        let comment_summaries = CommentSummaries::find()
            .filter(CommentSummaryColumn::BatchId.eq(batch_id))
            .order_by_asc(CommentSummaryColumn::Id)
            .all(&self.db)
            .await
            .map_err(|e| SurveyError::database_operation(format!("查询评论汇总失败: {e}")))?;

        Ok(BatchAggregates {
            summaries: summaries.into_iter().map(|m| m.into_summary()).collect(),
            distributions: distributions
                .into_iter()
                .filter_map(|m| m.into_distribution())
                .collect(),
            comment_summaries: comment_summaries
                .into_iter()
                .filter_map(|m| m.into_comment_summary())
                .collect(),
        })
    }

    /// 批次是否已有汇总行
    pub async fn has_batch_aggregates_impl(&self, batch_id: i64) -> Result<bool> {
        let count = SurveySummaries::find()
            .filter(SummaryColumn::BatchId.eq(batch_id))
            .count(&self.db)
            .await
            .map_err(|e| SurveyError::database_operation(format!("查询评分汇总失败: {e}")))?;

        Ok(count > 0)
    }

    /// 获取多个批次在指定属性组下的评分汇总
    pub async fn list_summaries_for_batches_impl(
        &self,
        batch_ids: &[i64],
        attribute: &str,
    ) -> Result<Vec<SurveySummary>> {
        if batch_ids.is_empty() {
            return Ok(Vec::new());
        }

        let summaries = SurveySummaries::find()
            .filter(SummaryColumn::BatchId.is_in(batch_ids.iter().copied()))
            .filter(SummaryColumn::RespondentAttribute.eq(attribute))
            .order_by_asc(SummaryColumn::BatchId)
            .all(&self.db)
            .await
            .map_err(|e| SurveyError::database_operation(format!("查询评分汇总失败: {e}")))?;

        Ok(summaries.into_iter().map(|m| m.into_summary()).collect())
    }
}
