//! 批次存储操作

use super::SeaOrmStorage;
use crate::entity::comment_summaries::{
    Column as CommentSummaryColumn, Entity as CommentSummaries,
};
use crate::entity::response_comments::{Column as CommentColumn, Entity as ResponseComments};
use crate::entity::score_distributions::{
    Column as DistributionColumn, Entity as ScoreDistributions,
};
use crate::entity::survey_batches::{ActiveModel, Column, Entity as SurveyBatches};
use crate::entity::survey_responses::{Column as ResponseColumn, Entity as SurveyResponses};
use crate::entity::survey_summaries::{Column as SummaryColumn, Entity as SurveySummaries};
use crate::errors::{Result, SurveyError};
use crate::models::batches::entities::{Batch, BatchType, NewBatch, PipelineState};
use crate::models::batches::requests::BatchMetricsUpdate;
use sea_orm::sea_query::{Expr, ExprTrait};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, QueryTrait, Set, TransactionTrait,
};

impl SeaOrmStorage {
    /// 创建批次
    pub async fn create_batch_impl(&self, req: NewBatch) -> Result<Batch> {
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            lecture_id: Set(req.lecture_id),
            batch_type: Set(req.batch_type.to_string()),
            status: Set(PipelineState::Received.to_string()),
            zoom_participants: Set(req.zoom_participants),
            recording_views: Set(req.recording_views),
            source_uri: Set(req.source_uri),
            uploaded_by: Set(req.uploaded_by),
            processed_rows: Set(0),
            rejected_rows: Set(0),
            processed_comments: Set(0),
            analyzed_comments: Set(0),
            uploaded_at: Set(now),
            aggregated_at: Set(None),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| SurveyError::database_operation(format!("创建批次失败: {e}")))?;

        Ok(result.into_batch())
    }

    /// 通过 ID 获取批次
    pub async fn get_batch_by_id_impl(&self, batch_id: i64) -> Result<Option<Batch>> {
        let result = SurveyBatches::find_by_id(batch_id)
            .one(&self.db)
            .await
            .map_err(|e| SurveyError::database_operation(format!("查询批次失败: {e}")))?;

        Ok(result.map(|m| m.into_batch()))
    }

    /// 列出讲义的批次（新的在前）
    pub async fn list_batches_by_lecture_impl(&self, lecture_id: i64) -> Result<Vec<Batch>> {
        let batches = SurveyBatches::find()
            .filter(Column::LectureId.eq(lecture_id))
            .order_by_desc(Column::UploadedAt)
            .order_by_desc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| SurveyError::database_operation(format!("查询批次列表失败: {e}")))?;

        Ok(batches.into_iter().map(|m| m.into_batch()).collect())
    }

    /// 列出多个讲义的批次（新的在前）
    pub async fn list_batches_by_lectures_impl(&self, lecture_ids: &[i64]) -> Result<Vec<Batch>> {
        if lecture_ids.is_empty() {
            return Ok(Vec::new());
        }

        let batches = SurveyBatches::find()
            .filter(Column::LectureId.is_in(lecture_ids.iter().copied()))
            .order_by_desc(Column::UploadedAt)
            .order_by_desc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| SurveyError::database_operation(format!("查询批次列表失败: {e}")))?;

        Ok(batches.into_iter().map(|m| m.into_batch()).collect())
    }

    /// 覆盖批次的参加人数与录像播放数
    pub async fn update_batch_metrics_impl(
        &self,
        batch_id: i64,
        metrics: &BatchMetricsUpdate,
    ) -> Result<Option<Batch>> {
        let result = SurveyBatches::update_many()
            .col_expr(Column::ZoomParticipants, Expr::value(metrics.zoom_participants))
            .col_expr(Column::RecordingViews, Expr::value(metrics.recording_views))
            .filter(Column::Id.eq(batch_id))
            .exec(&self.db)
            .await
            .map_err(|e| SurveyError::database_operation(format!("更新批次指标失败: {e}")))?;

        if result.rows_affected == 0 {
            return Ok(None);
        }
        self.get_batch_by_id_impl(batch_id).await
    }

    /// 更新批次状态
    pub async fn update_batch_status_impl(
        &self,
        batch_id: i64,
        status: PipelineState,
    ) -> Result<bool> {
        let result = SurveyBatches::update_many()
            .col_expr(Column::Status, Expr::value(status.to_string()))
            .filter(Column::Id.eq(batch_id))
            .exec(&self.db)
            .await
            .map_err(|e| SurveyError::database_operation(format!("更新批次状态失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 修改批次类型
    pub async fn update_batch_type_impl(
        &self,
        batch_id: i64,
        batch_type: BatchType,
    ) -> Result<bool> {
        let result = SurveyBatches::update_many()
            .col_expr(Column::BatchType, Expr::value(batch_type.to_string()))
            .filter(Column::Id.eq(batch_id))
            .exec(&self.db)
            .await
            .map_err(|e| SurveyError::database_operation(format!("更新批次类型失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 累加被拒绝的行数
    pub async fn add_rejected_rows_impl(&self, batch_id: i64, count: i32) -> Result<()> {
        if count == 0 {
            return Ok(());
        }

        SurveyBatches::update_many()
            .col_expr(
                Column::RejectedRows,
                Expr::col(Column::RejectedRows).add(count),
            )
            .filter(Column::Id.eq(batch_id))
            .exec(&self.db)
            .await
            .map_err(|e| SurveyError::database_operation(format!("更新拒绝行数失败: {e}")))?;

        Ok(())
    }

    /// 删除批次及其全部回答、评论与汇总
    pub async fn delete_batch_impl(&self, batch_id: i64) -> Result<bool> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| SurveyError::database_operation(format!("开启事务失败: {e}")))?;

        let deleted = delete_batches_in_txn(&txn, &[batch_id]).await?;

        txn.commit()
            .await
            .map_err(|e| SurveyError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(deleted > 0)
    }
}

/// 按依赖顺序删除批次：评论 → 回答 → 汇总表 → 批次
///
/// 返回删除的批次数。
pub(super) async fn delete_batches_in_txn(
    txn: &DatabaseTransaction,
    batch_ids: &[i64],
) -> Result<u64> {
    if batch_ids.is_empty() {
        return Ok(0);
    }

    let response_ids = SurveyResponses::find()
        .select_only()
        .column(ResponseColumn::Id)
        .filter(ResponseColumn::BatchId.is_in(batch_ids.iter().copied()))
        .into_query();

    ResponseComments::delete_many()
        .filter(CommentColumn::ResponseId.in_subquery(response_ids))
        .exec(txn)
        .await
        .map_err(|e| SurveyError::database_operation(format!("删除评论失败: {e}")))?;

    SurveyResponses::delete_many()
        .filter(ResponseColumn::BatchId.is_in(batch_ids.iter().copied()))
        .exec(txn)
        .await
        .map_err(|e| SurveyError::database_operation(format!("删除回答失败: {e}")))?;

    SurveySummaries::delete_many()
        .filter(SummaryColumn::BatchId.is_in(batch_ids.iter().copied()))
        .exec(txn)
        .await
        .map_err(|e| SurveyError::database_operation(format!("删除评分汇总失败: {e}")))?;

    ScoreDistributions::delete_many()
        .filter(DistributionColumn::BatchId.is_in(batch_ids.iter().copied()))
        .exec(txn)
        .await
        .map_err(|e| SurveyError::database_operation(format!("删除分数分布失败: {e}")))?;

    CommentSummaries::delete_many()
        .filter(CommentSummaryColumn::BatchId.is_in(batch_ids.iter().copied()))
        .exec(txn)
        .await
        .map_err(|e| SurveyError::database_operation(format!("删除评论汇总失败: {e}")))?;

    let result = SurveyBatches::delete_many()
        .filter(Column::Id.is_in(batch_ids.iter().copied()))
        .exec(txn)
        .await
        .map_err(|e| SurveyError::database_operation(format!("删除批次失败: {e}")))?;

    Ok(result.rows_affected)
}
