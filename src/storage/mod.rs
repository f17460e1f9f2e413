use std::sync::Arc;

use crate::models::{
    batches::entities::{Batch, BatchType, NewBatch, PipelineState},
    batches::requests::BatchMetricsUpdate,
    lectures::entities::{Lecture, LectureKey, NewLecture},
    summaries::{BatchAggregates, SurveySummary},
    surveys::requests::CommentFilter,
    surveys::responses::CommentPage,
    surveys::{Comment, CommentClassification, NewComment, NewResponse, SurveyResponse},
};

use crate::errors::Result;

pub mod sea_orm_storage;

#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// 讲义管理方法
    // 通过自然键获取讲义
    async fn find_lecture_by_key(&self, key: &LectureKey) -> Result<Option<Lecture>>;
    // 创建讲义，自然键冲突时返回 Conflict
    async fn create_lecture(&self, lecture: NewLecture) -> Result<Lecture>;
    // 通过ID获取讲义
    async fn get_lecture_by_id(&self, lecture_id: i64) -> Result<Option<Lecture>>;
    // 列出课程下的讲义
    async fn list_lectures_by_course(
        &self,
        course_name: &str,
        academic_year: Option<i32>,
        term: Option<&str>,
    ) -> Result<Vec<Lecture>>;
    // 按条件列出讲义（课程名部分匹配）
    async fn list_lectures(
        &self,
        course_name: Option<&str>,
        academic_year: Option<i32>,
        term: Option<&str>,
    ) -> Result<Vec<Lecture>>;
    // 级联删除讲义
    async fn delete_lecture(&self, lecture_id: i64) -> Result<bool>;

    /// 批次管理方法
    // 创建批次
    async fn create_batch(&self, batch: NewBatch) -> Result<Batch>;
    // 通过ID获取批次
    async fn get_batch_by_id(&self, batch_id: i64) -> Result<Option<Batch>>;
    // 列出讲义的全部批次（按上传时间倒序）
    async fn list_batches_by_lecture(&self, lecture_id: i64) -> Result<Vec<Batch>>;
    // 列出多个讲义的批次
    async fn list_batches_by_lectures(&self, lecture_ids: &[i64]) -> Result<Vec<Batch>>;
    // 覆盖批次指标，批次不存在时返回 None
    async fn update_batch_metrics(
        &self,
        batch_id: i64,
        metrics: &BatchMetricsUpdate,
    ) -> Result<Option<Batch>>;
    // 更新批次状态
    async fn update_batch_status(&self, batch_id: i64, status: PipelineState) -> Result<bool>;
    // 修改批次类型
    async fn update_batch_type(&self, batch_id: i64, batch_type: BatchType) -> Result<bool>;
    // 记录被拒绝的行数
    async fn add_rejected_rows(&self, batch_id: i64, count: i32) -> Result<()>;
    // 级联删除批次
    async fn delete_batch(&self, batch_id: i64) -> Result<bool>;

    /// 回答与评论方法
    // 在同一事务内写入一行回答及其评论，并累加批次计数
    async fn insert_response_row(
        &self,
        batch_id: i64,
        response: NewResponse,
        comments: Vec<NewComment>,
    ) -> Result<(SurveyResponse, Vec<Comment>)>;
    // 写入分类结果（仅对尚未分析的评论生效）
    async fn apply_comment_classification(
        &self,
        comment_id: i64,
        classification: CommentClassification,
    ) -> Result<bool>;
    // 列出批次的全部回答
    async fn list_responses_by_batch(&self, batch_id: i64) -> Result<Vec<SurveyResponse>>;
    // 列出批次的全部评论
    async fn list_comments_by_batch(&self, batch_id: i64) -> Result<Vec<Comment>>;
    // 按条件分页列出批次的评论
    async fn list_comments_with_pagination(
        &self,
        batch_id: i64,
        filter: &CommentFilter,
        page: u64,
        size: u64,
    ) -> Result<CommentPage>;

    /// 汇总方法
    // 整体替换批次的汇总行，并记录汇总时间与已分析评论数
    async fn replace_batch_aggregates(
        &self,
        batch_id: i64,
        aggregates: &BatchAggregates,
        analyzed_comments: i32,
    ) -> Result<()>;
    // 获取批次的汇总行
    async fn get_batch_aggregates(&self, batch_id: i64) -> Result<BatchAggregates>;
    // 批次是否已有汇总行
    async fn has_batch_aggregates(&self, batch_id: i64) -> Result<bool>;
    // 获取多个批次在某属性组下的评分汇总
    async fn list_summaries_for_batches(
        &self,
        batch_ids: &[i64],
        attribute: &str,
    ) -> Result<Vec<SurveySummary>>;
}

pub async fn create_storage() -> Result<Arc<dyn Storage>> {
    let storage = sea_orm_storage::SeaOrmStorage::new_async().await?;
    Ok(Arc::new(storage))
}
