pub mod analysis;
pub mod attributes;
pub mod comments;
pub mod courses;
pub mod delete;
pub mod detail;
pub mod metrics;
pub mod weighted;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use std::sync::Arc;

use crate::models::batches::entities::{Batch, BatchType, PipelineState};
use crate::models::batches::requests::BatchMetricsUpdate;
use crate::models::lectures::requests::{
    CourseListQuery, LectureAnalysisQuery, WeightedAverageQuery,
};
use crate::models::summaries::ALL_GROUP;
use crate::models::surveys::RespondentAttribute;
use crate::models::surveys::requests::CommentListQuery;
use crate::pipeline::UploadPipeline;
use crate::storage::Storage;

pub struct LectureService {
    storage: Option<Arc<dyn Storage>>,
    pipeline: Option<UploadPipeline>,
}

impl LectureService {
    pub fn new_lazy() -> Self {
        Self {
            storage: None,
            pipeline: None,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_components(storage: Arc<dyn Storage>, pipeline: UploadPipeline) -> Self {
        Self {
            storage: Some(storage),
            pipeline: Some(pipeline),
        }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Arc<dyn Storage> {
        if let Some(storage) = &self.storage {
            storage.clone()
        } else {
            request
                .app_data::<web::Data<Arc<dyn Storage>>>()
                .expect("Storage not found in app data")
                .get_ref()
                .clone()
        }
    }

    pub(crate) fn get_pipeline(&self, request: &HttpRequest) -> UploadPipeline {
        if let Some(pipeline) = &self.pipeline {
            pipeline.clone()
        } else {
            request
                .app_data::<web::Data<UploadPipeline>>()
                .expect("UploadPipeline not found in app data")
                .get_ref()
                .clone()
        }
    }

    // 讲义详情及其批次
    pub async fn get_lecture_detail(
        &self,
        request: &HttpRequest,
        lecture_id: i64,
    ) -> ActixResult<HttpResponse> {
        detail::get_lecture_detail(self, request, lecture_id).await
    }

    // 单个讲义的分析结果
    pub async fn get_analysis(
        &self,
        request: &HttpRequest,
        lecture_id: i64,
        query: LectureAnalysisQuery,
    ) -> ActixResult<HttpResponse> {
        analysis::get_analysis(self, request, lecture_id, query).await
    }

    // 讲义评论列表（分页）
    pub async fn list_comments(
        &self,
        request: &HttpRequest,
        lecture_id: i64,
        query: CommentListQuery,
    ) -> ActixResult<HttpResponse> {
        comments::list_comments(self, request, lecture_id, query).await
    }

    pub async fn get_lecture_metrics(
        &self,
        request: &HttpRequest,
        lecture_id: i64,
    ) -> ActixResult<HttpResponse> {
        metrics::get_lecture_metrics(self, request, lecture_id).await
    }

    pub async fn update_lecture_metrics(
        &self,
        request: &HttpRequest,
        lecture_id: i64,
        body: BatchMetricsUpdate,
    ) -> ActixResult<HttpResponse> {
        metrics::update_lecture_metrics(self, request, lecture_id, body).await
    }

    // 删除讲义及其全部批次
    pub async fn delete_lecture(
        &self,
        request: &HttpRequest,
        lecture_id: i64,
    ) -> ActixResult<HttpResponse> {
        delete::delete_lecture(self, request, lecture_id).await
    }

    // 课程加权平均
    pub async fn get_weighted_averages(
        &self,
        request: &HttpRequest,
        query: WeightedAverageQuery,
    ) -> ActixResult<HttpResponse> {
        weighted::get_weighted_averages(self, request, query).await
    }

    // 课程及其授课一览
    pub async fn list_courses(
        &self,
        request: &HttpRequest,
        query: CourseListQuery,
    ) -> ActixResult<HttpResponse> {
        courses::list_courses(self, request, query).await
    }

    // 可选的受访者属性
    pub async fn list_attributes(&self) -> ActixResult<HttpResponse> {
        attributes::list_attributes().await
    }
}

/// 解析属性组参数，缺省为 ALL
pub(crate) fn parse_attribute(raw: Option<&str>) -> Option<String> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Some(ALL_GROUP.to_string()),
        Some(value) if value.eq_ignore_ascii_case(ALL_GROUP) => Some(ALL_GROUP.to_string()),
        Some(value) => value
            .to_lowercase()
            .parse::<RespondentAttribute>()
            .ok()
            .map(|attr| attr.as_str().to_string()),
    }
}

/// 选出用于展示的批次：最新的确定版，没有则取最新的速报版
///
/// 只考虑已经汇总完成的批次。
pub(crate) fn pick_reporting_batch(batches: &[Batch]) -> Option<&Batch> {
    let latest = |batch_type: BatchType| {
        batches
            .iter()
            .filter(|b| b.batch_type == batch_type && b.status == PipelineState::Done)
            .max_by_key(|b| (b.uploaded_at, b.id))
    };
    latest(BatchType::Confirmed).or_else(|| latest(BatchType::Preliminary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn batch(id: i64, batch_type: BatchType, status: PipelineState, minutes: i64) -> Batch {
        Batch {
            id,
            lecture_id: 1,
            batch_type,
            status,
            zoom_participants: None,
            recording_views: None,
            source_uri: None,
            uploaded_by: None,
            processed_rows: 0,
            rejected_rows: 0,
            processed_comments: 0,
            analyzed_comments: 0,
            uploaded_at: Utc::now() + Duration::minutes(minutes),
            aggregated_at: None,
        }
    }

    #[test]
    fn test_confirmed_batch_wins() {
        let batches = vec![
            batch(1, BatchType::Confirmed, PipelineState::Done, 0),
            batch(2, BatchType::Preliminary, PipelineState::Done, 10),
            batch(3, BatchType::Confirmed, PipelineState::Done, 5),
        ];
        assert_eq!(pick_reporting_batch(&batches).map(|b| b.id), Some(3));
    }

    #[test]
    fn test_falls_back_to_preliminary() {
        let batches = vec![
            batch(1, BatchType::Preliminary, PipelineState::Done, 0),
            batch(2, BatchType::Preliminary, PipelineState::Done, 10),
            batch(3, BatchType::Confirmed, PipelineState::Classifying, 20),
        ];
        assert_eq!(pick_reporting_batch(&batches).map(|b| b.id), Some(2));
        assert!(pick_reporting_batch(&[]).is_none());
    }

    #[test]
    fn test_parse_attribute() {
        assert_eq!(parse_attribute(None).as_deref(), Some("ALL"));
        assert_eq!(parse_attribute(Some(" all ")).as_deref(), Some("ALL"));
        assert_eq!(parse_attribute(Some("Student")).as_deref(), Some("student"));
        assert!(parse_attribute(Some("alumni")).is_none());
    }
}
