//! 讲义与批次的身份解析
//!
//! 元数据校验是纯函数，不产生任何写入；解析讲义时自然键冲突会重新查询并复用已有行。

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::cache::LectureCache;
use crate::errors::{Result, SurveyError};
use crate::models::batches::entities::{BatchType, NewBatch};
use crate::models::batches::requests::UploadMetadata;
use crate::models::lectures::entities::{Lecture, LectureKey, NewLecture, academic_year_of};
use crate::storage::Storage;

pub const DEFAULT_TERM: &str = "Unknown";
pub const DEFAULT_SESSION: &str = "Unknown";
pub const DEFAULT_INSTRUCTOR: &str = "TBD";

/// 校验后的上传身份信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadIdentity {
    pub lecture: NewLecture,
    pub batch_type: BatchType,
    pub zoom_participants: Option<i32>,
    pub recording_views: Option<i32>,
}

impl UploadIdentity {
    pub fn new_batch(
        &self,
        lecture_id: i64,
        source_uri: Option<String>,
        uploaded_by: Option<String>,
    ) -> NewBatch {
        NewBatch {
            lecture_id,
            batch_type: self.batch_type,
            zoom_participants: self.zoom_participants,
            recording_views: self.recording_views,
            source_uri,
            uploaded_by,
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// 参加人数与播放数不能为负
pub fn check_metrics(zoom_participants: Option<i32>, recording_views: Option<i32>) -> Result<()> {
    for (name, value) in [
        ("zoom_participants", zoom_participants),
        ("recording_views", recording_views),
    ] {
        if value.is_some_and(|v| v < 0) {
            return Err(SurveyError::validation(format!(
                "{name} must not be negative"
            )));
        }
    }
    Ok(())
}

/// 校验元数据并补全缺省值
pub fn validate_metadata(metadata: &UploadMetadata) -> Result<UploadIdentity> {
    let course_name = non_empty(&metadata.course_name)
        .ok_or_else(|| SurveyError::validation("course_name is required"))?;

    let raw_date = non_empty(&metadata.lecture_on)
        .ok_or_else(|| SurveyError::validation("lecture_on is required"))?;
    let lecture_on = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d").map_err(|e| {
        SurveyError::validation(format!("lecture_on must be YYYY-MM-DD ({raw_date}): {e}"))
    })?;

    let academic_year = metadata
        .academic_year
        .unwrap_or_else(|| academic_year_of(lecture_on));

    check_metrics(metadata.zoom_participants, metadata.recording_views)?;

    Ok(UploadIdentity {
        lecture: NewLecture {
            key: LectureKey {
                course_name: course_name.to_string(),
                academic_year,
                term: non_empty(&metadata.term).unwrap_or(DEFAULT_TERM).to_string(),
                session: non_empty(&metadata.session)
                    .unwrap_or(DEFAULT_SESSION)
                    .to_string(),
                lecture_on,
            },
            instructor_name: non_empty(&metadata.instructor_name)
                .unwrap_or(DEFAULT_INSTRUCTOR)
                .to_string(),
            description: non_empty(&metadata.description).map(str::to_string),
        },
        batch_type: metadata.batch_type,
        zoom_participants: metadata.zoom_participants,
        recording_views: metadata.recording_views,
    })
}

/// 查找或创建讲义
pub async fn resolve_lecture(
    storage: &dyn Storage,
    cache: &LectureCache,
    lecture: NewLecture,
) -> Result<Lecture> {
    if let Some(cached) = cache.get(&lecture.key).await {
        return Ok(cached);
    }

    if let Some(existing) = storage.find_lecture_by_key(&lecture.key).await? {
        cache.insert(existing.clone()).await;
        return Ok(existing);
    }

    let key = lecture.key.clone();
    let resolved = match storage.create_lecture(lecture).await {
        Ok(created) => {
            info!(
                "Lecture {} created: {} {} {}",
                created.id, created.course_name, created.lecture_on, created.session
            );
            created
        }
        Err(SurveyError::Conflict(msg)) => {
            debug!("Lecture insert raced with another upload, re-fetching: {}", msg);
            storage.find_lecture_by_key(&key).await?.ok_or_else(|| {
                SurveyError::database_operation("讲义唯一键冲突后未能重新查询到记录")
            })?
        }
        Err(e) => return Err(e),
    };

    cache.insert(resolved.clone()).await;
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::batches::entities::{Batch, PipelineState};
    use crate::models::batches::requests::BatchMetricsUpdate;
    use crate::models::summaries::{BatchAggregates, SurveySummary};
    use crate::models::surveys::requests::CommentFilter;
    use crate::models::surveys::responses::CommentPage;
    use crate::models::surveys::{
        Comment, CommentClassification, NewComment, NewResponse, SurveyResponse,
    };
    use crate::storage::sea_orm_storage::SeaOrmStorage;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    fn metadata() -> UploadMetadata {
        UploadMetadata {
            course_name: Some(" データサイエンス概論 ".to_string()),
            lecture_on: Some("2025-01-20".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults_are_filled() {
        let identity = validate_metadata(&metadata()).unwrap();
        let key = &identity.lecture.key;
        assert_eq!(key.course_name, "データサイエンス概論");
        assert_eq!(key.academic_year, 2024);
        assert_eq!(key.term, DEFAULT_TERM);
        assert_eq!(key.session, DEFAULT_SESSION);
        assert_eq!(identity.lecture.instructor_name, DEFAULT_INSTRUCTOR);
        assert_eq!(identity.batch_type, BatchType::Preliminary);
    }

    #[test]
    fn test_explicit_values_win() {
        let identity = validate_metadata(&UploadMetadata {
            academic_year: Some(2023),
            term: Some("後期".into()),
            session: Some("第3回".into()),
            instructor_name: Some("山田".into()),
            batch_type: BatchType::Confirmed,
            ..metadata()
        })
        .unwrap();
        assert_eq!(identity.lecture.key.academic_year, 2023);
        assert_eq!(identity.lecture.key.term, "後期");
        assert_eq!(identity.lecture.instructor_name, "山田");
        assert_eq!(identity.batch_type, BatchType::Confirmed);
    }

    #[test]
    fn test_missing_identity_fields() {
        let err = validate_metadata(&UploadMetadata {
            course_name: Some("  ".into()),
            ..metadata()
        })
        .unwrap_err();
        assert!(matches!(err, SurveyError::Validation(_)));

        let err = validate_metadata(&UploadMetadata {
            lecture_on: None,
            ..metadata()
        })
        .unwrap_err();
        assert!(matches!(err, SurveyError::Validation(_)));

        let err = validate_metadata(&UploadMetadata {
            lecture_on: Some("2025/01/20".into()),
            ..metadata()
        })
        .unwrap_err();
        assert!(matches!(err, SurveyError::Validation(_)));
    }

    #[test]
    fn test_negative_metrics_rejected() {
        let err = validate_metadata(&UploadMetadata {
            zoom_participants: Some(-1),
            ..metadata()
        })
        .unwrap_err();
        assert!(err.message().contains("zoom_participants"));
    }

    #[tokio::test]
    async fn test_resolution_is_idempotent() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let identity = validate_metadata(&metadata()).unwrap();

        let first = resolve_lecture(&storage, &LectureCache::new(10, 60), identity.lecture.clone())
            .await
            .unwrap();
        // 新缓存，强制走数据库
        let second = resolve_lecture(&storage, &LectureCache::new(10, 60), identity.lecture.clone())
            .await
            .unwrap();
        assert_eq!(first.id, second.id);

        let lectures = storage
            .list_lectures_by_course("データサイエンス概論", None, None)
            .await
            .unwrap();
        assert_eq!(lectures.len(), 1);
    }

    #[tokio::test]
    async fn test_conflict_is_resolved_by_refetch() {
        let storage = StaleLookupStorage::new().await;
        let identity = validate_metadata(&metadata()).unwrap();
        // 另一个上传已写入同一讲义
        let existing = storage
            .inner
            .create_lecture(identity.lecture.clone())
            .await
            .unwrap();

        let resolved = resolve_lecture(&storage, &LectureCache::new(10, 60), identity.lecture)
            .await
            .unwrap();
        assert_eq!(resolved.id, existing.id);
        // 首次查询落空，插入冲突后重新查询
        assert_eq!(storage.create_attempts.load(Ordering::SeqCst), 1);
        assert_eq!(storage.lookups.load(Ordering::SeqCst), 2);

        let lectures = storage
            .list_lectures_by_course("データサイエンス概論", None, None)
            .await
            .unwrap();
        assert_eq!(lectures.len(), 1);
    }

    /// 第一次按自然键查询返回 None，模拟并发插入前的读取
    struct StaleLookupStorage {
        inner: SeaOrmStorage,
        stale: AtomicBool,
        lookups: AtomicUsize,
        create_attempts: AtomicUsize,
    }

    impl StaleLookupStorage {
        async fn new() -> Self {
            Self {
                inner: SeaOrmStorage::new_in_memory().await.unwrap(),
                stale: AtomicBool::new(true),
                lookups: AtomicUsize::new(0),
                create_attempts: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl Storage for StaleLookupStorage {
        async fn find_lecture_by_key(&self, key: &LectureKey) -> Result<Option<Lecture>> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            if self.stale.swap(false, Ordering::SeqCst) {
                return Ok(None);
            }
            self.inner.find_lecture_by_key(key).await
        }

        async fn create_lecture(&self, lecture: NewLecture) -> Result<Lecture> {
            self.create_attempts.fetch_add(1, Ordering::SeqCst);
            self.inner.create_lecture(lecture).await
        }

        async fn get_lecture_by_id(&self, lecture_id: i64) -> Result<Option<Lecture>> {
            self.inner.get_lecture_by_id(lecture_id).await
        }

        async fn list_lectures_by_course(
            &self,
            course_name: &str,
            academic_year: Option<i32>,
            term: Option<&str>,
        ) -> Result<Vec<Lecture>> {
            self.inner
                .list_lectures_by_course(course_name, academic_year, term)
                .await
        }

        async fn list_lectures(
            &self,
            course_name: Option<&str>,
            academic_year: Option<i32>,
            term: Option<&str>,
        ) -> Result<Vec<Lecture>> {
            self.inner.list_lectures(course_name, academic_year, term).await
        }

        async fn delete_lecture(&self, lecture_id: i64) -> Result<bool> {
            self.inner.delete_lecture(lecture_id).await
        }

        async fn create_batch(&self, batch: NewBatch) -> Result<Batch> {
            self.inner.create_batch(batch).await
        }

        async fn get_batch_by_id(&self, batch_id: i64) -> Result<Option<Batch>> {
            self.inner.get_batch_by_id(batch_id).await
        }

        async fn list_batches_by_lecture(&self, lecture_id: i64) -> Result<Vec<Batch>> {
            self.inner.list_batches_by_lecture(lecture_id).await
        }

        async fn list_batches_by_lectures(&self, lecture_ids: &[i64]) -> Result<Vec<Batch>> {
            self.inner.list_batches_by_lectures(lecture_ids).await
        }

        async fn update_batch_metrics(
            &self,
            batch_id: i64,
            metrics: &BatchMetricsUpdate,
        ) -> Result<Option<Batch>> {
            self.inner.update_batch_metrics(batch_id, metrics).await
        }

        async fn update_batch_status(&self, batch_id: i64, status: PipelineState) -> Result<bool> {
            self.inner.update_batch_status(batch_id, status).await
        }

        async fn update_batch_type(&self, batch_id: i64, batch_type: BatchType) -> Result<bool> {
            self.inner.update_batch_type(batch_id, batch_type).await
        }

        async fn add_rejected_rows(&self, batch_id: i64, count: i32) -> Result<()> {
            self.inner.add_rejected_rows(batch_id, count).await
        }

        async fn delete_batch(&self, batch_id: i64) -> Result<bool> {
            self.inner.delete_batch(batch_id).await
        }

        async fn insert_response_row(
            &self,
            batch_id: i64,
            response: NewResponse,
            comments: Vec<NewComment>,
        ) -> Result<(SurveyResponse, Vec<Comment>)> {
            self.inner
                .insert_response_row(batch_id, response, comments)
                .await
        }

        async fn apply_comment_classification(
            &self,
            comment_id: i64,
            classification: CommentClassification,
        ) -> Result<bool> {
            self.inner
                .apply_comment_classification(comment_id, classification)
                .await
        }

        async fn list_responses_by_batch(&self, batch_id: i64) -> Result<Vec<SurveyResponse>> {
            self.inner.list_responses_by_batch(batch_id).await
        }

        async fn list_comments_by_batch(&self, batch_id: i64) -> Result<Vec<Comment>> {
            self.inner.list_comments_by_batch(batch_id).await
        }

        async fn list_comments_with_pagination(
            &self,
            batch_id: i64,
            filter: &CommentFilter,
            page: u64,
            size: u64,
        ) -> Result<CommentPage> {
            self.inner
                .list_comments_with_pagination(batch_id, filter, page, size)
                .await
        }

        async fn replace_batch_aggregates(
            &self,
            batch_id: i64,
            aggregates: &BatchAggregates,
            analyzed_comments: i32,
        ) -> Result<()> {
            self.inner
                .replace_batch_aggregates(batch_id, aggregates, analyzed_comments)
                .await
        }

        async fn get_batch_aggregates(&self, batch_id: i64) -> Result<BatchAggregates> {
            self.inner.get_batch_aggregates(batch_id).await
        }

        async fn has_batch_aggregates(&self, batch_id: i64) -> Result<bool> {
            self.inner.has_batch_aggregates(batch_id).await
        }

        async fn list_summaries_for_batches(
            &self,
            batch_ids: &[i64],
            attribute: &str,
        ) -> Result<Vec<SurveySummary>> {
            self.inner
                .list_summaries_for_batches(batch_ids, attribute)
                .await
        }
    }
}
