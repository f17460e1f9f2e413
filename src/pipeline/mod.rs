//! 上传处理流水线
//!
//! RECEIVED → VALIDATING → PERSISTING → CLASSIFYING → AGGREGATING → DONE。
//! 校验阶段不写入任何数据，失败即 FAILED；进入 PERSISTING 之后只降级不中止。

pub mod aggregator;
pub mod classifier;
pub mod headers;
pub mod identity;
pub mod lock;
pub mod normalizer;
pub mod state;
pub mod writer;

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::cache::LectureCache;
use crate::config::PipelineConfig;
use crate::errors::{Result, SurveyError};
use crate::models::RequestContext;
use crate::models::batches::entities::{Batch, BatchType, PipelineState};
use crate::models::batches::requests::UploadMetadata;
use crate::models::batches::responses::PipelineWarning;
use crate::models::lectures::entities::Lecture;
use crate::storage::Storage;

pub use classifier::{
    ClassificationLimits, ClassificationRequest, CommentClassifier, classify_comments,
};
pub use identity::{UploadIdentity, check_metrics, validate_metadata};
pub use lock::BatchLocks;
pub use normalizer::{NormalizedTable, SourceFormat, normalize_upload};
pub use state::StateTracker;

impl ClassificationLimits {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            max_concurrency: config.max_concurrent_classifications.max(1),
            call_timeout: Duration::from_secs(config.classification_timeout_seconds.max(1)),
        }
    }
}

/// 通过校验、尚未写入的上传
#[derive(Debug)]
pub struct PreparedUpload {
    pub identity: UploadIdentity,
    pub table: NormalizedTable,
    tracker: StateTracker,
}

/// 一次上传的处理结果
#[derive(Debug, Clone)]
pub struct UploadReport {
    pub lecture: Lecture,
    pub batch: Batch,
    pub warnings: Vec<PipelineWarning>,
}

#[derive(Clone)]
pub struct UploadPipeline {
    storage: Arc<dyn Storage>,
    classifier: Arc<dyn CommentClassifier>,
    cache: LectureCache,
    locks: Arc<BatchLocks>,
    limits: ClassificationLimits,
}

impl UploadPipeline {
    pub fn new(
        storage: Arc<dyn Storage>,
        classifier: Arc<dyn CommentClassifier>,
        cache: LectureCache,
        limits: ClassificationLimits,
    ) -> Self {
        Self {
            storage,
            classifier,
            cache,
            locks: Arc::new(BatchLocks::new()),
            limits,
        }
    }

    /// 校验元数据并规范化上传文件，不产生任何写入
    pub fn prepare(
        &self,
        metadata: &UploadMetadata,
        file_name: &str,
        content: &[u8],
    ) -> Result<PreparedUpload> {
        let mut tracker = StateTracker::new();
        tracker.advance_local(PipelineState::Validating)?;

        let validated = validate_metadata(metadata).and_then(|identity| {
            let table = normalize_upload(file_name, content)?;
            Ok((identity, table))
        });

        match validated {
            Ok((identity, table)) => {
                info!(
                    "Upload validated for {} ({}): {} valid row(s), {} rejected",
                    identity.lecture.key.course_name,
                    identity.lecture.key.lecture_on,
                    table.rows.len(),
                    table.rejected_rows()
                );
                Ok(PreparedUpload {
                    identity,
                    table,
                    tracker,
                })
            }
            Err(e) => {
                tracker.advance_local(PipelineState::Failed)?;
                warn!("Upload rejected during validation: {}", e);
                Err(e)
            }
        }
    }

    /// 写入、分类、汇总
    pub async fn execute(
        &self,
        prepared: PreparedUpload,
        source_uri: Option<String>,
        context: &RequestContext,
    ) -> Result<UploadReport> {
        let PreparedUpload {
            identity,
            table,
            mut tracker,
        } = prepared;
        let storage = self.storage.as_ref();

        let lecture =
            identity::resolve_lecture(storage, &self.cache, identity.lecture.clone()).await?;
        let batch = storage
            .create_batch(identity.new_batch(
                lecture.id,
                source_uri,
                Some(context.user_id.clone()),
            ))
            .await?;

        let _guard = self.locks.acquire(batch.id).await;
        // 等锁期间讲义可能已被删除
        if storage.get_batch_by_id(batch.id).await?.is_none() {
            return Err(SurveyError::not_found(format!(
                "Batch {} was deleted before processing",
                batch.id
            )));
        }
        tracker.attach(batch.id);
        tracker.advance(storage, PipelineState::Persisting).await?;

        let mut warnings = table.warnings.clone();
        let rejected = table.rejected_rows();
        if rejected > 0 {
            storage.add_rejected_rows(batch.id, rejected as i32).await?;
        }

        let written =
            writer::write_rows(storage, batch.id, &lecture.course_name, &table.rows).await;
        if written.failed_rows > 0 {
            storage
                .add_rejected_rows(batch.id, written.failed_rows as i32)
                .await?;
        }
        warnings.extend(written.warnings);

        tracker.advance(storage, PipelineState::Classifying).await?;
        let classified = classify_comments(
            storage,
            self.classifier.as_ref(),
            written.jobs,
            self.limits,
        )
        .await;
        warnings.extend(classified.warnings);

        tracker.advance(storage, PipelineState::Aggregating).await?;
        aggregator::aggregate_batch(storage, batch.id).await?;
        tracker.advance(storage, PipelineState::Done).await?;

        let batch = storage
            .get_batch_by_id(batch.id)
            .await?
            .ok_or_else(|| SurveyError::not_found(format!("Batch {} not found", batch.id)))?;

        info!(
            "Batch {} done: {} row(s), {} comment(s), {} analyzed, {} warning(s)",
            batch.id,
            batch.processed_rows,
            batch.processed_comments,
            batch.analyzed_comments,
            warnings.len()
        );

        Ok(UploadReport {
            lecture,
            batch,
            warnings,
        })
    }

    /// prepare + execute
    pub async fn run_upload(
        &self,
        metadata: &UploadMetadata,
        file_name: &str,
        content: &[u8],
        source_uri: Option<String>,
        context: &RequestContext,
    ) -> Result<UploadReport> {
        let prepared = self.prepare(metadata, file_name, content)?;
        self.execute(prepared, source_uri, context).await
    }

    /// 速报版转为确定版，并在同一批次下重新汇总
    pub async fn finalize_batch(&self, batch_id: i64) -> Result<Batch> {
        let storage = self.storage.as_ref();
        let _guard = self.locks.acquire(batch_id).await;

        let batch = storage
            .get_batch_by_id(batch_id)
            .await?
            .ok_or_else(|| SurveyError::not_found(format!("Batch {batch_id} not found")))?;

        if batch.batch_type == BatchType::Confirmed {
            return Err(SurveyError::conflict(format!(
                "Batch {batch_id} is already confirmed"
            )));
        }
        if batch.status != PipelineState::Done {
            return Err(SurveyError::validation(format!(
                "Batch {batch_id} is still {}",
                batch.status
            )));
        }

        let mut tracker = StateTracker::resume(batch_id, batch.status);
        storage
            .update_batch_type(batch_id, BatchType::Confirmed)
            .await?;
        tracker.advance(storage, PipelineState::Aggregating).await?;
        aggregator::aggregate_batch(storage, batch_id).await?;
        tracker.advance(storage, PipelineState::Done).await?;

        info!("Batch {} finalized as confirmed", batch_id);

        storage
            .get_batch_by_id(batch_id)
            .await?
            .ok_or_else(|| SurveyError::not_found(format!("Batch {batch_id} not found")))
    }

    /// 在批次锁内级联删除批次
    pub async fn delete_batch(&self, batch_id: i64) -> Result<bool> {
        let _guard = self.locks.acquire(batch_id).await;
        let deleted = self.storage.delete_batch(batch_id).await?;
        if deleted {
            info!("Batch {} deleted with its responses, comments and aggregates", batch_id);
        }
        Ok(deleted)
    }

    /// 持有讲义下全部批次锁后级联删除讲义
    ///
    /// 批次锁按 ID 升序获取。获取期间出现新批次时重新获取。
    pub async fn delete_lecture(&self, lecture_id: i64) -> Result<bool> {
        let storage = self.storage.as_ref();

        let mut batch_ids = batch_ids_of(storage, lecture_id).await?;
        let _guards = loop {
            let guards = self.locks.acquire_many(&batch_ids).await;
            let current = batch_ids_of(storage, lecture_id).await?;
            if current == batch_ids {
                break guards;
            }
            debug!("Lecture {} gained batches while locking, retrying", lecture_id);
            batch_ids = current;
        };

        let deleted = storage.delete_lecture(lecture_id).await?;
        if deleted {
            self.cache.invalidate_id(lecture_id).await;
            info!(
                "Lecture {} deleted with {} batch(es)",
                lecture_id,
                batch_ids.len()
            );
        }
        Ok(deleted)
    }
}

async fn batch_ids_of(storage: &dyn Storage, lecture_id: i64) -> Result<Vec<i64>> {
    let mut ids: Vec<i64> = storage
        .list_batches_by_lecture(lecture_id)
        .await?
        .iter()
        .map(|b| b.id)
        .collect();
    ids.sort_unstable();
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::classifier::tests::ScriptedClassifier;
    use super::normalizer::tests::{TestRow, build_csv, build_xlsx};
    use super::*;
    use crate::models::summaries::ALL_GROUP;
    use crate::models::surveys::QuestionType;
    use crate::models::batches::responses::WarningKind;
    use crate::storage::sea_orm_storage::SeaOrmStorage;

    fn metadata() -> UploadMetadata {
        UploadMetadata {
            course_name: Some("データサイエンス概論".to_string()),
            academic_year: Some(2024),
            term: Some("前期".to_string()),
            session: Some("第1回".to_string()),
            lecture_on: Some("2024-05-10".to_string()),
            ..Default::default()
        }
    }

    async fn pipeline_with(classifier: ScriptedClassifier) -> (UploadPipeline, Arc<dyn Storage>) {
        let storage: Arc<dyn Storage> = Arc::new(SeaOrmStorage::new_in_memory().await.unwrap());
        let pipeline = UploadPipeline::new(
            storage.clone(),
            Arc::new(classifier),
            LectureCache::new(100, 60),
            ClassificationLimits {
                max_concurrency: 4,
                call_timeout: Duration::from_secs(5),
            },
        );
        (pipeline, storage)
    }

    fn ten_rows() -> Vec<TestRow<'static>> {
        let mut rows: Vec<TestRow<'static>> = (0..10)
            .map(|_| TestRow {
                learned: "回帰分析",
                ..Default::default()
            })
            .collect();
        rows[0].free = "とても分かりやすかった";
        rows[1].free = "音声が聞き取りにくかった";
        rows[6].satisfaction = "N/A";
        rows
    }

    #[tokio::test]
    async fn test_upload_with_partial_failures() {
        let (pipeline, storage) =
            pipeline_with(ScriptedClassifier::failing_on(&["音声が聞き取りにくかった"])).await;
        let ctx = RequestContext::development("tester");

        let report = pipeline
            .run_upload(&metadata(), "survey.csv", &build_csv(&ten_rows()), None, &ctx)
            .await
            .unwrap();

        assert_eq!(report.batch.status, PipelineState::Done);
        assert_eq!(report.batch.processed_rows, 9);
        assert_eq!(report.batch.rejected_rows, 1);
        // 9 条 learned + 2 条自由记述
        assert_eq!(report.batch.processed_comments, 11);
        assert_eq!(report.batch.analyzed_comments, 1);
        assert_eq!(report.batch.uploaded_by.as_deref(), Some("tester"));
        assert!(report.batch.aggregated_at.is_some());

        let kinds: Vec<_> = report.warnings.iter().map(|w| w.kind).collect();
        assert_eq!(
            kinds,
            vec![WarningKind::RowRejected, WarningKind::ClassificationFailed]
        );

        let responses = storage.list_responses_by_batch(report.batch.id).await.unwrap();
        assert_eq!(responses.len(), 9);

        let comments = storage.list_comments_by_batch(report.batch.id).await.unwrap();
        for comment in comments.iter().filter(|c| c.question_type == QuestionType::Learned) {
            assert!(!comment.is_analyzed);
            assert_eq!(comment.sentiment, None);
            assert_eq!(comment.category, None);
            assert_eq!(comment.importance, None);
        }

        let failed = comments
            .iter()
            .find(|c| c.text == "音声が聞き取りにくかった")
            .unwrap();
        assert!(!failed.is_analyzed);
        assert_eq!(report.warnings[1].comment_id, Some(failed.id));

        let succeeded = comments
            .iter()
            .find(|c| c.text == "とても分かりやすかった")
            .unwrap();
        assert!(succeeded.is_analyzed);

        assert!(storage.has_batch_aggregates(report.batch.id).await.unwrap());
        let aggregates = storage.get_batch_aggregates(report.batch.id).await.unwrap();
        let all = aggregates
            .summaries
            .iter()
            .find(|s| s.respondent_attribute == ALL_GROUP)
            .unwrap();
        assert_eq!(all.response_count, 9);
        assert_eq!(all.comment_count, 11);
        assert_eq!(all.important_comment_count, 1);
    }

    #[tokio::test]
    async fn test_format_error_persists_nothing() {
        let (pipeline, storage) = pipeline_with(ScriptedClassifier::succeeding()).await;
        let ctx = RequestContext::development("tester");

        let err = pipeline
            .run_upload(&metadata(), "survey.csv", b"", None, &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, SurveyError::Format(_)));

        let err = pipeline
            .run_upload(
                &UploadMetadata {
                    course_name: None,
                    ..metadata()
                },
                "survey.csv",
                &build_csv(&ten_rows()),
                None,
                &ctx,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SurveyError::Validation(_)));

        let lectures = storage
            .list_lectures_by_course("データサイエンス概論", None, None)
            .await
            .unwrap();
        assert!(lectures.is_empty());
    }

    #[tokio::test]
    async fn test_reupload_reuses_lecture() {
        let (pipeline, storage) = pipeline_with(ScriptedClassifier::succeeding()).await;
        let ctx = RequestContext::development("tester");
        let csv = build_csv(&ten_rows());

        let first = pipeline.run_upload(&metadata(), "survey.csv", &csv, None, &ctx).await.unwrap();
        let second = pipeline.run_upload(&metadata(), "survey.csv", &csv, None, &ctx).await.unwrap();

        assert_eq!(first.lecture.id, second.lecture.id);
        assert_ne!(first.batch.id, second.batch.id);
        let batches = storage.list_batches_by_lecture(first.lecture.id).await.unwrap();
        assert_eq!(batches.len(), 2);
    }

    #[tokio::test]
    async fn test_finalize_reaggregates_identically() {
        let (pipeline, storage) = pipeline_with(ScriptedClassifier::succeeding()).await;
        let ctx = RequestContext::development("tester");

        let report = pipeline
            .run_upload(&metadata(), "survey.csv", &build_csv(&ten_rows()), None, &ctx)
            .await
            .unwrap();
        let before = storage.get_batch_aggregates(report.batch.id).await.unwrap();

        let batch = pipeline.finalize_batch(report.batch.id).await.unwrap();
        assert_eq!(batch.id, report.batch.id);
        assert_eq!(batch.batch_type, BatchType::Confirmed);
        assert_eq!(batch.status, PipelineState::Done);

        let after = storage.get_batch_aggregates(report.batch.id).await.unwrap();
        assert_eq!(before, after);

        let err = pipeline.finalize_batch(report.batch.id).await.unwrap_err();
        assert!(matches!(err, SurveyError::Conflict(_)));

        let err = pipeline.finalize_batch(9999).await.unwrap_err();
        assert!(matches!(err, SurveyError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_cascade_delete_leaves_no_orphans() {
        let (pipeline, storage) = pipeline_with(ScriptedClassifier::succeeding()).await;
        let ctx = RequestContext::development("tester");

        let report = pipeline
            .run_upload(&metadata(), "survey.csv", &build_csv(&ten_rows()), None, &ctx)
            .await
            .unwrap();
        let batch_id = report.batch.id;

        assert!(pipeline.delete_batch(batch_id).await.unwrap());
        assert!(storage.list_responses_by_batch(batch_id).await.unwrap().is_empty());
        assert!(storage.list_comments_by_batch(batch_id).await.unwrap().is_empty());
        assert!(storage.get_batch_aggregates(batch_id).await.unwrap().is_empty());
        assert!(storage.get_batch_by_id(batch_id).await.unwrap().is_none());
        assert!(!pipeline.delete_batch(batch_id).await.unwrap());

        // 讲义仍在，可单独删除
        assert!(storage.delete_lecture(report.lecture.id).await.unwrap());
        assert!(storage.get_lecture_by_id(report.lecture.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_lock_table_drains_after_uploads() {
        let (pipeline, _storage) = pipeline_with(ScriptedClassifier::succeeding()).await;
        let ctx = RequestContext::development("tester");
        let csv = build_csv(&ten_rows());

        let mut last = None;
        for _ in 0..25 {
            let report = pipeline
                .run_upload(&metadata(), "survey.csv", &csv, None, &ctx)
                .await
                .unwrap();
            last = Some(report.batch.id);
        }
        assert!(pipeline.locks.is_empty());

        pipeline.finalize_batch(last.unwrap()).await.unwrap();
        assert!(pipeline.delete_batch(last.unwrap()).await.unwrap());
        assert!(pipeline.locks.is_empty());
    }

    #[tokio::test]
    async fn test_xlsx_upload_matches_csv() {
        let (pipeline, _storage) = pipeline_with(ScriptedClassifier::succeeding()).await;
        let ctx = RequestContext::development("tester");

        let from_csv = pipeline
            .run_upload(&metadata(), "survey.csv", &build_csv(&ten_rows()), None, &ctx)
            .await
            .unwrap();
        let from_xlsx = pipeline
            .run_upload(&metadata(), "survey.xlsx", &build_xlsx(&ten_rows()), None, &ctx)
            .await
            .unwrap();

        assert_eq!(from_csv.lecture.id, from_xlsx.lecture.id);
        assert_eq!(from_xlsx.batch.processed_rows, from_csv.batch.processed_rows);
        assert_eq!(from_xlsx.batch.rejected_rows, from_csv.batch.rejected_rows);
        assert_eq!(
            from_xlsx.batch.processed_comments,
            from_csv.batch.processed_comments
        );

        let err = pipeline
            .run_upload(&metadata(), "survey.xlsx", b"garbage", None, &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, SurveyError::Format(_)));
    }

    #[tokio::test]
    async fn test_lecture_delete_waits_for_batch_lock() {
        let (pipeline, storage) = pipeline_with(ScriptedClassifier::succeeding()).await;
        let ctx = RequestContext::development("tester");
        let report = pipeline
            .run_upload(&metadata(), "survey.csv", &build_csv(&ten_rows()), None, &ctx)
            .await
            .unwrap();
        let lecture_id = report.lecture.id;

        // 模拟仍在处理中的上传
        let held = pipeline.locks.acquire(report.batch.id).await;

        let deleting = {
            let pipeline = pipeline.clone();
            tokio::spawn(async move { pipeline.delete_lecture(lecture_id).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(!deleting.is_finished());
        assert!(storage.get_lecture_by_id(lecture_id).await.unwrap().is_some());
        assert!(storage.get_batch_by_id(report.batch.id).await.unwrap().is_some());

        drop(held);
        assert!(deleting.await.unwrap().unwrap());
        assert!(storage.get_lecture_by_id(lecture_id).await.unwrap().is_none());
        assert!(storage.get_batch_by_id(report.batch.id).await.unwrap().is_none());
        assert!(pipeline.locks.is_empty());

        assert!(!pipeline.delete_lecture(lecture_id).await.unwrap());
    }
}
