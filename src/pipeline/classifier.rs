//! 评论分类
//!
//! 以有界并发调用外部分类接口。单条失败只记录警告，评论保持未分析状态，
//! 本次流水线内不重试。

use std::time::Duration;

use futures_util::{StreamExt, stream};
use tracing::{debug, warn};

use crate::errors::{Result, SurveyError};
use crate::models::batches::responses::PipelineWarning;
use crate::models::surveys::{CommentClassification, QuestionType};
use crate::storage::Storage;

/// 分类请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationRequest {
    pub text: String,
    pub course_name: String,
    // 题目表头（去掉前缀后的原文）
    pub question: String,
}

/// 外部分类接口
#[async_trait::async_trait]
pub trait CommentClassifier: Send + Sync {
    async fn classify(&self, request: &ClassificationRequest) -> Result<CommentClassification>;
}

/// 一条待分类的已保存评论
#[derive(Debug, Clone)]
pub struct ClassificationJob {
    pub comment_id: i64,
    pub question_type: QuestionType,
    pub column_header: String,
    pub request: ClassificationRequest,
}

#[derive(Debug, Clone, Copy)]
pub struct ClassificationLimits {
    pub max_concurrency: usize,
    pub call_timeout: Duration,
}

#[derive(Debug, Default)]
pub struct ClassificationOutcome {
    pub analyzed: usize,
    pub warnings: Vec<PipelineWarning>,
}

/// 分类并写回结果
///
/// 警告按评论 ID 排序，与完成顺序无关。
pub async fn classify_comments(
    storage: &dyn Storage,
    classifier: &dyn CommentClassifier,
    jobs: Vec<ClassificationJob>,
    limits: ClassificationLimits,
) -> ClassificationOutcome {
    let jobs: Vec<ClassificationJob> = jobs
        .into_iter()
        .filter(|job| !job.question_type.is_excluded_from_analysis())
        .collect();

    if jobs.is_empty() {
        return ClassificationOutcome::default();
    }

    let results: Vec<(ClassificationJob, Result<bool>)> = stream::iter(jobs)
        .map(|job| async move {
            let result = classify_one(storage, classifier, &job, limits.call_timeout).await;
            (job, result)
        })
        .buffer_unordered(limits.max_concurrency.max(1))
        .collect()
        .await;

    let mut outcome = ClassificationOutcome::default();
    for (job, result) in results {
        match result {
            Ok(true) => outcome.analyzed += 1,
            Ok(false) => {
                debug!("Comment {} was already analyzed, skipped", job.comment_id);
            }
            Err(e) => {
                warn!("Classification failed for comment {}: {}", job.comment_id, e);
                outcome.warnings.push(PipelineWarning::classification_failed(
                    job.comment_id,
                    job.column_header,
                    e.message(),
                ));
            }
        }
    }
    outcome.warnings.sort_by_key(|w| w.comment_id);

    outcome
}

async fn classify_one(
    storage: &dyn Storage,
    classifier: &dyn CommentClassifier,
    job: &ClassificationJob,
    call_timeout: Duration,
) -> Result<bool> {
    let classification = tokio::time::timeout(call_timeout, classifier.classify(&job.request))
        .await
        .map_err(|_| {
            SurveyError::classification(format!(
                "timed out after {}s",
                call_timeout.as_secs_f64()
            ))
        })??;

    storage
        .apply_comment_classification(job.comment_id, classification)
        .await
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::surveys::{Category, Importance, Sentiment};

    /// 按评论内容决定成败的测试分类器
    pub(crate) struct ScriptedClassifier {
        pub fail_on: Vec<String>,
        pub delay: Option<Duration>,
    }

    impl ScriptedClassifier {
        pub(crate) fn succeeding() -> Self {
            Self {
                fail_on: Vec::new(),
                delay: None,
            }
        }

        pub(crate) fn failing_on(texts: &[&str]) -> Self {
            Self {
                fail_on: texts.iter().map(|t| t.to_string()).collect(),
                delay: None,
            }
        }
    }

    #[async_trait::async_trait]
    impl CommentClassifier for ScriptedClassifier {
        async fn classify(
            &self,
            request: &ClassificationRequest,
        ) -> Result<CommentClassification> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail_on.contains(&request.text) {
                return Err(SurveyError::classification("upstream returned 503"));
            }
            Ok(CommentClassification {
                sentiment: Some(Sentiment::Positive),
                category: Some(Category::Content),
                importance: Some(Importance::High),
                is_abusive: false,
            })
        }
    }
}
