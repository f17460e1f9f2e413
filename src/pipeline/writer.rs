//! 回答与评论写入
//!
//! 每个 CSV 行一个事务。某行写入失败不影响已提交的其他行。

use tracing::{debug, warn};

use super::classifier::{ClassificationJob, ClassificationRequest};
use super::headers::question_text;
use super::normalizer::NormalizedRow;
use crate::models::batches::responses::PipelineWarning;
use crate::storage::Storage;

#[derive(Debug, Default)]
pub struct WriteOutcome {
    pub persisted_rows: usize,
    pub persisted_comments: usize,
    pub failed_rows: usize,
    // 需要送去分类的评论
    pub jobs: Vec<ClassificationJob>,
    pub warnings: Vec<PipelineWarning>,
}

/// 按行写入回答及其评论
pub async fn write_rows(
    storage: &dyn Storage,
    batch_id: i64,
    course_name: &str,
    rows: &[NormalizedRow],
) -> WriteOutcome {
    let mut outcome = WriteOutcome::default();

    for row in rows {
        let comments = row.comments.iter().map(|c| c.to_new_comment()).collect();

        let saved = match storage
            .insert_response_row(batch_id, row.response.clone(), comments)
            .await
        {
            Ok(saved) => saved,
            Err(e) => {
                warn!("Failed to persist row {} of batch {}: {}", row.row_number, batch_id, e);
                outcome.failed_rows += 1;
                outcome.warnings.push(PipelineWarning::row_rejected(
                    row.row_number,
                    None,
                    format!("写入失败: {}", e.message()),
                ));
                continue;
            }
        };

        let (response, saved_comments) = saved;
        debug!(
            "Row {} persisted as response {} with {} comment(s)",
            row.row_number,
            response.id,
            saved_comments.len()
        );

        outcome.persisted_rows += 1;
        outcome.persisted_comments += saved_comments.len();

        // 评论按草稿顺序写入，ID 与草稿一一对应
        for (draft, comment) in row.comments.iter().zip(saved_comments) {
            if !draft.analyzable {
                continue;
            }
            outcome.jobs.push(ClassificationJob {
                comment_id: comment.id,
                question_type: comment.question_type,
                column_header: comment.column_header,
                request: ClassificationRequest {
                    text: comment.text,
                    course_name: course_name.to_string(),
                    question: question_text(&draft.column_header).to_string(),
                },
            });
        }
    }

    outcome
}
