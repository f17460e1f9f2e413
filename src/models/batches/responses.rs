use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::entities::{Batch, PipelineState};
use crate::models::common::labels::define_label_enum;

define_label_enum! {
    #[ts(export, export_to = "../frontend/src/types/generated/batch.ts")]
    WarningKind {
        RowRejected => "row_rejected",
        ClassificationFailed => "classification_failed",
    }
}

/// 处理过程中记录的非致命问题
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/batch.ts")]
pub struct PipelineWarning {
    pub kind: WarningKind,
    // CSV 行号（含表头，从 1 开始）
    pub row: Option<usize>,
    pub comment_id: Option<i64>,
    pub column: Option<String>,
    pub message: String,
}

impl PipelineWarning {
    pub fn row_rejected(row: usize, column: Option<String>, message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::RowRejected,
            row: Some(row),
            comment_id: None,
            column,
            message: message.into(),
        }
    }

    pub fn classification_failed(
        comment_id: i64,
        column: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind: WarningKind::ClassificationFailed,
            row: None,
            comment_id: Some(comment_id),
            column: Some(column.into()),
            message: message.into(),
        }
    }
}

/// 上传处理结果
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/batch.ts")]
pub struct UploadResponse {
    pub batch_id: i64,
    pub lecture_id: i64,
    pub status: PipelineState,
    pub processed_rows: i32,
    pub rejected_rows: i32,
    pub processed_comments: i32,
    pub analyzed_comments: i32,
    pub warnings: Vec<PipelineWarning>,
    pub status_url: String,
}

/// 批次状态查询结果
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/batch.ts")]
pub struct BatchStatusResponse {
    pub batch: Batch,
    // 汇总行已存在即视为完成
    pub completed: bool,
}

/// 批次指标
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/batch.ts")]
pub struct BatchMetricsResponse {
    // 讲义还没有可用批次时为空
    pub batch_id: Option<i64>,
    pub lecture_id: i64,
    pub zoom_participants: Option<i32>,
    pub recording_views: Option<i32>,
}

impl From<&Batch> for BatchMetricsResponse {
    fn from(batch: &Batch) -> Self {
        Self {
            batch_id: Some(batch.id),
            lecture_id: batch.lecture_id,
            zoom_participants: batch.zoom_participants,
            recording_views: batch.recording_views,
        }
    }
}
