use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::common::labels::define_label_enum;

define_label_enum! {
    /// 批次类型（速报 / 确定）
    #[ts(export, export_to = "../frontend/src/types/generated/batch.ts")]
    BatchType {
        Preliminary => "preliminary",
        Confirmed => "confirmed",
    }
}

impl Default for BatchType {
    fn default() -> Self {
        BatchType::Preliminary
    }
}

define_label_enum! {
    /// 上传处理流水线状态
    #[ts(export, export_to = "../frontend/src/types/generated/batch.ts")]
    PipelineState {
        Received => "received",
        Validating => "validating",
        Persisting => "persisting",
        Classifying => "classifying",
        Aggregating => "aggregating",
        Done => "done",
        Failed => "failed",
    }
}

impl PipelineState {
    /// 状态机允许的迁移
    ///
    /// FAILED 只能从 VALIDATING 进入；DONE 之后允许重新汇总（确定版切换时）。
    pub fn can_transition_to(&self, next: PipelineState) -> bool {
        use PipelineState::*;
        matches!(
            (self, next),
            (Received, Validating)
                | (Validating, Persisting)
                | (Validating, Failed)
                | (Persisting, Classifying)
                | (Classifying, Aggregating)
                | (Aggregating, Done)
                | (Done, Aggregating)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed)
    }
}

/// 上传批次
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/batch.ts")]
pub struct Batch {
    pub id: i64,
    pub lecture_id: i64,
    pub batch_type: BatchType,
    pub status: PipelineState,
    pub zoom_participants: Option<i32>,
    pub recording_views: Option<i32>,
    pub source_uri: Option<String>,
    pub uploaded_by: Option<String>,
    pub processed_rows: i32,
    pub rejected_rows: i32,
    pub processed_comments: i32,
    pub analyzed_comments: i32,
    pub uploaded_at: DateTime<Utc>,
    pub aggregated_at: Option<DateTime<Utc>>,
}

/// 创建批次所需的数据
#[derive(Debug, Clone, Default)]
pub struct NewBatch {
    pub lecture_id: i64,
    pub batch_type: BatchType,
    pub zoom_participants: Option<i32>,
    pub recording_views: Option<i32>,
    pub source_uri: Option<String>,
    pub uploaded_by: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_only_reachable_from_validating() {
        for state in PipelineState::ALL {
            let allowed = state.can_transition_to(PipelineState::Failed);
            assert_eq!(allowed, *state == PipelineState::Validating, "{state}");
        }
    }

    #[test]
    fn test_happy_path_transitions() {
        let path = [
            PipelineState::Received,
            PipelineState::Validating,
            PipelineState::Persisting,
            PipelineState::Classifying,
            PipelineState::Aggregating,
            PipelineState::Done,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
        assert!(!PipelineState::Persisting.can_transition_to(PipelineState::Done));
        assert!(PipelineState::Done.is_terminal());
    }

    #[test]
    fn test_batch_type_default() {
        assert_eq!(BatchType::default(), BatchType::Preliminary);
        assert_eq!("confirmed".parse::<BatchType>(), Ok(BatchType::Confirmed));
    }
}
