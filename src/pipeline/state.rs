//! 流水线状态跟踪
//!
//! 批次行创建之前的状态只记录日志；绑定批次后每次迁移都会写入状态列。

use tracing::{info, warn};

use crate::errors::{Result, SurveyError};
use crate::models::batches::entities::PipelineState;
use crate::storage::Storage;

#[derive(Debug, Clone)]
pub struct StateTracker {
    state: PipelineState,
    batch_id: Option<i64>,
}

impl Default for StateTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl StateTracker {
    pub fn new() -> Self {
        Self {
            state: PipelineState::Received,
            batch_id: None,
        }
    }

    /// 从已保存批次的当前状态继续
    pub fn resume(batch_id: i64, state: PipelineState) -> Self {
        Self {
            state,
            batch_id: Some(batch_id),
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn attach(&mut self, batch_id: i64) {
        self.batch_id = Some(batch_id);
    }

    /// 仅在内存中迁移（批次尚未创建）
    pub fn advance_local(&mut self, next: PipelineState) -> Result<()> {
        self.check(next)?;
        match next {
            PipelineState::Failed => warn!("Pipeline {} -> {}", self.state, next),
            _ => info!("Pipeline {} -> {}", self.state, next),
        }
        self.state = next;
        Ok(())
    }

    /// 迁移并写入批次状态
    pub async fn advance(&mut self, storage: &dyn Storage, next: PipelineState) -> Result<()> {
        self.check(next)?;
        if let Some(batch_id) = self.batch_id {
            storage.update_batch_status(batch_id, next).await?;
            info!("Batch {}: {} -> {}", batch_id, self.state, next);
        } else {
            info!("Pipeline {} -> {}", self.state, next);
        }
        self.state = next;
        Ok(())
    }

    fn check(&self, next: PipelineState) -> Result<()> {
        if self.state.can_transition_to(next) {
            Ok(())
        } else {
            Err(SurveyError::conflict(format!(
                "illegal pipeline transition {} -> {}",
                self.state, next
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_failure_from_validating() {
        let mut tracker = StateTracker::new();
        tracker.advance_local(PipelineState::Validating).unwrap();
        tracker.advance_local(PipelineState::Failed).unwrap();
        assert_eq!(tracker.state(), PipelineState::Failed);
    }

    #[test]
    fn test_illegal_transition_rejected() {
        let mut tracker = StateTracker::new();
        let err = tracker.advance_local(PipelineState::Done).unwrap_err();
        assert!(matches!(err, SurveyError::Conflict(_)));
        assert_eq!(tracker.state(), PipelineState::Received);
    }
}
