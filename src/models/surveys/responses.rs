use serde::Serialize;
use ts_rs::TS;

use super::entities::{Comment, RespondentAttribute};
use crate::models::common::PaginationInfo;

// 评论及其回答者属性
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/survey.ts")]
pub struct CommentListItem {
    #[serde(flatten)]
    #[ts(flatten)]
    pub comment: Comment,
    pub respondent_attribute: RespondentAttribute,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/survey.ts")]
pub struct CommentPage {
    pub items: Vec<CommentListItem>,
    pub pagination: PaginationInfo,
}

// 讲义评论列表
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/survey.ts")]
pub struct CommentListResponse {
    pub lecture_id: i64,
    pub batch_id: i64,
    pub items: Vec<CommentListItem>,
    pub pagination: PaginationInfo,
}
