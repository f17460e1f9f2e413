use serde::Deserialize;
use ts_rs::TS;

use super::entities::{Category, Importance, QuestionType, RespondentAttribute, Sentiment};

// 讲义评论列表查询参数
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/survey.ts")]
pub struct CommentListQuery {
    // 缺省时与分析接口选同一个批次
    pub batch_id: Option<i64>,
    // 缺省或 ALL 时不按属性筛选
    pub attribute: Option<String>,
    pub question_type: Option<QuestionType>,
    pub sentiment: Option<Sentiment>,
    pub category: Option<Category>,
    pub importance: Option<Importance>,
    pub analyzed_only: Option<bool>,
    pub include_abusive: Option<bool>,
    pub page: Option<u64>,
    pub size: Option<u64>,
}

/// 存储层使用的评论筛选条件
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentFilter {
    pub attribute: Option<RespondentAttribute>,
    pub question_type: Option<QuestionType>,
    pub sentiment: Option<Sentiment>,
    pub category: Option<Category>,
    pub importance: Option<Importance>,
    pub analyzed_only: bool,
    // 默认隐藏被判定为不当言论的评论
    pub include_abusive: bool,
}
