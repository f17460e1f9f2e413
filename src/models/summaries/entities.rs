//! 批次的派生汇总数据
//!
//! 全部由回答和评论重新计算得到，不做增量修改。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;

use crate::models::common::labels::define_label_enum;
use crate::models::surveys::ScoreKey;

/// 覆盖全部受访者的合成属性组
pub const ALL_GROUP: &str = "ALL";

define_label_enum! {
    /// 评论汇总的分析维度
    #[ts(export, export_to = "../frontend/src/types/generated/summary.ts")]
    AnalysisType {
        Sentiment => "sentiment",
        Category => "category",
        Importance => "importance",
    }
}

/// (批次, 属性组) 的评分汇总
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/summary.ts")]
pub struct SurveySummary {
    pub batch_id: i64,
    pub respondent_attribute: String,
    pub response_count: i32,
    pub nps: Option<f64>,
    pub promoter_count: i32,
    pub passive_count: i32,
    pub detractor_count: i32,
    // 每道评分题都有一项，空组时为 None
    pub averages: BTreeMap<ScoreKey, Option<f64>>,
    pub comment_count: i32,
    pub important_comment_count: i32,
}

/// (批次, 属性组, 题目, 分值) 的人数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/summary.ts")]
pub struct ScoreDistribution {
    pub batch_id: i64,
    pub respondent_attribute: String,
    pub question_key: ScoreKey,
    pub score_value: i32,
    pub count: i32,
}

/// (批次, 属性组, 维度, 标签) 的已分析评论数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/summary.ts")]
pub struct CommentSummary {
    pub batch_id: i64,
    pub respondent_attribute: String,
    pub analysis_type: AnalysisType,
    pub label: String,
    pub count: i32,
}

/// 一个批次的全部汇总行
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/summary.ts")]
pub struct BatchAggregates {
    pub summaries: Vec<SurveySummary>,
    pub distributions: Vec<ScoreDistribution>,
    pub comment_summaries: Vec<CommentSummary>,
}

impl BatchAggregates {
    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty()
            && self.distributions.is_empty()
            && self.comment_summaries.is_empty()
    }

    /// 只保留指定属性组的行
    pub fn for_group(self, group: &str) -> Self {
        Self {
            summaries: self
                .summaries
                .into_iter()
                .filter(|s| s.respondent_attribute == group)
                .collect(),
            distributions: self
                .distributions
                .into_iter()
                .filter(|d| d.respondent_attribute == group)
                .collect(),
            comment_summaries: self
                .comment_summaries
                .into_iter()
                .filter(|c| c.respondent_attribute == group)
                .collect(),
        }
    }
}
