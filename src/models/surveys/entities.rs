use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use ts_rs::TS;

use crate::models::common::labels::define_label_enum;

define_label_enum! {
    /// 评分题目
    #[ts(export, export_to = "../frontend/src/types/generated/survey.ts")]
    ScoreKey {
        SatisfactionOverall => "satisfaction_overall",
        ContentVolume => "content_volume",
        ContentUnderstanding => "content_understanding",
        ContentAnnouncement => "content_announcement",
        InstructorOverall => "instructor_overall",
        InstructorTime => "instructor_time",
        InstructorQa => "instructor_qa",
        InstructorSpeaking => "instructor_speaking",
        SelfPreparation => "self_preparation",
        SelfMotivation => "self_motivation",
        SelfFuture => "self_future",
        RecommendFriend => "recommend_friend",
    }
}

impl ScoreKey {
    /// 合法取值范围（推荐度为 0-10，其余为 1-5）
    pub fn range(&self) -> RangeInclusive<i32> {
        match self {
            ScoreKey::RecommendFriend => 0..=10,
            _ => 1..=5,
        }
    }
}

/// 一名受访者的全部评分
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/survey.ts")]
pub struct Scores {
    pub satisfaction_overall: i32,
    pub content_volume: i32,
    pub content_understanding: i32,
    pub content_announcement: i32,
    pub instructor_overall: i32,
    pub instructor_time: i32,
    pub instructor_qa: i32,
    pub instructor_speaking: i32,
    pub self_preparation: i32,
    pub self_motivation: i32,
    pub self_future: i32,
    pub recommend_friend: i32,
}

impl Scores {
    /// 逐题构造，任一题目失败则整体失败
    pub fn try_from_fn<E>(mut f: impl FnMut(ScoreKey) -> Result<i32, E>) -> Result<Self, E> {
        Ok(Self {
            satisfaction_overall: f(ScoreKey::SatisfactionOverall)?,
            content_volume: f(ScoreKey::ContentVolume)?,
            content_understanding: f(ScoreKey::ContentUnderstanding)?,
            content_announcement: f(ScoreKey::ContentAnnouncement)?,
            instructor_overall: f(ScoreKey::InstructorOverall)?,
            instructor_time: f(ScoreKey::InstructorTime)?,
            instructor_qa: f(ScoreKey::InstructorQa)?,
            instructor_speaking: f(ScoreKey::InstructorSpeaking)?,
            self_preparation: f(ScoreKey::SelfPreparation)?,
            self_motivation: f(ScoreKey::SelfMotivation)?,
            self_future: f(ScoreKey::SelfFuture)?,
            recommend_friend: f(ScoreKey::RecommendFriend)?,
        })
    }

    pub fn get(&self, key: ScoreKey) -> i32 {
        match key {
            ScoreKey::SatisfactionOverall => self.satisfaction_overall,
            ScoreKey::ContentVolume => self.content_volume,
            ScoreKey::ContentUnderstanding => self.content_understanding,
            ScoreKey::ContentAnnouncement => self.content_announcement,
            ScoreKey::InstructorOverall => self.instructor_overall,
            ScoreKey::InstructorTime => self.instructor_time,
            ScoreKey::InstructorQa => self.instructor_qa,
            ScoreKey::InstructorSpeaking => self.instructor_speaking,
            ScoreKey::SelfPreparation => self.self_preparation,
            ScoreKey::SelfMotivation => self.self_motivation,
            ScoreKey::SelfFuture => self.self_future,
            ScoreKey::RecommendFriend => self.recommend_friend,
        }
    }
}

define_label_enum! {
    /// 受访者属性
    #[ts(export, export_to = "../frontend/src/types/generated/survey.ts")]
    RespondentAttribute {
        Student => "student",
        Corporate => "corporate",
        Invited => "invited",
        Faculty => "faculty",
        Other => "other",
    }
}

impl RespondentAttribute {
    pub fn label(&self) -> &'static str {
        match self {
            RespondentAttribute::Student => "学生",
            RespondentAttribute::Corporate => "会員企業",
            RespondentAttribute::Invited => "招待枠",
            RespondentAttribute::Faculty => "教員",
            RespondentAttribute::Other => "その他/不明",
        }
    }

    /// 将 CSV 中的属性值归一化，空值或无法识别的值归为 other
    pub fn normalize(raw: &str) -> Self {
        let value = raw.trim();
        if value.is_empty() {
            return RespondentAttribute::Other;
        }
        if let Ok(attribute) = value.to_lowercase().parse::<RespondentAttribute>() {
            return attribute;
        }
        RespondentAttribute::ALL
            .iter()
            .copied()
            .filter(|attr| *attr != RespondentAttribute::Other)
            .find(|attr| value.contains(attr.label()))
            .unwrap_or(RespondentAttribute::Other)
    }
}

define_label_enum! {
    /// 自由记述题目类型
    #[ts(export, export_to = "../frontend/src/types/generated/survey.ts")]
    QuestionType {
        Learned => "learned",
        GoodPoints => "good_points",
        Improvements => "improvements",
        InstructorFeedback => "instructor_feedback",
        FutureRequests => "future_requests",
        FreeComment => "free_comment",
    }
}

impl QuestionType {
    /// "学到的内容" 只保存不分析
    pub fn is_excluded_from_analysis(&self) -> bool {
        matches!(self, QuestionType::Learned)
    }
}

define_label_enum! {
    #[ts(export, export_to = "../frontend/src/types/generated/survey.ts")]
    Sentiment {
        Positive => "positive",
        Neutral => "neutral",
        Negative => "negative",
    }
}

define_label_enum! {
    #[ts(export, export_to = "../frontend/src/types/generated/survey.ts")]
    Category {
        Content => "content",
        Material => "material",
        Instructor => "instructor",
        Operation => "operation",
        Other => "other",
    }
}

define_label_enum! {
    #[ts(export, export_to = "../frontend/src/types/generated/survey.ts")]
    Importance {
        High => "high",
        Medium => "medium",
        Low => "low",
    }
}

impl Importance {
    /// 计入"重要评论"统计的等级
    pub fn is_important(&self) -> bool {
        matches!(self, Importance::High | Importance::Medium)
    }
}

/// 单条评论的分类结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/survey.ts")]
pub struct CommentClassification {
    pub sentiment: Option<Sentiment>,
    pub category: Option<Category>,
    pub importance: Option<Importance>,
    pub is_abusive: bool,
}

/// 已保存的一行回答
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/survey.ts")]
pub struct SurveyResponse {
    pub id: i64,
    pub batch_id: i64,
    pub account_id: Option<String>,
    pub respondent_attribute: RespondentAttribute,
    pub scores: Scores,
    pub created_at: DateTime<Utc>,
}

/// 已保存的一条自由记述
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/survey.ts")]
pub struct Comment {
    pub id: i64,
    pub response_id: i64,
    pub question_type: QuestionType,
    pub column_header: String,
    pub text: String,
    pub sentiment: Option<Sentiment>,
    pub category: Option<Category>,
    pub importance: Option<Importance>,
    pub is_abusive: bool,
    pub is_analyzed: bool,
    pub analyzed_at: Option<DateTime<Utc>>,
}

impl Comment {
    pub fn classification(&self) -> CommentClassification {
        CommentClassification {
            sentiment: self.sentiment,
            category: self.category,
            importance: self.importance,
            is_abusive: self.is_abusive,
        }
    }
}

/// 待写入的回答
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewResponse {
    pub account_id: Option<String>,
    pub respondent_attribute: RespondentAttribute,
    pub scores: Scores,
}

/// 待写入的评论
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub question_type: QuestionType,
    pub column_header: String,
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_ranges() {
        assert_eq!(ScoreKey::RecommendFriend.range(), 0..=10);
        assert_eq!(ScoreKey::SelfFuture.range(), 1..=5);
        assert_eq!(ScoreKey::ALL.len(), 12);
    }

    #[test]
    fn test_attribute_normalize() {
        assert_eq!(
            RespondentAttribute::normalize(" Student "),
            RespondentAttribute::Student
        );
        assert_eq!(
            RespondentAttribute::normalize("会員企業"),
            RespondentAttribute::Corporate
        );
        assert_eq!(
            RespondentAttribute::normalize("招待枠（講師紹介）"),
            RespondentAttribute::Invited
        );
        assert_eq!(RespondentAttribute::normalize(""), RespondentAttribute::Other);
        assert_eq!(
            RespondentAttribute::normalize("一般"),
            RespondentAttribute::Other
        );
    }

    #[test]
    fn test_label_round_trip_through_str() {
        for qt in QuestionType::ALL {
            assert_eq!(qt.as_str().parse::<QuestionType>(), Ok(*qt));
        }
        assert!("unknown".parse::<Sentiment>().is_err());
    }

    #[test]
    fn test_only_learned_is_excluded() {
        let excluded: Vec<_> = QuestionType::ALL
            .iter()
            .filter(|qt| qt.is_excluded_from_analysis())
            .collect();
        assert_eq!(excluded, vec![&QuestionType::Learned]);
    }

    #[test]
    fn test_scores_try_from_fn_stops_on_error() {
        let result: Result<Scores, ScoreKey> = Scores::try_from_fn(|key| {
            if key == ScoreKey::InstructorQa {
                Err(key)
            } else {
                Ok(3)
            }
        });
        assert_eq!(result, Err(ScoreKey::InstructorQa));

        let scores: Result<Scores, ()> = Scores::try_from_fn(|key| Ok(*key.range().end()));
        let scores = scores.unwrap();
        assert_eq!(scores.get(ScoreKey::RecommendFriend), 10);
        assert_eq!(scores.get(ScoreKey::SatisfactionOverall), 5);
    }
}
