//! 评分汇总实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "survey_summaries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub batch_id: i64,
    pub respondent_attribute: String,
    pub response_count: i32,
    pub nps: Option<f64>,
    pub promoter_count: i32,
    pub passive_count: i32,
    pub detractor_count: i32,
    pub avg_satisfaction_overall: Option<f64>,
    pub avg_content_volume: Option<f64>,
    pub avg_content_understanding: Option<f64>,
    pub avg_content_announcement: Option<f64>,
    pub avg_instructor_overall: Option<f64>,
    pub avg_instructor_time: Option<f64>,
    pub avg_instructor_qa: Option<f64>,
    pub avg_instructor_speaking: Option<f64>,
    pub avg_self_preparation: Option<f64>,
    pub avg_self_motivation: Option<f64>,
    pub avg_self_future: Option<f64>,
    pub avg_recommend_friend: Option<f64>,
    pub comment_count: i32,
    pub important_comment_count: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::survey_batches::Entity",
        from = "Column::BatchId",
        to = "super::survey_batches::Column::Id"
    )]
    Batch,
}

impl Related<super::survey_batches::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Batch.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub fn from_summary(summary: &crate::models::summaries::SurveySummary) -> Self {
        use crate::models::surveys::ScoreKey;
        use sea_orm::Set;

        let avg = |key: ScoreKey| Set(summary.averages.get(&key).copied().flatten());
        Self {
            batch_id: Set(summary.batch_id),
            respondent_attribute: Set(summary.respondent_attribute.clone()),
            response_count: Set(summary.response_count),
            nps: Set(summary.nps),
            promoter_count: Set(summary.promoter_count),
            passive_count: Set(summary.passive_count),
            detractor_count: Set(summary.detractor_count),
            avg_satisfaction_overall: avg(ScoreKey::SatisfactionOverall),
            avg_content_volume: avg(ScoreKey::ContentVolume),
            avg_content_understanding: avg(ScoreKey::ContentUnderstanding),
            avg_content_announcement: avg(ScoreKey::ContentAnnouncement),
            avg_instructor_overall: avg(ScoreKey::InstructorOverall),
            avg_instructor_time: avg(ScoreKey::InstructorTime),
            avg_instructor_qa: avg(ScoreKey::InstructorQa),
            avg_instructor_speaking: avg(ScoreKey::InstructorSpeaking),
            avg_self_preparation: avg(ScoreKey::SelfPreparation),
            avg_self_motivation: avg(ScoreKey::SelfMotivation),
            avg_self_future: avg(ScoreKey::SelfFuture),
            avg_recommend_friend: avg(ScoreKey::RecommendFriend),
            comment_count: Set(summary.comment_count),
            important_comment_count: Set(summary.important_comment_count),
            ..Default::default()
        }
    }
}

// 从数据库模型转换为业务模型
impl Model {
    pub fn into_summary(self) -> crate::models::summaries::SurveySummary {
        use crate::models::summaries::SurveySummary;
        use crate::models::surveys::ScoreKey;
        use std::collections::BTreeMap;

        let averages = BTreeMap::from([
            (ScoreKey::SatisfactionOverall, self.avg_satisfaction_overall),
            (ScoreKey::ContentVolume, self.avg_content_volume),
            (ScoreKey::ContentUnderstanding, self.avg_content_understanding),
            (ScoreKey::ContentAnnouncement, self.avg_content_announcement),
            (ScoreKey::InstructorOverall, self.avg_instructor_overall),
            (ScoreKey::InstructorTime, self.avg_instructor_time),
            (ScoreKey::InstructorQa, self.avg_instructor_qa),
            (ScoreKey::InstructorSpeaking, self.avg_instructor_speaking),
            (ScoreKey::SelfPreparation, self.avg_self_preparation),
            (ScoreKey::SelfMotivation, self.avg_self_motivation),
            (ScoreKey::SelfFuture, self.avg_self_future),
            (ScoreKey::RecommendFriend, self.avg_recommend_friend),
        ]);

        SurveySummary {
            batch_id: self.batch_id,
            respondent_attribute: self.respondent_attribute,
            response_count: self.response_count,
            nps: self.nps,
            promoter_count: self.promoter_count,
            passive_count: self.passive_count,
            detractor_count: self.detractor_count,
            averages,
            comment_count: self.comment_count,
            important_comment_count: self.important_comment_count,
        }
    }
}
