//! 回答实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "survey_responses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub batch_id: i64,
    pub account_id: Option<String>,
    pub respondent_attribute: String,
    pub score_satisfaction_overall: i32,
    pub score_content_volume: i32,
    pub score_content_understanding: i32,
    pub score_content_announcement: i32,
    pub score_instructor_overall: i32,
    pub score_instructor_time: i32,
    pub score_instructor_qa: i32,
    pub score_instructor_speaking: i32,
    pub score_self_preparation: i32,
    pub score_self_motivation: i32,
    pub score_self_future: i32,
    pub score_recommend_friend: i32,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::survey_batches::Entity",
        from = "Column::BatchId",
        to = "super::survey_batches::Column::Id"
    )]
    Batch,
    #[sea_orm(has_many = "super::response_comments::Entity")]
    ResponseComments,
}

impl Related<super::survey_batches::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Batch.def()
    }
}

impl Related<super::response_comments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ResponseComments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    /// 由待写入的回答构建
    pub fn from_new_response(
        batch_id: i64,
        response: &crate::models::surveys::NewResponse,
        created_at: i64,
    ) -> Self {
        use sea_orm::Set;

        let scores = &response.scores;
        Self {
            batch_id: Set(batch_id),
            account_id: Set(response.account_id.clone()),
            respondent_attribute: Set(response.respondent_attribute.to_string()),
            score_satisfaction_overall: Set(scores.satisfaction_overall),
            score_content_volume: Set(scores.content_volume),
            score_content_understanding: Set(scores.content_understanding),
            score_content_announcement: Set(scores.content_announcement),
            score_instructor_overall: Set(scores.instructor_overall),
            score_instructor_time: Set(scores.instructor_time),
            score_instructor_qa: Set(scores.instructor_qa),
            score_instructor_speaking: Set(scores.instructor_speaking),
            score_self_preparation: Set(scores.self_preparation),
            score_self_motivation: Set(scores.self_motivation),
            score_self_future: Set(scores.self_future),
            score_recommend_friend: Set(scores.recommend_friend),
            created_at: Set(created_at),
            ..Default::default()
        }
    }
}

// 从数据库模型转换为业务模型
impl Model {
    pub fn into_response(self) -> crate::models::surveys::SurveyResponse {
        use crate::models::surveys::{RespondentAttribute, Scores, SurveyResponse};
        use chrono::{DateTime, Utc};

        SurveyResponse {
            id: self.id,
            batch_id: self.batch_id,
            account_id: self.account_id,
            respondent_attribute: RespondentAttribute::normalize(&self.respondent_attribute),
            scores: Scores {
                satisfaction_overall: self.score_satisfaction_overall,
                content_volume: self.score_content_volume,
                content_understanding: self.score_content_understanding,
                content_announcement: self.score_content_announcement,
                instructor_overall: self.score_instructor_overall,
                instructor_time: self.score_instructor_time,
                instructor_qa: self.score_instructor_qa,
                instructor_speaking: self.score_instructor_speaking,
                self_preparation: self.score_self_preparation,
                self_motivation: self.score_self_motivation,
                self_future: self.score_self_future,
                recommend_friend: self.score_recommend_friend,
            },
            created_at: DateTime::<Utc>::from_timestamp(self.created_at, 0).unwrap_or_default(),
        }
    }
}
