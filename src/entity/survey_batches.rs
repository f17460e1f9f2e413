//! 上传批次实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "survey_batches")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub lecture_id: i64,
    pub batch_type: String,
    pub status: String,
    pub zoom_participants: Option<i32>,
    pub recording_views: Option<i32>,
    pub source_uri: Option<String>,
    pub uploaded_by: Option<String>,
    pub processed_rows: i32,
    pub rejected_rows: i32,
    pub processed_comments: i32,
    pub analyzed_comments: i32,
    pub uploaded_at: i64,
    pub aggregated_at: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::lectures::Entity",
        from = "Column::LectureId",
        to = "super::lectures::Column::Id"
    )]
    Lecture,
    #[sea_orm(has_many = "super::survey_responses::Entity")]
    SurveyResponses,
    #[sea_orm(has_many = "super::survey_summaries::Entity")]
    SurveySummaries,
    #[sea_orm(has_many = "super::score_distributions::Entity")]
    ScoreDistributions,
    #[sea_orm(has_many = "super::comment_summaries::Entity")]
    CommentSummaries,
}

impl Related<super::lectures::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lecture.def()
    }
}

impl Related<super::survey_responses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SurveyResponses.def()
    }
}

impl Related<super::survey_summaries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SurveySummaries.def()
    }
}

impl Related<super::score_distributions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ScoreDistributions.def()
    }
}

impl Related<super::comment_summaries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CommentSummaries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// 从数据库模型转换为业务模型
impl Model {
    pub fn into_batch(self) -> crate::models::batches::entities::Batch {
        use crate::models::batches::entities::{Batch, BatchType, PipelineState};
        use chrono::{DateTime, Utc};

        Batch {
            id: self.id,
            lecture_id: self.lecture_id,
            batch_type: self.batch_type.parse().unwrap_or(BatchType::Preliminary),
            status: self.status.parse().unwrap_or(PipelineState::Received),
            zoom_participants: self.zoom_participants,
            recording_views: self.recording_views,
            source_uri: self.source_uri,
            uploaded_by: self.uploaded_by,
            processed_rows: self.processed_rows,
            rejected_rows: self.rejected_rows,
            processed_comments: self.processed_comments,
            analyzed_comments: self.analyzed_comments,
            uploaded_at: DateTime::<Utc>::from_timestamp(self.uploaded_at, 0).unwrap_or_default(),
            aggregated_at: self
                .aggregated_at
                .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0)),
        }
    }
}
