//! 讲义实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "lectures")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub course_name: String,
    pub academic_year: i32,
    pub term: String,
    pub session: String,
    pub lecture_on: chrono::NaiveDate,
    pub instructor_name: String,
    pub description: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::survey_batches::Entity")]
    SurveyBatches,
}

impl Related<super::survey_batches::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SurveyBatches.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// 从数据库模型转换为业务模型
impl Model {
    pub fn into_lecture(self) -> crate::models::lectures::entities::Lecture {
        use crate::models::lectures::entities::Lecture;
        use chrono::{DateTime, Utc};

        Lecture {
            id: self.id,
            course_name: self.course_name,
            academic_year: self.academic_year,
            term: self.term,
            session: self.session,
            lecture_on: self.lecture_on,
            instructor_name: self.instructor_name,
            description: self.description,
            created_at: DateTime::<Utc>::from_timestamp(self.created_at, 0).unwrap_or_default(),
            updated_at: DateTime::<Utc>::from_timestamp(self.updated_at, 0).unwrap_or_default(),
        }
    }
}
