//! 自由记述实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "response_comments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub response_id: i64,
    pub question_type: String,
    pub column_header: String,
    #[sea_orm(column_type = "Text")]
    pub comment_text: String,
    pub llm_sentiment: Option<String>,
    pub llm_category: Option<String>,
    pub llm_importance: Option<String>,
    pub llm_is_abusive: bool,
    pub is_analyzed: bool,
    pub analyzed_at: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::survey_responses::Entity",
        from = "Column::ResponseId",
        to = "super::survey_responses::Column::Id"
    )]
    Response,
}

impl Related<super::survey_responses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Response.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// 从数据库模型转换为业务模型
impl Model {
    pub fn into_comment(self) -> crate::models::surveys::Comment {
        use crate::models::surveys::{Comment, QuestionType};
        use chrono::{DateTime, Utc};

        Comment {
            id: self.id,
            response_id: self.response_id,
            question_type: self
                .question_type
                .parse()
                .unwrap_or(QuestionType::FreeComment),
            column_header: self.column_header,
            text: self.comment_text,
            sentiment: self.llm_sentiment.and_then(|s| s.parse().ok()),
            category: self.llm_category.and_then(|s| s.parse().ok()),
            importance: self.llm_importance.and_then(|s| s.parse().ok()),
            is_abusive: self.llm_is_abusive,
            is_analyzed: self.is_analyzed,
            analyzed_at: self
                .analyzed_at
                .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0)),
        }
    }
}
