//! 评论标签汇总实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "comment_summaries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub batch_id: i64,
    pub respondent_attribute: String,
    pub analysis_type: String,
    pub label: String,
    pub count: i32,
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

// 从数据库模型转换为业务模型
impl Model {
    pub fn into_comment_summary(self) -> Option<crate::models::summaries::CommentSummary> {
        use crate::models::summaries::CommentSummary;

        Some(CommentSummary {
            batch_id: self.batch_id,
            respondent_attribute: self.respondent_attribute,
            analysis_type: self.analysis_type.parse().ok()?,
            label: self.label,
            count: self.count,
        })
    }
}
