//! 分数分布实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "score_distributions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub batch_id: i64,
    pub respondent_attribute: String,
    pub question_key: String,
    pub score_value: i32,
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
    /// 题目键无法识别的行返回 None
    pub fn into_distribution(self) -> Option<crate::models::summaries::ScoreDistribution> {
        use crate::models::summaries::ScoreDistribution;

        Some(ScoreDistribution {
            batch_id: self.batch_id,
            respondent_attribute: self.respondent_attribute,
            question_key: self.question_key.parse().ok()?,
            score_value: self.score_value,
            count: self.count,
        })
    }
}
