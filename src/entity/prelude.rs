//! 预导入模块，方便使用

pub use super::comment_summaries::{
    ActiveModel as CommentSummaryActiveModel, Entity as CommentSummaries,
    Model as CommentSummaryModel,
};
pub use super::lectures::{
    ActiveModel as LectureActiveModel, Entity as Lectures, Model as LectureModel,
};
pub use super::response_comments::{
    ActiveModel as ResponseCommentActiveModel, Entity as ResponseComments,
    Model as ResponseCommentModel,
};
pub use super::score_distributions::{
    ActiveModel as ScoreDistributionActiveModel, Entity as ScoreDistributions,
    Model as ScoreDistributionModel,
};
pub use super::survey_batches::{
    ActiveModel as SurveyBatchActiveModel, Entity as SurveyBatches, Model as SurveyBatchModel,
};
pub use super::survey_responses::{
    ActiveModel as SurveyResponseActiveModel, Entity as SurveyResponses,
    Model as SurveyResponseModel,
};
pub use super::survey_summaries::{
    ActiveModel as SurveySummaryActiveModel, Entity as SurveySummaries,
    Model as SurveySummaryModel,
};
