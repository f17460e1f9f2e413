use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// 回答表中的评分列（与汇总表中的平均分列一一对应）
const SCORE_COLUMNS: [(SurveyResponses, SurveySummaries); 12] = [
    (
        SurveyResponses::ScoreSatisfactionOverall,
        SurveySummaries::AvgSatisfactionOverall,
    ),
    (
        SurveyResponses::ScoreContentVolume,
        SurveySummaries::AvgContentVolume,
    ),
    (
        SurveyResponses::ScoreContentUnderstanding,
        SurveySummaries::AvgContentUnderstanding,
    ),
    (
        SurveyResponses::ScoreContentAnnouncement,
        SurveySummaries::AvgContentAnnouncement,
    ),
    (
        SurveyResponses::ScoreInstructorOverall,
        SurveySummaries::AvgInstructorOverall,
    ),
    (
        SurveyResponses::ScoreInstructorTime,
        SurveySummaries::AvgInstructorTime,
    ),
    (
        SurveyResponses::ScoreInstructorQa,
        SurveySummaries::AvgInstructorQa,
    ),
    (
        SurveyResponses::ScoreInstructorSpeaking,
        SurveySummaries::AvgInstructorSpeaking,
    ),
    (
        SurveyResponses::ScoreSelfPreparation,
        SurveySummaries::AvgSelfPreparation,
    ),
    (
        SurveyResponses::ScoreSelfMotivation,
        SurveySummaries::AvgSelfMotivation,
    ),
    (
        SurveyResponses::ScoreSelfFuture,
        SurveySummaries::AvgSelfFuture,
    ),
    (
        SurveyResponses::ScoreRecommendFriend,
        SurveySummaries::AvgRecommendFriend,
    ),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 创建讲义表
        manager
            .create_table(
                Table::create()
                    .table(Lectures::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Lectures::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Lectures::CourseName).string().not_null())
                    .col(ColumnDef::new(Lectures::AcademicYear).integer().not_null())
                    .col(ColumnDef::new(Lectures::Term).string().not_null())
                    .col(ColumnDef::new(Lectures::Session).string().not_null())
                    .col(ColumnDef::new(Lectures::LectureOn).date().not_null())
                    .col(ColumnDef::new(Lectures::InstructorName).string().not_null())
                    .col(ColumnDef::new(Lectures::Description).text().null())
                    .col(ColumnDef::new(Lectures::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Lectures::UpdatedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        // 讲义自然键唯一约束
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .unique()
                    .name("uq_lectures_identity")
                    .table(Lectures::Table)
                    .col(Lectures::CourseName)
                    .col(Lectures::AcademicYear)
                    .col(Lectures::Term)
                    .col(Lectures::Session)
                    .col(Lectures::LectureOn)
                    .to_owned(),
            )
            .await?;

        // 创建上传批次表
        manager
            .create_table(
                Table::create()
                    .table(SurveyBatches::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SurveyBatches::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SurveyBatches::LectureId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(SurveyBatches::BatchType).string().not_null())
                    .col(ColumnDef::new(SurveyBatches::Status).string().not_null())
                    .col(
                        ColumnDef::new(SurveyBatches::ZoomParticipants)
                            .integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(SurveyBatches::RecordingViews)
                            .integer()
                            .null(),
                    )
                    .col(ColumnDef::new(SurveyBatches::SourceUri).string().null())
                    .col(ColumnDef::new(SurveyBatches::UploadedBy).string().null())
                    .col(
                        ColumnDef::new(SurveyBatches::ProcessedRows)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SurveyBatches::RejectedRows)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SurveyBatches::ProcessedComments)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SurveyBatches::AnalyzedComments)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SurveyBatches::UploadedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SurveyBatches::AggregatedAt)
                            .big_integer()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(SurveyBatches::Table, SurveyBatches::LectureId)
                            .to(Lectures::Table, Lectures::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建回答表
        let mut responses = Table::create();
        responses
            .table(SurveyResponses::Table)
            .if_not_exists()
            .col(
                ColumnDef::new(SurveyResponses::Id)
                    .big_integer()
                    .not_null()
                    .auto_increment()
                    .primary_key(),
            )
            .col(
                ColumnDef::new(SurveyResponses::BatchId)
                    .big_integer()
                    .not_null(),
            )
            .col(ColumnDef::new(SurveyResponses::AccountId).string().null())
            .col(
                ColumnDef::new(SurveyResponses::RespondentAttribute)
                    .string()
                    .not_null(),
            );
        for (score_column, _) in SCORE_COLUMNS {
            responses.col(ColumnDef::new(score_column).integer().not_null());
        }
        responses
            .col(
                ColumnDef::new(SurveyResponses::CreatedAt)
                    .big_integer()
                    .not_null(),
            )
            .foreign_key(
                ForeignKey::create()
                    .from(SurveyResponses::Table, SurveyResponses::BatchId)
                    .to(SurveyBatches::Table, SurveyBatches::Id)
                    .on_delete(ForeignKeyAction::Cascade),
            );
        manager.create_table(responses.to_owned()).await?;

        // 创建自由记述表
        manager
            .create_table(
                Table::create()
                    .table(ResponseComments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ResponseComments::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ResponseComments::ResponseId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ResponseComments::QuestionType)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ResponseComments::ColumnHeader)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ResponseComments::CommentText)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ResponseComments::LlmSentiment)
                            .string()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ResponseComments::LlmCategory)
                            .string()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ResponseComments::LlmImportance)
                            .string()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ResponseComments::LlmIsAbusive)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(ResponseComments::IsAnalyzed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(ResponseComments::AnalyzedAt)
                            .big_integer()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(ResponseComments::Table, ResponseComments::ResponseId)
                            .to(SurveyResponses::Table, SurveyResponses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建评分汇总表
        let mut summaries = Table::create();
        summaries
            .table(SurveySummaries::Table)
            .if_not_exists()
            .col(
                ColumnDef::new(SurveySummaries::Id)
                    .big_integer()
                    .not_null()
                    .auto_increment()
                    .primary_key(),
            )
            .col(
                ColumnDef::new(SurveySummaries::BatchId)
                    .big_integer()
                    .not_null(),
            )
            .col(
                ColumnDef::new(SurveySummaries::RespondentAttribute)
                    .string()
                    .not_null(),
            )
            .col(
                ColumnDef::new(SurveySummaries::ResponseCount)
                    .integer()
                    .not_null(),
            )
            .col(ColumnDef::new(SurveySummaries::Nps).double().null())
            .col(
                ColumnDef::new(SurveySummaries::PromoterCount)
                    .integer()
                    .not_null(),
            )
            .col(
                ColumnDef::new(SurveySummaries::PassiveCount)
                    .integer()
                    .not_null(),
            )
            .col(
                ColumnDef::new(SurveySummaries::DetractorCount)
                    .integer()
                    .not_null(),
            );
        for (_, avg_column) in SCORE_COLUMNS {
            summaries.col(ColumnDef::new(avg_column).double().null());
        }
        summaries
            .col(
                ColumnDef::new(SurveySummaries::CommentCount)
                    .integer()
                    .not_null(),
            )
            .col(
                ColumnDef::new(SurveySummaries::ImportantCommentCount)
                    .integer()
                    .not_null(),
            )
            .foreign_key(
                ForeignKey::create()
                    .from(SurveySummaries::Table, SurveySummaries::BatchId)
                    .to(SurveyBatches::Table, SurveyBatches::Id)
                    .on_delete(ForeignKeyAction::Cascade),
            );
        manager.create_table(summaries.to_owned()).await?;

        // 创建分数分布表
        manager
            .create_table(
                Table::create()
                    .table(ScoreDistributions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ScoreDistributions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ScoreDistributions::BatchId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ScoreDistributions::RespondentAttribute)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ScoreDistributions::QuestionKey)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ScoreDistributions::ScoreValue)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ScoreDistributions::Count).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(ScoreDistributions::Table, ScoreDistributions::BatchId)
                            .to(SurveyBatches::Table, SurveyBatches::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建评论标签汇总表
        manager
            .create_table(
                Table::create()
                    .table(CommentSummaries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CommentSummaries::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CommentSummaries::BatchId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CommentSummaries::RespondentAttribute)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CommentSummaries::AnalysisType)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CommentSummaries::Label).string().not_null())
                    .col(ColumnDef::new(CommentSummaries::Count).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(CommentSummaries::Table, CommentSummaries::BatchId)
                            .to(SurveyBatches::Table, SurveyBatches::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 外键索引
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_survey_batches_lecture_id")
                    .table(SurveyBatches::Table)
                    .col(SurveyBatches::LectureId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_survey_responses_batch_id")
                    .table(SurveyResponses::Table)
                    .col(SurveyResponses::BatchId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_response_comments_response_id")
                    .table(ResponseComments::Table)
                    .col(ResponseComments::ResponseId)
                    .to_owned(),
            )
            .await?;

        // 汇总表的自然键
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .unique()
                    .name("uq_survey_summaries_batch_attribute")
                    .table(SurveySummaries::Table)
                    .col(SurveySummaries::BatchId)
                    .col(SurveySummaries::RespondentAttribute)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .unique()
                    .name("uq_score_distributions_bucket")
                    .table(ScoreDistributions::Table)
                    .col(ScoreDistributions::BatchId)
                    .col(ScoreDistributions::RespondentAttribute)
                    .col(ScoreDistributions::QuestionKey)
                    .col(ScoreDistributions::ScoreValue)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .unique()
                    .name("uq_comment_summaries_label")
                    .table(CommentSummaries::Table)
                    .col(CommentSummaries::BatchId)
                    .col(CommentSummaries::RespondentAttribute)
                    .col(CommentSummaries::AnalysisType)
                    .col(CommentSummaries::Label)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 按照创建的相反顺序删除
        manager
            .drop_table(Table::drop().table(CommentSummaries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ScoreDistributions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SurveySummaries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ResponseComments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SurveyResponses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SurveyBatches::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Lectures::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Lectures {
    #[sea_orm(iden = "lectures")]
    Table,
    Id,
    CourseName,
    AcademicYear,
    Term,
    Session,
    LectureOn,
    InstructorName,
    Description,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum SurveyBatches {
    #[sea_orm(iden = "survey_batches")]
    Table,
    Id,
    LectureId,
    BatchType,
    Status,
    ZoomParticipants,
    RecordingViews,
    SourceUri,
    UploadedBy,
    ProcessedRows,
    RejectedRows,
    ProcessedComments,
    AnalyzedComments,
    UploadedAt,
    AggregatedAt,
}

#[derive(DeriveIden, Clone, Copy)]
enum SurveyResponses {
    #[sea_orm(iden = "survey_responses")]
    Table,
    Id,
    BatchId,
    AccountId,
    RespondentAttribute,
    ScoreSatisfactionOverall,
    ScoreContentVolume,
    ScoreContentUnderstanding,
    ScoreContentAnnouncement,
    ScoreInstructorOverall,
    ScoreInstructorTime,
    ScoreInstructorQa,
    ScoreInstructorSpeaking,
    ScoreSelfPreparation,
    ScoreSelfMotivation,
    ScoreSelfFuture,
    ScoreRecommendFriend,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ResponseComments {
    #[sea_orm(iden = "response_comments")]
    Table,
    Id,
    ResponseId,
    QuestionType,
    ColumnHeader,
    CommentText,
    LlmSentiment,
    LlmCategory,
    LlmImportance,
    LlmIsAbusive,
    IsAnalyzed,
    AnalyzedAt,
}

#[derive(DeriveIden, Clone, Copy)]
enum SurveySummaries {
    #[sea_orm(iden = "survey_summaries")]
    Table,
    Id,
    BatchId,
    RespondentAttribute,
    ResponseCount,
    Nps,
    PromoterCount,
    PassiveCount,
    DetractorCount,
    AvgSatisfactionOverall,
    AvgContentVolume,
    AvgContentUnderstanding,
    AvgContentAnnouncement,
    AvgInstructorOverall,
    AvgInstructorTime,
    AvgInstructorQa,
    AvgInstructorSpeaking,
    AvgSelfPreparation,
    AvgSelfMotivation,
    AvgSelfFuture,
    AvgRecommendFriend,
    CommentCount,
    ImportantCommentCount,
}

#[derive(DeriveIden)]
enum ScoreDistributions {
    #[sea_orm(iden = "score_distributions")]
    Table,
    Id,
    BatchId,
    RespondentAttribute,
    QuestionKey,
    ScoreValue,
    Count,
}

#[derive(DeriveIden)]
enum CommentSummaries {
    #[sea_orm(iden = "comment_summaries")]
    Table,
    Id,
    BatchId,
    RespondentAttribute,
    AnalysisType,
    Label,
    Count,
}
