use serde::Deserialize;
use ts_rs::TS;

use super::entities::BatchType;

/// 上传时随文件提交的讲义元数据（multipart 的 metadata 字段）
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/batch.ts")]
pub struct UploadMetadata {
    pub course_name: Option<String>,
    pub academic_year: Option<i32>,
    pub term: Option<String>,
    pub session: Option<String>,
    // YYYY-MM-DD
    pub lecture_on: Option<String>,
    pub instructor_name: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub batch_type: BatchType,
    pub zoom_participants: Option<i32>,
    pub recording_views: Option<i32>,
}

/// 上传后补录的批次指标，两项均整体覆盖
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/batch.ts")]
pub struct BatchMetricsUpdate {
    pub zoom_participants: Option<i32>,
    pub recording_views: Option<i32>,
}
