pub mod batches;
pub mod common;
pub mod lectures;
pub mod summaries;
pub mod surveys;

pub use common::{ApiResponse, RequestContext};

use crate::errors::SurveyError;

/// 程序启动时间
#[derive(Debug, Clone)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}

/// 业务错误码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,

    // 通用错误
    BadRequest = 1000,
    Unauthorized = 1001,
    NotFound = 1004,
    InternalServerError = 1005,

    // 上传相关
    UploadMetadataInvalid = 2000,
    UploadFormatInvalid = 2001,
    UploadFileMissing = 2002,
    UploadFileTooLarge = 2003,
    UploadStorageFailed = 2004,

    // 讲义与批次
    LectureNotFound = 3000,
    BatchNotFound = 3001,
    BatchAlreadyConfirmed = 3002,
    AnalysisNotReady = 3003,
    LectureDeleteFailed = 3004,
    BatchDeleteFailed = 3005,
}

impl ErrorCode {
    /// 根据内部错误类型选择对外的错误码
    pub fn from_error(err: &SurveyError) -> Self {
        match err {
            SurveyError::Format(_) | SurveyError::RowRejected(_) => ErrorCode::UploadFormatInvalid,
            SurveyError::Validation(_) | SurveyError::DateParse(_) => {
                ErrorCode::UploadMetadataInvalid
            }
            SurveyError::Storage(_) => ErrorCode::UploadStorageFailed,
            SurveyError::NotFound(_) => ErrorCode::NotFound,
            _ => ErrorCode::InternalServerError,
        }
    }
}
