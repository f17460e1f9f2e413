//! Survey Insight 的统一响应信封
//!
//! 所有 `/api/v1` 接口都返回 `{code, message, data, timestamp}`，
//! `code` 取自 [`ErrorCode`]，成功时为 0。

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::errors::SurveyError;
use crate::models::ErrorCode;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/api.ts")]
pub struct ApiResponse<T: TS> {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl<T: TS> ApiResponse<T> {
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::Success as i32,
            message: message.into(),
            data: Some(data),
            timestamp: chrono::Utc::now(),
        }
    }
}

impl ApiResponse<()> {
    pub fn success_empty(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::Success as i32,
            message: message.into(),
            data: None,
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn error_empty(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code as i32,
            message: message.into(),
            data: None,
            timestamp: chrono::Utc::now(),
        }
    }

    /// 由内部错误生成响应体，未指定错误码时按错误类型推断
    pub fn from_error(err: &SurveyError, code: Option<ErrorCode>) -> Self {
        let code = code.unwrap_or_else(|| ErrorCode::from_error(err));
        Self::error_empty(code, err.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_data_is_omitted() {
        let body = serde_json::to_value(ApiResponse::success_empty("讲义已删除")).unwrap();
        assert_eq!(body["code"], 0);
        assert!(body.get("data").is_none());
    }

    #[test]
    fn test_error_code_follows_error_kind() {
        let body = ApiResponse::from_error(&SurveyError::format("bad header"), None);
        assert_eq!(body.code, ErrorCode::UploadFormatInvalid as i32);
        assert_eq!(body.message, "bad header");

        let body = ApiResponse::from_error(
            &SurveyError::not_found("Batch 1 not found"),
            Some(ErrorCode::BatchNotFound),
        );
        assert_eq!(body.code, ErrorCode::BatchNotFound as i32);
    }
}
