pub mod lectures;
pub mod uploads;

pub use lectures::LectureService;
pub use uploads::UploadService;

use actix_web::HttpResponse;

use crate::errors::SurveyError;
use crate::models::{ApiResponse, ErrorCode};

/// 把内部错误映射为统一响应，调用方可自行指定错误码
pub(crate) fn error_response(err: &SurveyError, code: Option<ErrorCode>) -> HttpResponse {
    let body = ApiResponse::from_error(err, code);

    match err {
        _ if err.is_client_error() => HttpResponse::BadRequest().json(body),
        SurveyError::NotFound(_) => HttpResponse::NotFound().json(body),
        SurveyError::Conflict(_) => HttpResponse::Conflict().json(body),
        SurveyError::Storage(_) => HttpResponse::BadGateway().json(body),
        _ => {
            tracing::error!("{}", err);
            HttpResponse::InternalServerError().json(body)
        }
    }
}
