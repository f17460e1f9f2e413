use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::UploadService;
use crate::errors::SurveyError;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::error_response;

pub async fn finalize(
    service: &UploadService,
    request: &HttpRequest,
    batch_id: i64,
) -> ActixResult<HttpResponse> {
    let pipeline = service.get_pipeline(request);

    match pipeline.finalize_batch(batch_id).await {
        Ok(batch) => Ok(HttpResponse::Ok().json(ApiResponse::success(batch, "已转为确定版"))),
        Err(e) => {
            let code = match &e {
                SurveyError::NotFound(_) => ErrorCode::BatchNotFound,
                SurveyError::Conflict(_) => ErrorCode::BatchAlreadyConfirmed,
                // 仍在处理中的批次
                SurveyError::Validation(_) => {
                    return Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
                        ErrorCode::AnalysisNotReady,
                        e.message(),
                    )));
                }
                _ => ErrorCode::from_error(&e),
            };
            Ok(error_response(&e, Some(code)))
        }
    }
}
