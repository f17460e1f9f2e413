use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::UploadService;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::error_response;

pub async fn delete_batch(
    service: &UploadService,
    request: &HttpRequest,
    batch_id: i64,
) -> ActixResult<HttpResponse> {
    let pipeline = service.get_pipeline(request);

    match pipeline.delete_batch(batch_id).await {
        Ok(true) => Ok(HttpResponse::Ok().json(ApiResponse::success_empty("批次已删除"))),
        Ok(false) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::BatchNotFound,
            "Batch not found",
        ))),
        Err(e) => Ok(error_response(&e, Some(ErrorCode::BatchDeleteFailed))),
    }
}
