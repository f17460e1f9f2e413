use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::UploadService;
use crate::models::batches::responses::BatchStatusResponse;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::error_response;

pub async fn get_status(
    service: &UploadService,
    request: &HttpRequest,
    batch_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);

    let batch = match storage.get_batch_by_id(batch_id).await {
        Ok(Some(batch)) => batch,
        Ok(None) => {
            return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::BatchNotFound,
                "Batch not found",
            )));
        }
        Err(e) => return Ok(error_response(&e, None)),
    };

    // 汇总行存在即视为完成
    match storage.has_batch_aggregates(batch_id).await {
        Ok(completed) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            BatchStatusResponse { batch, completed },
            "获取成功",
        ))),
        Err(e) => Ok(error_response(&e, None)),
    }
}
