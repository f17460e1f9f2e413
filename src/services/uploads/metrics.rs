use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::UploadService;
use crate::models::batches::requests::BatchMetricsUpdate;
use crate::models::batches::responses::BatchMetricsResponse;
use crate::models::{ApiResponse, ErrorCode};
use crate::pipeline::check_metrics;
use crate::services::error_response;

fn batch_not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ApiResponse::error_empty(
        ErrorCode::BatchNotFound,
        "Batch not found",
    ))
}

pub async fn get_metrics(
    service: &UploadService,
    request: &HttpRequest,
    batch_id: i64,
) -> ActixResult<HttpResponse> {
    match service.get_storage(request).get_batch_by_id(batch_id).await {
        Ok(Some(batch)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            BatchMetricsResponse::from(&batch),
            "获取成功",
        ))),
        Ok(None) => Ok(batch_not_found()),
        Err(e) => Ok(error_response(&e, None)),
    }
}

pub async fn update_metrics(
    service: &UploadService,
    request: &HttpRequest,
    batch_id: i64,
    metrics: BatchMetricsUpdate,
) -> ActixResult<HttpResponse> {
    if let Err(e) = check_metrics(metrics.zoom_participants, metrics.recording_views) {
        return Ok(error_response(&e, Some(ErrorCode::BadRequest)));
    }

    match service
        .get_storage(request)
        .update_batch_metrics(batch_id, &metrics)
        .await
    {
        Ok(Some(batch)) => {
            info!(
                "Batch {} metrics updated: zoom {:?}, views {:?}",
                batch_id, batch.zoom_participants, batch.recording_views
            );
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                BatchMetricsResponse::from(&batch),
                "指标已更新",
            )))
        }
        Ok(None) => Ok(batch_not_found()),
        Err(e) => Ok(error_response(&e, None)),
    }
}
