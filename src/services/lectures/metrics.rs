//! 讲义级指标：读写该讲义当前用于展示的批次

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::{LectureService, pick_reporting_batch};
use crate::errors::Result;
use crate::models::batches::entities::Batch;
use crate::models::batches::requests::BatchMetricsUpdate;
use crate::models::batches::responses::BatchMetricsResponse;
use crate::models::{ApiResponse, ErrorCode};
use crate::pipeline::check_metrics;
use crate::services::error_response;
use crate::storage::Storage;

/// 讲义不存在时返回 None；讲义存在但没有可用批次时内层为 None
async fn target_batch(storage: &dyn Storage, lecture_id: i64) -> Result<Option<Option<Batch>>> {
    if storage.get_lecture_by_id(lecture_id).await?.is_none() {
        return Ok(None);
    }
    let batches = storage.list_batches_by_lecture(lecture_id).await?;
    Ok(Some(pick_reporting_batch(&batches).cloned()))
}

fn lecture_not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ApiResponse::error_empty(
        ErrorCode::LectureNotFound,
        "Lecture not found",
    ))
}

pub async fn get_lecture_metrics(
    service: &LectureService,
    request: &HttpRequest,
    lecture_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);

    let response = match target_batch(storage.as_ref(), lecture_id).await {
        Ok(Some(Some(batch))) => BatchMetricsResponse::from(&batch),
        Ok(Some(None)) => BatchMetricsResponse {
            batch_id: None,
            lecture_id,
            zoom_participants: None,
            recording_views: None,
        },
        Ok(None) => return Ok(lecture_not_found()),
        Err(e) => return Ok(error_response(&e, None)),
    };
    Ok(HttpResponse::Ok().json(ApiResponse::success(response, "获取成功")))
}

pub async fn update_lecture_metrics(
    service: &LectureService,
    request: &HttpRequest,
    lecture_id: i64,
    metrics: BatchMetricsUpdate,
) -> ActixResult<HttpResponse> {
    if let Err(e) = check_metrics(metrics.zoom_participants, metrics.recording_views) {
        return Ok(error_response(&e, Some(ErrorCode::BadRequest)));
    }

    let storage = service.get_storage(request);
    let batch = match target_batch(storage.as_ref(), lecture_id).await {
        Ok(Some(Some(batch))) => batch,
        Ok(Some(None)) => {
            return Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
                ErrorCode::AnalysisNotReady,
                "No aggregated batch for this lecture yet",
            )));
        }
        Ok(None) => return Ok(lecture_not_found()),
        Err(e) => return Ok(error_response(&e, None)),
    };

    match storage.update_batch_metrics(batch.id, &metrics).await {
        Ok(Some(updated)) => {
            info!("Lecture {} metrics written to batch {}", lecture_id, updated.id);
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                BatchMetricsResponse::from(&updated),
                "指标已更新",
            )))
        }
        // 批次在查询后被删除
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::BatchNotFound,
            "Batch not found",
        ))),
        Err(e) => Ok(error_response(&e, None)),
    }
}
