use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{LectureService, pick_reporting_batch};
use crate::models::lectures::responses::LectureDetailResponse;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::error_response;

pub async fn get_lecture_detail(
    service: &LectureService,
    request: &HttpRequest,
    lecture_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);

    let lecture = match storage.get_lecture_by_id(lecture_id).await {
        Ok(Some(lecture)) => lecture,
        Ok(None) => {
            return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::LectureNotFound,
                "Lecture not found",
            )));
        }
        Err(e) => return Ok(error_response(&e, None)),
    };

    let batches = match storage.list_batches_by_lecture(lecture.id).await {
        Ok(batches) => batches,
        Err(e) => return Ok(error_response(&e, None)),
    };

    let response = LectureDetailResponse {
        reporting_batch_id: pick_reporting_batch(&batches).map(|b| b.id),
        lecture,
        batches,
    };
    Ok(HttpResponse::Ok().json(ApiResponse::success(response, "获取成功")))
}
