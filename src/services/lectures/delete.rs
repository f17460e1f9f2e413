use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::LectureService;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::error_response;

pub async fn delete_lecture(
    service: &LectureService,
    request: &HttpRequest,
    lecture_id: i64,
) -> ActixResult<HttpResponse> {
    // 与进行中的上传、确定处理互斥
    match service.get_pipeline(request).delete_lecture(lecture_id).await {
        Ok(true) => Ok(HttpResponse::Ok().json(ApiResponse::success_empty("讲义已删除"))),
        Ok(false) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::LectureNotFound,
            "Lecture not found",
        ))),
        Err(e) => Ok(error_response(&e, Some(ErrorCode::LectureDeleteFailed))),
    }
}
