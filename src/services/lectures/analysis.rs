use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{LectureService, parse_attribute, pick_reporting_batch};
use crate::models::lectures::requests::LectureAnalysisQuery;
use crate::models::lectures::responses::LectureAnalysisResponse;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::error_response;

pub async fn get_analysis(
    service: &LectureService,
    request: &HttpRequest,
    lecture_id: i64,
    query: LectureAnalysisQuery,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);

    let Some(attribute) = parse_attribute(query.attribute.as_deref()) else {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::BadRequest,
            "Unknown respondent attribute",
        )));
    };

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

    let batch = match query.batch_id {
        Some(batch_id) => match storage.get_batch_by_id(batch_id).await {
            // 批次必须属于该讲义
            Ok(Some(batch)) if batch.lecture_id == lecture.id => batch,
            Ok(_) => {
                return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                    ErrorCode::BatchNotFound,
                    "Batch not found for this lecture",
                )));
            }
            Err(e) => return Ok(error_response(&e, None)),
        },
        None => {
            let batches = match storage.list_batches_by_lecture(lecture.id).await {
                Ok(batches) => batches,
                Err(e) => return Ok(error_response(&e, None)),
            };
            match pick_reporting_batch(&batches) {
                Some(batch) => batch.clone(),
                None => {
                    return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                        ErrorCode::AnalysisNotReady,
                        "No aggregated batch for this lecture yet",
                    )));
                }
            }
        }
    };

    let aggregates = match storage.get_batch_aggregates(batch.id).await {
        Ok(aggregates) => aggregates,
        Err(e) => return Ok(error_response(&e, None)),
    };
    if aggregates.is_empty() {
        return Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
            ErrorCode::AnalysisNotReady,
            format!("Batch {} is still {}", batch.id, batch.status),
        )));
    }

    let group = aggregates.for_group(&attribute);
    let response = LectureAnalysisResponse {
        lecture,
        batch,
        attribute,
        // 未出现的属性组没有汇总行
        summary: group.summaries.into_iter().next(),
        distributions: group.distributions,
        comment_summaries: group.comment_summaries,
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(response, "获取成功")))
}
