use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{LectureService, parse_attribute, pick_reporting_batch};
use crate::models::summaries::ALL_GROUP;
use crate::models::surveys::RespondentAttribute;
use crate::models::surveys::requests::{CommentFilter, CommentListQuery};
use crate::models::surveys::responses::CommentListResponse;
use crate::models::common::PaginationInfo;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::error_response;

/// 查询参数转为存储层筛选条件，属性无法识别时返回 None
fn comment_filter(query: &CommentListQuery) -> Option<CommentFilter> {
    let attribute = match parse_attribute(query.attribute.as_deref())? {
        group if group == ALL_GROUP => None,
        group => Some(group.parse::<RespondentAttribute>().ok()?),
    };

    Some(CommentFilter {
        attribute,
        question_type: query.question_type,
        sentiment: query.sentiment,
        category: query.category,
        importance: query.importance,
        analyzed_only: query.analyzed_only.unwrap_or(false),
        include_abusive: query.include_abusive.unwrap_or(false),
    })
}

pub async fn list_comments(
    service: &LectureService,
    request: &HttpRequest,
    lecture_id: i64,
    query: CommentListQuery,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);

    let Some(filter) = comment_filter(&query) else {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::BadRequest,
            "Unknown respondent attribute",
        )));
    };

    match storage.get_lecture_by_id(lecture_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::LectureNotFound,
                "Lecture not found",
            )));
        }
        Err(e) => return Ok(error_response(&e, None)),
    }

    let batches = match storage.list_batches_by_lecture(lecture_id).await {
        Ok(batches) => batches,
        Err(e) => return Ok(error_response(&e, None)),
    };
    let batch_id = match query.batch_id {
        Some(id) if batches.iter().any(|b| b.id == id) => id,
        Some(_) => {
            return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::BatchNotFound,
                "Batch not found for this lecture",
            )));
        }
        None => match pick_reporting_batch(&batches) {
            Some(batch) => batch.id,
            None => {
                return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                    ErrorCode::AnalysisNotReady,
                    "No aggregated batch for this lecture yet",
                )));
            }
        },
    };

    let (page, size) = PaginationInfo::clamp(query.page, query.size);
    match storage
        .list_comments_with_pagination(batch_id, &filter, page, size)
        .await
    {
        Ok(result) => {
            let response = CommentListResponse {
                lecture_id,
                batch_id,
                items: result.items,
                pagination: result.pagination,
            };
            Ok(HttpResponse::Ok().json(ApiResponse::success(response, "获取成功")))
        }
        Err(e) => Ok(error_response(&e, None)),
    }
}
