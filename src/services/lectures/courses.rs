use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::collections::HashMap;

use super::LectureService;
use crate::models::batches::entities::{Batch, BatchType, PipelineState};
use crate::models::lectures::entities::Lecture;
use crate::models::lectures::requests::CourseListQuery;
use crate::models::lectures::responses::{CourseItem, CourseListResponse, SessionSummary};
use crate::models::ApiResponse;
use crate::services::error_response;

/// 按 (课程名, 年度, 学期) 分组，保持讲义的原有顺序
pub(crate) fn group_courses(lectures: Vec<Lecture>, batches: &[Batch]) -> Vec<CourseItem> {
    let mut types: HashMap<i64, Vec<BatchType>> = HashMap::new();
    for batch in batches.iter().filter(|b| b.status == PipelineState::Done) {
        types.entry(batch.lecture_id).or_default().push(batch.batch_type);
    }

    let mut courses: Vec<CourseItem> = Vec::new();
    for lecture in lectures {
        let mut analysis_types = types.remove(&lecture.id).unwrap_or_default();
        analysis_types.sort();
        analysis_types.dedup();

        let session = SessionSummary {
            lecture_id: lecture.id,
            session: lecture.session,
            lecture_on: lecture.lecture_on,
            instructor_name: lecture.instructor_name,
            analysis_types,
        };

        match courses.last_mut() {
            Some(course)
                if course.course_name == lecture.course_name
                    && course.academic_year == lecture.academic_year
                    && course.term == lecture.term =>
            {
                course.sessions.push(session);
            }
            _ => courses.push(CourseItem {
                course_name: lecture.course_name,
                academic_year: lecture.academic_year,
                term: lecture.term,
                sessions: vec![session],
            }),
        }
    }
    courses
}

pub async fn list_courses(
    service: &LectureService,
    request: &HttpRequest,
    query: CourseListQuery,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);

    let course_name = query.course_name.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let term = query.term.as_deref().map(str::trim).filter(|s| !s.is_empty());

    let lectures = match storage
        .list_lectures(course_name, query.academic_year, term)
        .await
    {
        Ok(lectures) => lectures,
        Err(e) => return Ok(error_response(&e, None)),
    };

    let lecture_ids: Vec<i64> = lectures.iter().map(|l| l.id).collect();
    let batches = if lecture_ids.is_empty() {
        Vec::new()
    } else {
        match storage.list_batches_by_lectures(&lecture_ids).await {
            Ok(batches) => batches,
            Err(e) => return Ok(error_response(&e, None)),
        }
    };

    let response = CourseListResponse {
        courses: group_courses(lectures, &batches),
    };
    Ok(HttpResponse::Ok().json(ApiResponse::success(response, "获取成功")))
}
