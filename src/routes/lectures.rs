use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, middleware, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::batches::requests::BatchMetricsUpdate;
use crate::models::lectures::requests::{
    CourseListQuery, LectureAnalysisQuery, WeightedAverageQuery,
};
use crate::models::surveys::requests::CommentListQuery;
use crate::services::LectureService;

// 懒加载的全局 LectureService 实例
static LECTURE_SERVICE: Lazy<LectureService> = Lazy::new(LectureService::new_lazy);

pub async fn get_lecture_detail(
    request: HttpRequest,
    path: web::Path<i64>,
) -> ActixResult<HttpResponse> {
    LECTURE_SERVICE
        .get_lecture_detail(&request, path.into_inner())
        .await
}

pub async fn get_analysis(
    request: HttpRequest,
    path: web::Path<i64>,
    query: web::Query<LectureAnalysisQuery>,
) -> ActixResult<HttpResponse> {
    LECTURE_SERVICE
        .get_analysis(&request, path.into_inner(), query.into_inner())
        .await
}

pub async fn list_comments(
    request: HttpRequest,
    path: web::Path<i64>,
    query: web::Query<CommentListQuery>,
) -> ActixResult<HttpResponse> {
    LECTURE_SERVICE
        .list_comments(&request, path.into_inner(), query.into_inner())
        .await
}

pub async fn get_lecture_metrics(
    request: HttpRequest,
    path: web::Path<i64>,
) -> ActixResult<HttpResponse> {
    LECTURE_SERVICE
        .get_lecture_metrics(&request, path.into_inner())
        .await
}

pub async fn update_lecture_metrics(
    request: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<BatchMetricsUpdate>,
) -> ActixResult<HttpResponse> {
    LECTURE_SERVICE
        .update_lecture_metrics(&request, path.into_inner(), body.into_inner())
        .await
}

pub async fn delete_lecture(
    request: HttpRequest,
    path: web::Path<i64>,
) -> ActixResult<HttpResponse> {
    LECTURE_SERVICE
        .delete_lecture(&request, path.into_inner())
        .await
}

pub async fn get_weighted_averages(
    request: HttpRequest,
    query: web::Query<WeightedAverageQuery>,
) -> ActixResult<HttpResponse> {
    LECTURE_SERVICE
        .get_weighted_averages(&request, query.into_inner())
        .await
}

pub async fn list_courses(
    request: HttpRequest,
    query: web::Query<CourseListQuery>,
) -> ActixResult<HttpResponse> {
    LECTURE_SERVICE
        .list_courses(&request, query.into_inner())
        .await
}

pub async fn list_attributes() -> ActixResult<HttpResponse> {
    LECTURE_SERVICE.list_attributes().await
}

// 配置路由
pub fn configure_lecture_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/lectures")
            .wrap(middlewares::RequireIdentity)
            .wrap(middleware::Compress::default())
            .route("/{id}/analysis", web::get().to(get_analysis))
            .route("/{id}/comments", web::get().to(list_comments))
            .route("/{id}/metrics", web::get().to(get_lecture_metrics))
            .route("/{id}/metrics", web::put().to(update_lecture_metrics))
            .route("/{id}", web::get().to(get_lecture_detail))
            .route("/{id}", web::delete().to(delete_lecture)),
    )
    .service(
        web::scope("/api/v1/courses")
            .wrap(middlewares::RequireIdentity)
            .wrap(middleware::Compress::default())
            .route("", web::get().to(list_courses))
            .route("/weighted-averages", web::get().to(get_weighted_averages)),
    )
    .service(
        web::scope("/api/v1/attributes")
            .wrap(middlewares::RequireIdentity)
            .route("", web::get().to(list_attributes)),
    );
}
