use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::batches::requests::BatchMetricsUpdate;
use crate::services::UploadService;

// 懒加载的全局 UploadService 实例
static UPLOAD_SERVICE: Lazy<UploadService> = Lazy::new(UploadService::new_lazy);

pub async fn create_upload(
    request: HttpRequest,
    payload: actix_multipart::Multipart,
) -> ActixResult<HttpResponse> {
    UPLOAD_SERVICE.create_upload(&request, payload).await
}

pub async fn get_status(request: HttpRequest, path: web::Path<i64>) -> ActixResult<HttpResponse> {
    UPLOAD_SERVICE.get_status(&request, path.into_inner()).await
}

pub async fn finalize(request: HttpRequest, path: web::Path<i64>) -> ActixResult<HttpResponse> {
    UPLOAD_SERVICE.finalize(&request, path.into_inner()).await
}

pub async fn delete_batch(request: HttpRequest, path: web::Path<i64>) -> ActixResult<HttpResponse> {
    UPLOAD_SERVICE.delete_batch(&request, path.into_inner()).await
}

pub async fn get_metrics(request: HttpRequest, path: web::Path<i64>) -> ActixResult<HttpResponse> {
    UPLOAD_SERVICE.get_metrics(&request, path.into_inner()).await
}

pub async fn update_metrics(
    request: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<BatchMetricsUpdate>,
) -> ActixResult<HttpResponse> {
    UPLOAD_SERVICE
        .update_metrics(&request, path.into_inner(), body.into_inner())
        .await
}

pub async fn download_source(
    request: HttpRequest,
    path: web::Path<i64>,
) -> ActixResult<HttpResponse> {
    UPLOAD_SERVICE
        .download_source(&request, path.into_inner())
        .await
}

// 配置路由
pub fn configure_upload_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/uploads")
            .wrap(middlewares::RequireIdentity)
            .route("", web::post().to(create_upload))
            .route("/{id}/status", web::get().to(get_status))
            .route("/{id}/finalize", web::post().to(finalize))
            .route("/{id}/metrics", web::get().to(get_metrics))
            .route("/{id}/metrics", web::put().to(update_metrics))
            .route("/{id}/source", web::get().to(download_source))
            .route("/{id}", web::delete().to(delete_batch)),
    );
}
