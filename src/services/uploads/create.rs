use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{info, warn};

use super::UploadService;
use crate::blob::storage_key;
use crate::config::AppConfig;
use crate::middlewares::RequireIdentity;
use crate::models::batches::responses::UploadResponse;
use crate::models::{ApiResponse, ErrorCode};
use crate::pipeline::UploadReport;
use crate::services::error_response;
use crate::utils::read_upload_form;

pub(crate) fn status_url(batch_id: i64) -> String {
    format!("/api/v1/uploads/{batch_id}/status")
}

impl From<UploadReport> for UploadResponse {
    fn from(report: UploadReport) -> Self {
        let batch = report.batch;
        Self {
            batch_id: batch.id,
            lecture_id: report.lecture.id,
            status: batch.status,
            processed_rows: batch.processed_rows,
            rejected_rows: batch.rejected_rows,
            processed_comments: batch.processed_comments,
            analyzed_comments: batch.analyzed_comments,
            warnings: report.warnings,
            status_url: status_url(batch.id),
        }
    }
}

pub async fn create_upload(
    service: &UploadService,
    request: &HttpRequest,
    mut payload: Multipart,
) -> ActixResult<HttpResponse> {
    let Some(context) = RequireIdentity::extract_context(request) else {
        return Ok(HttpResponse::Unauthorized().json(ApiResponse::error_empty(
            ErrorCode::Unauthorized,
            "Missing caller identity",
        )));
    };

    let max_size = AppConfig::get().upload.max_size;
    let form = match read_upload_form(&mut payload, max_size).await {
        Ok(form) => form,
        Err(e) => {
            warn!("Upload form rejected: {}", e.message());
            return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(e.error_code(), e.message())));
        }
    };

    let pipeline = service.get_pipeline(request);

    // 校验通过后才写入源文件
    let prepared = match pipeline.prepare(&form.metadata, &form.file_name, &form.content) {
        Ok(prepared) => prepared,
        Err(e) => return Ok(error_response(&e, None)),
    };

    let key = {
        let lecture = &prepared.identity.lecture.key;
        storage_key(
            &lecture.course_name,
            lecture.lecture_on,
            &lecture.session,
            &form.file_name,
        )
    };
    let source_uri = match service.get_blob_store(request).put(form.content, &key).await {
        Ok(uri) => uri,
        Err(e) => return Ok(error_response(&e, Some(ErrorCode::UploadStorageFailed))),
    };
    info!("Source file for upload by {} stored at {}", context.user_id, source_uri);

    match pipeline.execute(prepared, Some(source_uri), &context).await {
        Ok(report) => {
            let response = UploadResponse::from(report);
            Ok(HttpResponse::Created().json(ApiResponse::success(response, "上传处理完成")))
        }
        Err(e) => Ok(error_response(&e, None)),
    }
}
