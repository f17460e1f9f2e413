use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, http::header};

use super::UploadService;
use crate::models::{ApiResponse, ErrorCode};
use crate::pipeline::SourceFormat;
use crate::services::error_response;

const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// 下载批次上传时保存的源文件
pub async fn download_source(
    service: &UploadService,
    request: &HttpRequest,
    batch_id: i64,
) -> ActixResult<HttpResponse> {
    let batch = match service.get_storage(request).get_batch_by_id(batch_id).await {
        Ok(Some(batch)) => batch,
        Ok(None) => {
            return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::BatchNotFound,
                "Batch not found",
            )));
        }
        Err(e) => return Ok(error_response(&e, None)),
    };

    let Some(uri) = batch.source_uri else {
        return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::NotFound,
            "No source file recorded for this batch",
        )));
    };

    let bytes = match service.get_blob_store(request).get(&uri).await {
        Ok(bytes) => bytes,
        Err(e) => return Ok(error_response(&e, Some(ErrorCode::UploadStorageFailed))),
    };

    let file_name = uri.rsplit('/').next().unwrap_or("upload.csv");
    let content_type = match SourceFormat::from_file_name(file_name) {
        SourceFormat::Csv => "text/csv; charset=utf-8",
        SourceFormat::Xlsx => XLSX_CONTENT_TYPE,
    };

    Ok(HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, content_type))
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{file_name}\""),
        ))
        .body(bytes))
}
