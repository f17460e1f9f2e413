pub mod create;
pub mod delete;
pub mod finalize;
pub mod metrics;
pub mod source;
pub mod status;

use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use std::sync::Arc;

use crate::blob::BlobStore;
use crate::models::batches::requests::BatchMetricsUpdate;
use crate::pipeline::UploadPipeline;
use crate::storage::Storage;

pub struct UploadService {
    storage: Option<Arc<dyn Storage>>,
    pipeline: Option<UploadPipeline>,
    blob_store: Option<Arc<dyn BlobStore>>,
}

impl UploadService {
    pub fn new_lazy() -> Self {
        Self {
            storage: None,
            pipeline: None,
            blob_store: None,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_components(
        storage: Arc<dyn Storage>,
        pipeline: UploadPipeline,
        blob_store: Arc<dyn BlobStore>,
    ) -> Self {
        Self {
            storage: Some(storage),
            pipeline: Some(pipeline),
            blob_store: Some(blob_store),
        }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Arc<dyn Storage> {
        if let Some(storage) = &self.storage {
            storage.clone()
        } else {
            request
                .app_data::<web::Data<Arc<dyn Storage>>>()
                .expect("Storage not found in app data")
                .get_ref()
                .clone()
        }
    }

    pub(crate) fn get_pipeline(&self, request: &HttpRequest) -> UploadPipeline {
        if let Some(pipeline) = &self.pipeline {
            pipeline.clone()
        } else {
            request
                .app_data::<web::Data<UploadPipeline>>()
                .expect("UploadPipeline not found in app data")
                .get_ref()
                .clone()
        }
    }

    pub(crate) fn get_blob_store(&self, request: &HttpRequest) -> Arc<dyn BlobStore> {
        if let Some(blob_store) = &self.blob_store {
            blob_store.clone()
        } else {
            request
                .app_data::<web::Data<Arc<dyn BlobStore>>>()
                .expect("BlobStore not found in app data")
                .get_ref()
                .clone()
        }
    }

    // 上传 CSV / Excel 并同步处理
    pub async fn create_upload(
        &self,
        request: &HttpRequest,
        payload: Multipart,
    ) -> ActixResult<HttpResponse> {
        create::create_upload(self, request, payload).await
    }

    // 查询批次状态
    pub async fn get_status(&self, request: &HttpRequest, batch_id: i64) -> ActixResult<HttpResponse> {
        status::get_status(self, request, batch_id).await
    }

    // 速报版转为确定版
    pub async fn finalize(&self, request: &HttpRequest, batch_id: i64) -> ActixResult<HttpResponse> {
        finalize::finalize(self, request, batch_id).await
    }

    // 批次指标
    pub async fn get_metrics(&self, request: &HttpRequest, batch_id: i64) -> ActixResult<HttpResponse> {
        metrics::get_metrics(self, request, batch_id).await
    }

    // 补录批次指标
    pub async fn update_metrics(
        &self,
        request: &HttpRequest,
        batch_id: i64,
        body: BatchMetricsUpdate,
    ) -> ActixResult<HttpResponse> {
        metrics::update_metrics(self, request, batch_id, body).await
    }

    // 下载源文件
    pub async fn download_source(
        &self,
        request: &HttpRequest,
        batch_id: i64,
    ) -> ActixResult<HttpResponse> {
        source::download_source(self, request, batch_id).await
    }

    // 删除批次
    pub async fn delete_batch(
        &self,
        request: &HttpRequest,
        batch_id: i64,
    ) -> ActixResult<HttpResponse> {
        delete::delete_batch(self, request, batch_id).await
    }
}
