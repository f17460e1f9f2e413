use crate::blob::{BlobStore, create_blob_store};
use crate::cache::LectureCache;
use crate::config::AppConfig;
use crate::llm::build_classifier;
use crate::pipeline::{ClassificationLimits, UploadPipeline};
use crate::storage::Storage;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct StartupContext {
    pub storage: Arc<dyn Storage>,
    pub blob_store: Arc<dyn BlobStore>,
    pub pipeline: UploadPipeline,
}

/// 准备服务器启动的上下文
/// 包括数据库、讲义缓存、源文件存储与分类器
pub async fn prepare_server_startup() -> StartupContext {
    let config = AppConfig::get();

    let storage = crate::storage::create_storage()
        .await
        .expect("Failed to create storage backend");
    warn!("Storage backend initialized and migrations completed");

    let cache = LectureCache::from_config();
    debug!(
        "Lecture cache initialized (capacity {}, ttl {}s)",
        config.cache.max_capacity, config.cache.ttl_seconds
    );

    let blob_store = create_blob_store(&config.upload)
        .await
        .expect("Failed to create upload storage backend");
    warn!("Upload storage backend '{}' initialized", config.upload.backend);

    let classifier = build_classifier(&config.llm).expect("Failed to create comment classifier");
    let limits = ClassificationLimits::from_config(&config.pipeline);
    warn!(
        "Classifier ready: provider '{}', {} concurrent call(s), {:?} timeout",
        config.llm.provider, limits.max_concurrency, limits.call_timeout
    );

    let pipeline = UploadPipeline::new(storage.clone(), classifier, cache, limits);

    StartupContext {
        storage,
        blob_store,
        pipeline,
    }
}
