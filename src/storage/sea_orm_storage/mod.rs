//! SeaORM 存储实现
//!
//! 统一的数据库存储层，支持 SQLite、PostgreSQL 和 MySQL。

mod batches;
mod lectures;
mod responses;
mod summaries;

use crate::config::{AppConfig, DatabaseConfig};
use crate::errors::{Result, SurveyError};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;
use tracing::info;

/// SeaORM 存储实现
#[derive(Clone)]
pub struct SeaOrmStorage {
    pub(crate) db: DatabaseConnection,
}

impl SeaOrmStorage {
    /// 创建新的 SeaORM 存储实例
    pub async fn new_async() -> Result<Self> {
        let config = AppConfig::get();
        Self::connect(&config.database).await
    }

    /// 按数据库配置连接并运行迁移
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let db_url = Self::build_database_url(&config.url)?;

        // 根据数据库类型选择连接方式
        let db = if db_url.starts_with("sqlite:") {
            Self::connect_sqlite(&db_url, config).await?
        } else {
            Self::connect_generic(&db_url, config).await?
        };

        // 运行迁移
        Migrator::up(&db, None)
            .await
            .map_err(|e| SurveyError::database_operation(format!("数据库迁移失败: {e}")))?;

        info!("SeaORM 存储初始化完成，数据库: {}", db_url);

        Ok(Self { db })
    }

    /// 内存 SQLite（单连接，测试使用）
    #[cfg(test)]
    pub(crate) async fn new_in_memory() -> Result<Self> {
        Self::connect(&DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            pool_size: 1,
            timeout: 5,
        })
        .await
    }

    /// SQLite 专用连接（WAL + pragma 优化）
    async fn connect_sqlite(url: &str, config: &DatabaseConfig) -> Result<DatabaseConnection> {
        use sea_orm::SqlxSqliteConnector;
        use sea_orm::sqlx::sqlite::{
            SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
        };
        use std::str::FromStr;

        let in_memory = url.contains(":memory:");
        let mut opt = SqliteConnectOptions::from_str(url)
            .map_err(|e| SurveyError::database_config(format!("SQLite URL 解析失败: {e}")))?
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));

        if !in_memory {
            opt = opt
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
                .pragma("cache_size", "-64000")
                .pragma("temp_store", "memory")
                .pragma("wal_autocheckpoint", "1000");
        }

        // 内存库的每个连接都是独立的数据库，只能使用单连接
        let max_connections = if in_memory { 1 } else { config.pool_size };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .min_connections(1)
            .test_before_acquire(true)
            .acquire_timeout(Duration::from_secs(config.timeout))
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(opt)
            .await
            .map_err(|e| SurveyError::database_connection(format!("SQLite 连接失败: {e}")))?;

        Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
    }

    /// 通用连接（PostgreSQL、MySQL 等）
    async fn connect_generic(url: &str, config: &DatabaseConfig) -> Result<DatabaseConnection> {
        let mut opt = ConnectOptions::new(url);
        opt.max_connections(config.pool_size)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(config.timeout))
            .acquire_timeout(Duration::from_secs(config.timeout))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .sqlx_logging(false)
            .sqlx_logging_level(tracing::log::LevelFilter::Debug);

        Database::connect(opt)
            .await
            .map_err(|e| SurveyError::database_connection(format!("无法连接到数据库: {e}")))
    }

    /// 从 URL 自动推断数据库类型并构建连接 URL
    fn build_database_url(url: &str) -> Result<String> {
        if url.starts_with("sqlite:") {
            Ok(url.to_string())
        } else if url == ":memory:" {
            Ok("sqlite::memory:".to_string())
        } else if url.ends_with(".db") || url.ends_with(".sqlite") {
            Ok(format!("sqlite://{url}?mode=rwc"))
        } else if url.starts_with("postgres://")
            || url.starts_with("postgresql://")
            || url.starts_with("mysql://")
            || url.starts_with("mariadb://")
        {
            Ok(url.to_string())
        } else {
            Err(SurveyError::database_config(format!(
                "无法从 URL 推断数据库类型: {url}. 支持: sqlite://, postgres://, mysql://, 或 .db/.sqlite 文件路径"
            )))
        }
    }
}

// Storage trait 实现
use crate::models::{
    batches::entities::{Batch, BatchType, NewBatch, PipelineState},
    batches::requests::BatchMetricsUpdate,
    lectures::entities::{Lecture, LectureKey, NewLecture},
    summaries::{BatchAggregates, SurveySummary},
    surveys::requests::CommentFilter,
    surveys::responses::CommentPage,
    surveys::{Comment, CommentClassification, NewComment, NewResponse, SurveyResponse},
};
use crate::storage::Storage;
use async_trait::async_trait;

#[async_trait]
impl Storage for SeaOrmStorage {
    // 讲义模块
    async fn find_lecture_by_key(&self, key: &LectureKey) -> Result<Option<Lecture>> {
        self.find_lecture_by_key_impl(key).await
    }

    async fn create_lecture(&self, lecture: NewLecture) -> Result<Lecture> {
        self.create_lecture_impl(lecture).await
    }

    async fn get_lecture_by_id(&self, lecture_id: i64) -> Result<Option<Lecture>> {
        self.get_lecture_by_id_impl(lecture_id).await
    }

    async fn list_lectures_by_course(
        &self,
        course_name: &str,
        academic_year: Option<i32>,
        term: Option<&str>,
    ) -> Result<Vec<Lecture>> {
        self.list_lectures_by_course_impl(course_name, academic_year, term)
            .await
    }

    async fn list_lectures(
        &self,
        course_name: Option<&str>,
        academic_year: Option<i32>,
        term: Option<&str>,
    ) -> Result<Vec<Lecture>> {
        self.list_lectures_impl(course_name, academic_year, term)
            .await
    }

    async fn delete_lecture(&self, lecture_id: i64) -> Result<bool> {
        self.delete_lecture_impl(lecture_id).await
    }

    // 批次模块
    async fn create_batch(&self, batch: NewBatch) -> Result<Batch> {
        self.create_batch_impl(batch).await
    }

    async fn get_batch_by_id(&self, batch_id: i64) -> Result<Option<Batch>> {
        self.get_batch_by_id_impl(batch_id).await
    }

    async fn list_batches_by_lecture(&self, lecture_id: i64) -> Result<Vec<Batch>> {
        self.list_batches_by_lecture_impl(lecture_id).await
    }

    async fn list_batches_by_lectures(&self, lecture_ids: &[i64]) -> Result<Vec<Batch>> {
        self.list_batches_by_lectures_impl(lecture_ids).await
    }

    async fn update_batch_metrics(
        &self,
        batch_id: i64,
        metrics: &BatchMetricsUpdate,
    ) -> Result<Option<Batch>> {
        self.update_batch_metrics_impl(batch_id, metrics).await
    }

    async fn update_batch_status(&self, batch_id: i64, status: PipelineState) -> Result<bool> {
        self.update_batch_status_impl(batch_id, status).await
    }

    async fn update_batch_type(&self, batch_id: i64, batch_type: BatchType) -> Result<bool> {
        self.update_batch_type_impl(batch_id, batch_type).await
    }

    async fn add_rejected_rows(&self, batch_id: i64, count: i32) -> Result<()> {
        self.add_rejected_rows_impl(batch_id, count).await
    }

    async fn delete_batch(&self, batch_id: i64) -> Result<bool> {
        self.delete_batch_impl(batch_id).await
    }

    // 回答模块
    async fn insert_response_row(
        &self,
        batch_id: i64,
        response: NewResponse,
        comments: Vec<NewComment>,
    ) -> Result<(SurveyResponse, Vec<Comment>)> {
        self.insert_response_row_impl(batch_id, response, comments)
            .await
    }

    async fn apply_comment_classification(
        &self,
        comment_id: i64,
        classification: CommentClassification,
    ) -> Result<bool> {
        self.apply_comment_classification_impl(comment_id, classification)
            .await
    }

    async fn list_responses_by_batch(&self, batch_id: i64) -> Result<Vec<SurveyResponse>> {
        self.list_responses_by_batch_impl(batch_id).await
    }

    async fn list_comments_by_batch(&self, batch_id: i64) -> Result<Vec<Comment>> {
        self.list_comments_by_batch_impl(batch_id).await
    }

    async fn list_comments_with_pagination(
        &self,
        batch_id: i64,
        filter: &CommentFilter,
        page: u64,
        size: u64,
    ) -> Result<CommentPage> {
        self.list_comments_with_pagination_impl(batch_id, filter, page, size)
            .await
    }

    // 汇总模块
    async fn replace_batch_aggregates(
        &self,
        batch_id: i64,
        aggregates: &BatchAggregates,
        analyzed_comments: i32,
    ) -> Result<()> {
        self.replace_batch_aggregates_impl(batch_id, aggregates, analyzed_comments)
            .await
    }

    async fn get_batch_aggregates(&self, batch_id: i64) -> Result<BatchAggregates> {
        self.get_batch_aggregates_impl(batch_id).await
    }

    async fn has_batch_aggregates(&self, batch_id: i64) -> Result<bool> {
        self.has_batch_aggregates_impl(batch_id).await
    }

    async fn list_summaries_for_batches(
        &self,
        batch_ids: &[i64],
        attribute: &str,
    ) -> Result<Vec<SurveySummary>> {
        self.list_summaries_for_batches_impl(batch_ids, attribute)
            .await
    }
}
