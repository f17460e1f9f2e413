use config::{Config, ConfigError, Environment, File};
use std::sync::OnceLock;

use super::AppConfig;

static APP_CONFIG: OnceLock<AppConfig> = OnceLock::new();

impl AppConfig {
    /// 加载配置
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            // 首先加载默认配置文件
            .add_source(File::with_name("config").required(false))
            // 然后根据环境加载特定配置文件
            .add_source(
                File::with_name(&format!(
                    "config.{}",
                    std::env::var("APP_ENV").unwrap_or_else(|_| "development".into())
                ))
                .required(false),
            )
            // 最后加载环境变量覆盖
            .add_source(
                Environment::with_prefix("SURVEY")
                    .separator("_")
                    .try_parsing(true),
            );

        builder = Self::apply_defaults(builder)?;

        // 支持从常用环境变量加载
        builder = builder
            .set_override_option("app.environment", std::env::var("APP_ENV").ok())?
            .set_override_option("app.log_level", std::env::var("RUST_LOG").ok())?
            .set_override_option("server.host", std::env::var("SERVER_HOST").ok())?
            .set_override_option("server.port", std::env::var("SERVER_PORT").ok())?
            .set_override_option("server.unix_socket_path", std::env::var("UNIX_SOCKET").ok())?
            .set_override_option("server.workers", std::env::var("CPU_COUNT").ok())?
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .set_override_option("upload.backend", std::env::var("UPLOAD_BACKEND").ok())?
            .set_override_option("upload.dir", std::env::var("UPLOAD_LOCAL_DIRECTORY").ok())?
            .set_override_option("upload.s3_bucket", std::env::var("UPLOAD_S3_BUCKET").ok())?
            .set_override_option("llm.provider", std::env::var("LLM_PROVIDER").ok())?
            .set_override_option("llm.api_base", std::env::var("LLM_API_BASE").ok())?
            .set_override_option("llm.api_key", std::env::var("LLM_API_KEY").ok())?
            .set_override_option("llm.model", std::env::var("LLM_MODEL").ok())?
            .set_override_option(
                "llm.timeout_seconds",
                std::env::var("LLM_TIMEOUT_SECONDS").ok(),
            )?;

        let config = builder.build()?;
        let mut app_config: AppConfig = config.try_deserialize()?;

        // 处理工作线程数
        if app_config.server.workers == 0 {
            app_config.server.workers = num_cpus::get().min(app_config.server.max_workers);
        }

        app_config.normalize();

        Ok(app_config)
    }

    /// 内置默认值，配置文件缺失时也能启动
    fn apply_defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        builder
            .set_default("app.system_name", "Survey Insight")?
            .set_default("app.environment", "development")?
            .set_default("app.log_level", "info")?
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.unix_socket_path", "")?
            .set_default("server.workers", 0)?
            .set_default("server.max_workers", 16)?
            .set_default("server.timeouts.client_request", 60_000)?
            .set_default("server.timeouts.client_disconnect", 5_000)?
            .set_default("server.timeouts.keep_alive", 30)?
            .set_default("server.limits.max_payload_size", 20 * 1024 * 1024)?
            .set_default("database.url", "survey.db")?
            .set_default("database.pool_size", 8)?
            .set_default("database.timeout", 30)?
            .set_default("upload.backend", "local")?
            .set_default("upload.dir", "./var/uploads")?
            .set_default("upload.s3_bucket", "")?
            .set_default("upload.s3_prefix", "uploads")?
            .set_default("upload.max_size", 10 * 1024 * 1024)?
            .set_default("llm.provider", "mock")?
            .set_default("llm.api_base", "")?
            .set_default("llm.model", "")?
            .set_default("llm.api_key", "")?
            .set_default("llm.timeout_seconds", 15)?
            .set_default("llm.max_retries", 2)?
            .set_default("llm.retry_backoff_ms", 500)?
            .set_default("pipeline.max_concurrent_classifications", 8)?
            .set_default("pipeline.classification_timeout_seconds", 30)?
            .set_default("cache.max_capacity", 1024)?
            .set_default("cache.ttl_seconds", 600)?
            .set_default("auth.identity_header", "x-amzn-oidc-identity")?
            .set_default("auth.email_header", "x-forwarded-email")?
            .set_default("auth.development_user", "local-dev-user")?
            .set_default("cors.allowed_origins", Vec::<String>::new())?
            .set_default("cors.max_age", 3600)
    }

    /// 规范化取值
    fn normalize(&mut self) {
        let backend = self.upload.backend.trim().to_lowercase();
        self.upload.backend = if backend == "s3" { backend } else { "local".into() };
        self.llm.provider = self.llm.provider.trim().to_lowercase();
        if self.pipeline.max_concurrent_classifications == 0 {
            self.pipeline.max_concurrent_classifications = 1;
        }
        self.upload.s3_prefix = self
            .upload
            .s3_prefix
            .split('/')
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("/");
    }

    /// 获取全局配置实例
    pub fn get() -> &'static AppConfig {
        APP_CONFIG.get_or_init(|| {
            Self::load().unwrap_or_else(|e| {
                eprintln!("Failed to load configuration: {e}");
                std::process::exit(1);
            })
        })
    }

    /// 初始化配置 (在应用启动时调用)
    pub fn init() -> Result<(), ConfigError> {
        let config = Self::load()?;
        APP_CONFIG
            .set(config)
            .map_err(|_| ConfigError::Message("Configuration already initialized".to_string()))?;
        Ok(())
    }

    /// 检查是否为生产环境
    pub fn is_production(&self) -> bool {
        self.app.environment == "production"
    }

    /// 检查是否为开发环境
    pub fn is_development(&self) -> bool {
        self.app.environment == "development"
    }

    /// 获取服务器绑定地址
    pub fn server_bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// 获取 Unix 套接字路径 (如果配置了)
    #[cfg(unix)]
    pub fn unix_socket_path(&self) -> Option<&str> {
        if self.server.unix_socket_path.is_empty() {
            None
        } else {
            Some(&self.server.unix_socket_path)
        }
    }
}
