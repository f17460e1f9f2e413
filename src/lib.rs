//! Survey Insight - 讲义问卷分析后端服务
//!
//! 接收讲义结束后的问卷 CSV，写入回答与评论，调用 LLM 为自由记述分类，
//! 并重新计算各属性组的评分汇总、分数分布与评论标签统计。
//!
//! # 架构
//! - `blob`: 源文件存储（本地目录 / S3）
//! - `cache`: 讲义查找缓存（Moka）
//! - `config`: 配置管理
//! - `entity`: SeaORM 数据库实体
//! - `errors`: 统一错误处理
//! - `llm`: 评论分类客户端
//! - `middlewares`: 请求身份中间件
//! - `models`: 数据模型定义
//! - `pipeline`: 上传处理流水线
//! - `routes`: API 路由层
//! - `runtime`: 运行时生命周期管理
//! - `services`: 业务逻辑层
//! - `storage`: 数据存储层（SeaORM）
//! - `utils`: 工具函数

pub mod blob;
pub mod cache;
pub mod config;
pub mod entity;
pub mod errors;
pub mod llm;
pub mod middlewares;
pub mod models;
pub mod pipeline;
pub mod routes;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod utils;
