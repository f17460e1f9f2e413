//! 缓存层
//!
//! 只做读优化，数据库始终是唯一的事实来源。写入路径负责失效。

mod lecture_cache;

pub use lecture_cache::LectureCache;
