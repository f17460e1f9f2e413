use moka::future::Cache;
use std::time::Duration;
use tracing::debug;

use crate::config::AppConfig;
use crate::models::lectures::entities::{Lecture, LectureKey};

/// 按自然键缓存讲义
#[derive(Clone)]
pub struct LectureCache {
    inner: Cache<LectureKey, Lecture>,
}

impl Default for LectureCache {
    fn default() -> Self {
        Self::from_config()
    }
}

impl LectureCache {
    pub fn new(max_capacity: u64, ttl_seconds: u64) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(Duration::from_secs(ttl_seconds))
            .support_invalidation_closures()
            .build();

        debug!(
            "LectureCache initialized with max capacity: {}, ttl: {}s",
            max_capacity, ttl_seconds
        );
        Self { inner }
    }

    pub fn from_config() -> Self {
        let config = AppConfig::get();
        Self::new(config.cache.max_capacity, config.cache.ttl_seconds)
    }

    pub async fn get(&self, key: &LectureKey) -> Option<Lecture> {
        let hit = self.inner.get(key).await;
        if hit.is_some() {
            debug!("Lecture cache hit: {}", key.course_name);
        }
        hit
    }

    pub async fn insert(&self, lecture: Lecture) {
        self.inner.insert(lecture.key(), lecture).await;
    }

    pub async fn invalidate(&self, lecture: &Lecture) {
        self.inner.invalidate(&lecture.key()).await;
    }

    /// 按 ID 失效（删除时只知道 ID）
    pub async fn invalidate_id(&self, lecture_id: i64) {
        if let Err(e) = self
            .inner
            .invalidate_entries_if(move |_, lecture| lecture.id == lecture_id)
        {
            debug!("Lecture cache predicate invalidation unavailable: {}", e);
            self.inner.invalidate_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn lecture(id: i64) -> Lecture {
        Lecture {
            id,
            course_name: "データサイエンス概論".to_string(),
            academic_year: 2024,
            term: "前期".to_string(),
            session: format!("第{id}回"),
            lecture_on: NaiveDate::from_ymd_opt(2024, 5, 10).unwrap(),
            instructor_name: "TBD".to_string(),
            description: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_get_invalidate() {
        let cache = LectureCache::new(100, 60);
        let first = lecture(1);
        let key = first.key();

        assert!(cache.get(&key).await.is_none());
        cache.insert(first.clone()).await;
        assert_eq!(cache.get(&key).await.map(|l| l.id), Some(1));

        cache.invalidate(&first).await;
        assert!(cache.get(&key).await.is_none());
    }
}
