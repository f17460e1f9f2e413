//! 按批次 ID 串行化的应用级互斥锁
//!
//! 表项随最后一个持有者释放而移除，表的大小只与正在使用的批次数相关。

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

type LockTable = DashMap<i64, Arc<Mutex<()>>>;

#[derive(Default)]
pub struct BatchLocks {
    locks: Arc<LockTable>,
}

/// 批次锁守卫，释放时清理无人等待的表项
pub struct BatchLockGuard {
    batch_id: i64,
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<LockTable>,
}

impl Drop for BatchLockGuard {
    fn drop(&mut self) {
        // 先释放互斥锁，自身持有的 Arc 才不计入引用数
        drop(self.guard.take());
        // remove_if 与 acquire 的 entry 在同一分片锁下，等待者已持有 clone
        self.locks
            .remove_if(&self.batch_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

impl BatchLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取批次锁，同一批次的持有者依次执行
    pub async fn acquire(&self, batch_id: i64) -> BatchLockGuard {
        // 不得持有 DashMap 分片锁跨越 await
        let lock = self
            .locks
            .entry(batch_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        debug!("Waiting for batch lock {}", batch_id);
        let guard = lock.lock_owned().await;
        BatchLockGuard {
            batch_id,
            guard: Some(guard),
            locks: self.locks.clone(),
        }
    }

    /// 按 ID 升序获取多个批次锁，避免与单批次持有者交叉死锁
    pub async fn acquire_many(&self, batch_ids: &[i64]) -> Vec<BatchLockGuard> {
        let mut ids = batch_ids.to_vec();
        ids.sort_unstable();
        ids.dedup();

        let mut guards = Vec::with_capacity(ids.len());
        for id in ids {
            guards.push(self.acquire(id).await);
        }
        guards
    }

    /// 当前表中的批次数
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_batch_is_serialized() {
        let locks = Arc::new(BatchLocks::new());
        let active = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let locks = locks.clone();
            let active = active.clone();
            let max_seen = max_seen.clone();
            handles.push(tokio::spawn(async move {
                let _guard = locks.acquire(7).await;
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                active.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_different_batches_do_not_block() {
        let locks = BatchLocks::new();
        let _first = locks.acquire(1).await;
        let second = tokio::time::timeout(Duration::from_millis(100), locks.acquire(2)).await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn test_entry_removed_after_release() {
        let locks = BatchLocks::new();
        for id in 0..25 {
            let _guard = locks.acquire(id).await;
            assert_eq!(locks.len(), 1);
        }
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_entry_kept_while_waiter_pending() {
        let locks = Arc::new(BatchLocks::new());
        let first = locks.acquire(3).await;

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire(3).await;
            })
        };
        // 等待者进入队列
        tokio::time::sleep(Duration::from_millis(20)).await;

        drop(first);
        // 等待者仍持有同一把锁，表项不能被移除
        assert_eq!(locks.len(), 1);
        waiter.await.unwrap();
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_acquire_many_sorts_and_dedups() {
        let locks = BatchLocks::new();
        let guards = locks.acquire_many(&[9, 2, 9, 5]).await;
        let ids: Vec<i64> = guards.iter().map(|g| g.batch_id).collect();
        assert_eq!(ids, vec![2, 5, 9]);
        assert_eq!(locks.len(), 3);
        drop(guards);
        assert!(locks.is_empty());
    }
}
