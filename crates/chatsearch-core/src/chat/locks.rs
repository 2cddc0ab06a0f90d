//! Per-session turn locks.
//!
//! `TurnLocks` hands out one async mutex per (user_id, chat_id). Holding it
//! for a whole question/answer turn keeps concurrent turns on the same chat
//! from interleaving their appends, while turns on different chats never
//! contend. The `DashMap` guard is released before awaiting the mutex.
//!
//! Entries are dropped as soon as nobody holds or waits on them, including
//! when a turn future is cancelled mid-flight.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use chatsearch_types::chat::SessionKey;

#[derive(Debug, Default, Clone)]
pub struct TurnLocks {
    inner: Arc<DashMap<SessionKey, Arc<Mutex<()>>>>,
}

impl TurnLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to one session.
    ///
    /// The returned guard releases the session when dropped, whether the turn
    /// finished or was cancelled.
    pub async fn acquire(&self, key: &SessionKey) -> TurnGuard {
        let lock = self
            .inner
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone();

        // A cancelled wait drops `pending` (and its Arc) before `turn`.
        let mut turn = TurnGuard {
            guard: None,
            locks: self.clone(),
            key: key.clone(),
        };
        let pending = lock.lock_owned();
        turn.guard = Some(pending.await);
        turn
    }

    /// Drop the lock entry for a session nobody is holding or waiting on.
    fn release_idle(&self, key: &SessionKey) {
        self.inner
            .remove_if(key, |_, lock| Arc::strong_count(lock) == 1);
    }

    /// Number of sessions with a lock entry.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Exclusive hold on one session's turn lock.
pub struct TurnGuard {
    guard: Option<OwnedMutexGuard<()>>,
    locks: TurnLocks,
    key: SessionKey,
}

impl Drop for TurnGuard {
    fn drop(&mut self) {
        // Unlock first so the entry's only remaining owner is the map.
        self.guard.take();
        self.locks.release_idle(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_session_is_exclusive() {
        let locks = TurnLocks::new();
        let key = SessionKey::new("u1", "c1");

        let guard = locks.acquire(&key).await;
        let locks2 = locks.clone();
        let key2 = key.clone();
        let waiter = tokio::spawn(async move {
            let _g = locks2.acquire(&key2).await;
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn different_sessions_do_not_contend() {
        let locks = TurnLocks::new();
        let _a = locks.acquire(&SessionKey::new("u1", "c1")).await;
        let b = tokio::time::timeout(
            Duration::from_millis(100),
            locks.acquire(&SessionKey::new("u1", "c2")),
        )
        .await;
        assert!(b.is_ok());
        assert_eq!(locks.len(), 2);
    }

    #[tokio::test]
    async fn entry_lives_while_held() {
        let locks = TurnLocks::new();
        let key = SessionKey::new("u1", "c1");

        let guard = locks.acquire(&key).await;
        assert_eq!(locks.len(), 1);

        drop(guard);
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn waiter_keeps_entry_until_it_finishes() {
        let locks = TurnLocks::new();
        let key = SessionKey::new("u1", "c1");

        let first = locks.acquire(&key).await;
        let locks2 = locks.clone();
        let key2 = key.clone();
        let waiter = tokio::spawn(async move {
            let _g = locks2.acquire(&key2).await;
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        drop(first);
        assert_eq!(locks.len(), 1, "the waiting turn still needs the entry");

        waiter.await.unwrap();
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn cancelled_holder_releases_entry() {
        let locks = TurnLocks::new();

        for i in 0..20 {
            let key = SessionKey::new("u1", format!("c{i}"));
            let turn = async {
                let _guard = locks.acquire(&key).await;
                tokio::time::sleep(Duration::from_secs(60)).await;
            };
            assert!(tokio::time::timeout(Duration::from_millis(1), turn).await.is_err());
        }

        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn cancelled_waiter_releases_entry() {
        let locks = TurnLocks::new();
        let key = SessionKey::new("u1", "c1");

        let held = locks.acquire(&key).await;
        let waited = tokio::time::timeout(Duration::from_millis(10), locks.acquire(&key)).await;
        assert!(waited.is_err());
        assert_eq!(locks.len(), 1);

        drop(held);
        assert!(locks.is_empty());
    }
}
