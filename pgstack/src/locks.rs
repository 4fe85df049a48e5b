use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-application serialization of provisioning and teardown runs.
///
/// Two concurrent runs for the same application would race the
/// check-then-create of the credential Secret and mint two credential sets,
/// so a run holds its application's lock from plan derivation until the last
/// resource is applied. Runs for different applications proceed in
/// parallel.
#[derive(Debug, Default)]
pub struct AppLocks {
    inner: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl AppLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the lock for `app_name`, waiting while another run holds it.
    pub async fn acquire(&self, app_name: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut inner = self.inner.lock().await;
            inner
                .entry(app_name.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn runs_for_the_same_app_serialize() {
        let locks = Arc::new(AppLocks::new());

        let guard = locks.acquire("orders").await;
        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                locks.acquire("orders").await;
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn runs_for_different_apps_proceed_in_parallel() {
        let locks = AppLocks::new();
        let _orders = locks.acquire("orders").await;
        let _billing = locks.acquire("billing").await;
    }
}
