use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// Per-ferry exclusion scopes. Everything that reads a ferry's assigned count
/// and then writes based on it holds that ferry's guard for the whole span.
#[derive(Default)]
pub struct FerryLocks {
    scopes: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl FerryLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, ferry_id: Uuid) -> OwnedMutexGuard<()> {
        let scope = {
            let mut scopes = self.scopes.lock().await;
            Arc::clone(
                scopes
                    .entry(ferry_id)
                    .or_insert_with(|| Arc::new(Mutex::new(()))),
            )
        };
        scope.lock_owned().await
    }

    /// Drops the scope of a deleted ferry. Holders of an existing guard are
    /// unaffected.
    pub async fn forget(&self, ferry_id: Uuid) {
        self.scopes.lock().await.remove(&ferry_id);
    }

    /// Drops the scope of `ferry_id` unless some task still holds or awaits it.
    /// The caller must have released its own guard first.
    pub async fn release_idle(&self, ferry_id: Uuid) {
        let mut scopes = self.scopes.lock().await;
        if scopes
            .get(&ferry_id)
            .is_some_and(|scope| Arc::strong_count(scope) == 1)
        {
            scopes.remove(&ferry_id);
        }
    }

    pub async fn tracked(&self) -> usize {
        self.scopes.lock().await.len()
    }
}
