use async_trait::async_trait;
use baitech_core::models::SequenceScope;
use baitech_core::AppError;
use std::collections::HashMap;
use std::sync::Mutex;

use super::sequence::SequenceStore;

/// Process-local sequence store.
///
/// Atomic within one process; values are lost on restart.
#[derive(Debug, Default)]
pub struct InMemorySequenceStore {
    values: Mutex<HashMap<String, i64>>,
}

impl InMemorySequenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start `scope` so that the next reserved value is `value + 1`.
    pub fn seed(&self, scope: &SequenceScope, value: i64) {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.insert(scope.key(), value);
    }
}

#[async_trait]
impl SequenceStore for InMemorySequenceStore {
    async fn next_value(&self, scope: &SequenceScope) -> Result<i64, AppError> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        let value = values.entry(scope.key()).or_insert(0);
        *value += 1;
        Ok(*value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use baitech_core::models::IdentifierKind;
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    #[tokio::test]
    async fn test_values_start_at_one_per_scope() {
        let store = InMemorySequenceStore::new();
        let monday = SequenceScope::for_kind(IdentifierKind::Order, day(9));
        let tuesday = SequenceScope::for_kind(IdentifierKind::Order, day(10));

        assert_eq!(store.next_value(&monday).await.unwrap(), 1);
        assert_eq!(store.next_value(&monday).await.unwrap(), 2);
        assert_eq!(store.next_value(&tuesday).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_kinds_do_not_share_sequences() {
        let store = InMemorySequenceStore::new();
        let orders = SequenceScope::for_kind(IdentifierKind::Order, day(9));
        let requests = SequenceScope::for_kind(IdentifierKind::ServiceRequest, day(9));

        store.next_value(&orders).await.unwrap();
        assert_eq!(store.next_value(&requests).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_seed_continues_existing_sequence() {
        let store = InMemorySequenceStore::new();
        let products = SequenceScope::for_kind(IdentifierKind::Product, day(9));
        store.seed(&products, 41);
        assert_eq!(store.next_value(&products).await.unwrap(), 42);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_reservations_are_unique() {
        let store = Arc::new(InMemorySequenceStore::new());
        let scope = SequenceScope::for_kind(IdentifierKind::Order, day(9));

        let handles: Vec<_> = (0..100)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.next_value(&scope).await.unwrap() })
            })
            .collect();

        let mut values: Vec<i64> = futures::future::join_all(handles)
            .await
            .into_iter()
            .map(|r| r.unwrap())
            .collect();
        values.sort_unstable();

        assert_eq!(values, (1..=100).collect::<Vec<_>>());
    }
}
