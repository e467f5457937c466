//! Sequential identifier generation
//!
//! Identifiers combine a prefix, a zero-padded sequence value and, for orders
//! and service requests, the current date (`ORD-004-16-10-26`). The date comes
//! from an injectable [`Clock`] in a configured time zone; the sequence value
//! comes from a [`SequenceStore`].

use baitech_core::models::{IdentifierKind, SequenceScope};
use baitech_core::AppError;
use baitech_db::SequenceStore;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at a fixed instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

pub struct IdentifierGenerator<S, C = SystemClock> {
    store: S,
    clock: C,
    timezone: Tz,
}

impl<S: SequenceStore> IdentifierGenerator<S, SystemClock> {
    pub fn new(store: S, timezone: Tz) -> Self {
        Self::with_clock(store, SystemClock, timezone)
    }
}

impl<S: SequenceStore, C: Clock> IdentifierGenerator<S, C> {
    pub fn with_clock(store: S, clock: C, timezone: Tz) -> Self {
        Self {
            store,
            clock,
            timezone,
        }
    }

    /// Calendar date in the configured time zone.
    pub fn today(&self) -> NaiveDate {
        self.clock.now().with_timezone(&self.timezone).date_naive()
    }

    /// Reserve the next value for `kind` and render the identifier.
    pub async fn generate(&self, kind: IdentifierKind) -> Result<String, AppError> {
        let today = self.today();
        let scope = SequenceScope::for_kind(kind, today);
        let sequence = self.store.next_value(&scope).await?;
        let id = kind.format(sequence, today);

        tracing::debug!(kind = %kind, scope = %scope.key(), id = %id, "Generated identifier");
        Ok(id)
    }

    /// `ORD-{seq:03}-{DD-MM-YY}`
    pub async fn generate_order_number(&self) -> Result<String, AppError> {
        self.generate(IdentifierKind::Order).await
    }

    /// `SRC-{seq:03}-{DD-MM-YY}`
    pub async fn generate_service_request_id(&self) -> Result<String, AppError> {
        self.generate(IdentifierKind::ServiceRequest).await
    }

    /// `PROD{seq:04}`
    pub async fn generate_product_id(&self) -> Result<String, AppError> {
        self.generate(IdentifierKind::Product).await
    }

    /// `SRV{seq:04}`
    pub async fn generate_service_id(&self) -> Result<String, AppError> {
        self.generate(IdentifierKind::Service).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use baitech_db::InMemorySequenceStore;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap())
    }

    #[tokio::test]
    async fn test_sequential_orders_differ_by_one() {
        let generator = IdentifierGenerator::with_clock(
            InMemorySequenceStore::new(),
            at(2025, 6, 13, 9, 30),
            Tz::UTC,
        );

        assert_eq!(
            generator.generate_order_number().await.unwrap(),
            "ORD-001-13-06-25"
        );
        assert_eq!(
            generator.generate_order_number().await.unwrap(),
            "ORD-002-13-06-25"
        );
        assert_eq!(
            generator.generate_service_request_id().await.unwrap(),
            "SRC-001-13-06-25"
        );
    }

    #[tokio::test]
    async fn test_global_ids() {
        let generator = IdentifierGenerator::with_clock(
            InMemorySequenceStore::new(),
            at(2025, 6, 13, 9, 30),
            Tz::UTC,
        );

        assert_eq!(generator.generate_product_id().await.unwrap(), "PROD0001");
        assert_eq!(generator.generate_product_id().await.unwrap(), "PROD0002");
        assert_eq!(generator.generate_service_id().await.unwrap(), "SRV0001");
    }

    #[tokio::test]
    async fn test_day_rollover_resets_sequence() {
        let store = std::sync::Arc::new(InMemorySequenceStore::new());

        let evening = IdentifierGenerator::with_clock(store.clone(), at(2025, 6, 13, 23, 59), Tz::UTC);
        evening.generate_order_number().await.unwrap();
        assert_eq!(
            evening.generate_order_number().await.unwrap(),
            "ORD-002-13-06-25"
        );

        let morning = IdentifierGenerator::with_clock(store, at(2025, 6, 14, 0, 1), Tz::UTC);
        assert_eq!(
            morning.generate_order_number().await.unwrap(),
            "ORD-001-14-06-25"
        );
    }

    #[tokio::test]
    async fn test_timezone_decides_the_date() {
        // 22:30 UTC is already the next day in Nairobi (UTC+3).
        let generator = IdentifierGenerator::with_clock(
            InMemorySequenceStore::new(),
            at(2025, 6, 13, 22, 30),
            chrono_tz::Africa::Nairobi,
        );

        assert_eq!(
            generator.generate_order_number().await.unwrap(),
            "ORD-001-14-06-25"
        );
    }

    struct FailingStore;

    #[async_trait]
    impl SequenceStore for FailingStore {
        async fn next_value(&self, _scope: &SequenceScope) -> Result<i64, AppError> {
            Err(AppError::Database(baitech_db::sqlx::Error::PoolTimedOut))
        }
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let generator =
            IdentifierGenerator::with_clock(FailingStore, at(2025, 6, 13, 9, 0), Tz::UTC);
        let err = generator.generate_order_number().await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }
}
