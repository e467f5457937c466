//! Count-then-format sequence strategy.
//!
//! The next value is "number of matching documents + 1". Two callers that
//! count before either inserts receive the same value, so identifiers can
//! collide under concurrency. Prefer an atomic [`SequenceStore`] such as
//! `PgSequenceStore`; this adapter exists for deployments whose identifiers
//! must stay consistent with documents created before the sequence table.

use async_trait::async_trait;
use baitech_core::constants::IDENTIFIER_DATE_FORMAT;
use baitech_core::models::{IdentifierKind, SequenceScope};
use baitech_core::AppError;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use regex::Regex;
use std::sync::Mutex;

use super::sequence::SequenceStore;

/// Which documents count towards a scope.
#[derive(Debug, Clone)]
pub enum CountFilter {
    /// Documents created within `[start, end]`.
    CreatedBetween {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    /// Documents whose identifier matches the pattern.
    IdPattern(Regex),
}

impl CountFilter {
    /// The filter the count-based strategy uses for `scope`.
    ///
    /// Orders count by creation time within the UTC day; service requests by
    /// the date embedded in their identifier; global kinds by prefix.
    pub fn for_scope(scope: &SequenceScope) -> Result<Self, AppError> {
        match (scope.kind, scope.day) {
            (IdentifierKind::Order, Some(day)) => Ok(Self::utc_day(day)),
            (kind, Some(day)) => {
                let pattern = format!(
                    r"^{}-\d+-{}$",
                    kind.prefix(),
                    regex::escape(&day.format(IDENTIFIER_DATE_FORMAT).to_string())
                );
                Self::pattern(&pattern)
            }
            (kind, None) => Self::pattern(&format!(r"^{}\d+$", kind.prefix())),
        }
    }

    pub fn utc_day(day: NaiveDate) -> Self {
        let start = day.and_time(NaiveTime::MIN).and_utc();
        let end = start + chrono::Duration::days(1) - chrono::Duration::microseconds(1);
        CountFilter::CreatedBetween { start, end }
    }

    fn pattern(pattern: &str) -> Result<Self, AppError> {
        Regex::new(pattern)
            .map(CountFilter::IdPattern)
            .map_err(|e| AppError::Internal(format!("Invalid identifier pattern: {}", e)))
    }

    pub fn matches(&self, id: &str, created_at: DateTime<Utc>) -> bool {
        match self {
            CountFilter::CreatedBetween { start, end } => created_at >= *start && created_at <= *end,
            CountFilter::IdPattern(re) => re.is_match(id),
        }
    }
}

/// Counts documents in the store that owns the identified entities.
#[async_trait]
pub trait DocumentCounter: Send + Sync {
    async fn count(&self, filter: &CountFilter) -> Result<u64, AppError>;
}

/// Sequence store deriving the next value from a document count.
///
/// Race-prone: the count and the caller's later insert are not atomic.
pub struct CountingSequenceStore<C> {
    counter: C,
}

impl<C: DocumentCounter> CountingSequenceStore<C> {
    pub fn new(counter: C) -> Self {
        Self { counter }
    }

    pub fn counter(&self) -> &C {
        &self.counter
    }
}

#[async_trait]
impl<C: DocumentCounter> SequenceStore for CountingSequenceStore<C> {
    async fn next_value(&self, scope: &SequenceScope) -> Result<i64, AppError> {
        let filter = CountFilter::for_scope(scope)?;
        let count = self.counter.count(&filter).await?;
        tracing::debug!(scope = %scope.key(), count, "Counted existing documents");
        i64::try_from(count + 1)
            .map_err(|_| AppError::Internal("Document count overflow".to_string()))
    }
}

/// In-memory document collection for the counting strategy.
#[derive(Debug, Default)]
pub struct InMemoryDocumentCounter {
    documents: Mutex<Vec<(String, DateTime<Utc>)>>,
}

impl InMemoryDocumentCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: impl Into<String>, created_at: DateTime<Utc>) {
        let mut documents = self.documents.lock().unwrap_or_else(|e| e.into_inner());
        documents.push((id.into(), created_at));
    }

    pub fn len(&self) -> usize {
        self.documents.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl DocumentCounter for InMemoryDocumentCounter {
    async fn count(&self, filter: &CountFilter) -> Result<u64, AppError> {
        let documents = self.documents.lock().unwrap_or_else(|e| e.into_inner());
        Ok(documents
            .iter()
            .filter(|(id, created_at)| filter.matches(id, *created_at))
            .count() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 13).unwrap()
    }

    #[test]
    fn test_utc_day_bounds() {
        let filter = CountFilter::utc_day(day());
        let inside = Utc.with_ymd_and_hms(2025, 6, 13, 23, 59, 59).unwrap();
        let before = Utc.with_ymd_and_hms(2025, 6, 12, 23, 59, 59).unwrap();
        let after = Utc.with_ymd_and_hms(2025, 6, 14, 0, 0, 0).unwrap();

        assert!(filter.matches("ORD-001-13-06-25", inside));
        assert!(!filter.matches("ORD-001-12-06-25", before));
        assert!(!filter.matches("ORD-001-14-06-25", after));
    }

    #[test]
    fn test_service_request_pattern_matches_date_suffix() {
        let scope = SequenceScope::for_kind(IdentifierKind::ServiceRequest, day());
        let filter = CountFilter::for_scope(&scope).unwrap();
        let now = Utc::now();

        assert!(filter.matches("SRC-007-13-06-25", now));
        assert!(filter.matches("SRC-1000-13-06-25", now));
        assert!(!filter.matches("SRC-007-14-06-25", now));
        assert!(!filter.matches("ORD-007-13-06-25", now));
    }

    #[test]
    fn test_global_pattern() {
        let scope = SequenceScope::for_kind(IdentifierKind::Product, day());
        let filter = CountFilter::for_scope(&scope).unwrap();
        let now = Utc::now();

        assert!(filter.matches("PROD0001", now));
        assert!(!filter.matches("SRV0001", now));
    }

    #[tokio::test]
    async fn test_next_value_is_count_plus_one() {
        let counter = InMemoryDocumentCounter::new();
        let noon = Utc.with_ymd_and_hms(2025, 6, 13, 12, 0, 0).unwrap();
        counter.insert("ORD-001-13-06-25", noon);
        counter.insert("ORD-002-13-06-25", noon);
        counter.insert("ORD-001-12-06-25", noon - chrono::Duration::days(1));

        let store = CountingSequenceStore::new(counter);
        let scope = SequenceScope::for_kind(IdentifierKind::Order, day());
        assert_eq!(store.next_value(&scope).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_count_before_insert_yields_duplicates() {
        let store = CountingSequenceStore::new(InMemoryDocumentCounter::new());
        let scope = SequenceScope::for_kind(IdentifierKind::Order, day());

        // Both callers count before either inserts its order.
        let first = store.next_value(&scope).await.unwrap();
        let second = store.next_value(&scope).await.unwrap();
        assert_eq!(first, second);

        let noon = Utc.with_ymd_and_hms(2025, 6, 13, 12, 0, 0).unwrap();
        store.counter().insert(IdentifierKind::Order.format(first, day()), noon);
        store.counter().insert(IdentifierKind::Order.format(second, day()), noon);
        assert_eq!(store.counter().len(), 2);
    }
}
