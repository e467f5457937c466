use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use crate::constants::IDENTIFIER_DATE_FORMAT;

/// Entity kinds that receive human-readable sequential identifiers.
///
/// Orders and service requests are numbered per calendar day and carry the
/// date as a suffix (`ORD-007-16-10-26`); products and services use a single
/// global sequence (`PROD0042`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierKind {
    Order,
    ServiceRequest,
    Product,
    Service,
}

impl IdentifierKind {
    pub fn prefix(self) -> &'static str {
        match self {
            IdentifierKind::Order => "ORD",
            IdentifierKind::ServiceRequest => "SRC",
            IdentifierKind::Product => "PROD",
            IdentifierKind::Service => "SRV",
        }
    }

    /// Minimum number of digits of the sequence part.
    pub fn pad_width(self) -> usize {
        match self {
            IdentifierKind::Order | IdentifierKind::ServiceRequest => 3,
            IdentifierKind::Product | IdentifierKind::Service => 4,
        }
    }

    pub fn is_day_scoped(self) -> bool {
        matches!(self, IdentifierKind::Order | IdentifierKind::ServiceRequest)
    }

    fn as_str(self) -> &'static str {
        match self {
            IdentifierKind::Order => "order",
            IdentifierKind::ServiceRequest => "service_request",
            IdentifierKind::Product => "product",
            IdentifierKind::Service => "service",
        }
    }

    /// Render an identifier for the given sequence value.
    ///
    /// `day` is ignored for globally scoped kinds.
    pub fn format(self, sequence: i64, day: NaiveDate) -> String {
        let width = self.pad_width();
        if self.is_day_scoped() {
            format!(
                "{}-{:0width$}-{}",
                self.prefix(),
                sequence,
                day.format(IDENTIFIER_DATE_FORMAT),
                width = width
            )
        } else {
            format!("{}{:0width$}", self.prefix(), sequence, width = width)
        }
    }
}

impl Display for IdentifierKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdentifierKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "order" => Ok(IdentifierKind::Order),
            "service_request" => Ok(IdentifierKind::ServiceRequest),
            "product" => Ok(IdentifierKind::Product),
            "service" => Ok(IdentifierKind::Service),
            _ => Err(anyhow::anyhow!("Invalid identifier kind: {}", s)),
        }
    }
}

/// The range a sequence counts within: one calendar day for day-scoped kinds,
/// forever for the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SequenceScope {
    pub kind: IdentifierKind,
    pub day: Option<NaiveDate>,
}

impl SequenceScope {
    pub fn for_kind(kind: IdentifierKind, today: NaiveDate) -> Self {
        Self {
            kind,
            day: kind.is_day_scoped().then_some(today),
        }
    }

    /// Stable key used as the primary key of the sequence row.
    pub fn key(&self) -> String {
        match self.day {
            Some(day) => format!("{}:{}", self.kind, day.format("%Y-%m-%d")),
            None => self.kind.to_string(),
        }
    }
}
