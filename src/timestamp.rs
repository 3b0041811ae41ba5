//! Stored timestamps and identifiers.
//!
//! Timestamps are UTC wall-clock times written as `UTC:` followed by an
//! ISO-8601 date-time without zone suffix, e.g.
//! `UTC:2050-12-01T14:45:55.000123`. Reading accepts the fractional seconds
//! being absent.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDateTime, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

const PREFIX: &str = "UTC:";
const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(NaiveDateTime);

impl Timestamp {
    pub fn now() -> Self {
        Timestamp::from_naive(Utc::now().naive_utc())
    }

    /// Stored precision is microseconds; anything finer is dropped.
    pub fn from_naive(datetime: NaiveDateTime) -> Self {
        Timestamp(datetime.trunc_subsecs(6))
    }

    pub fn as_naive(&self) -> NaiveDateTime {
        self.0
    }

    /// Parse the stored `UTC:` form.
    pub fn parse(text: &str) -> Result<Self, TimestampError> {
        let body = text
            .strip_prefix(PREFIX)
            .ok_or_else(|| TimestampError(format!("missing `{}` prefix in {:?}", PREFIX, text)))?;
        body.parse::<NaiveDateTime>()
            .map(Timestamp::from_naive)
            .map_err(|e| TimestampError(format!("{:?}: {}", text, e)))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", PREFIX, self.0.format(FORMAT))
    }
}

impl FromStr for Timestamp {
    type Err = TimestampError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Timestamp::parse(s)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Timestamp::parse(&text).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampError(String);

impl fmt::Display for TimestampError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid timestamp {}", self.0)
    }
}

impl std::error::Error for TimestampError {}

/// A fresh random record id: a v4 UUID as 32 lowercase hex characters.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
