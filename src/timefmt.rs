//! Timestamp normalization.
//!
//! The two export vintages encode time differently: markup-era documents
//! carry a free-text form like `13 Mar 2024, 18:29:58 GMT+01:00`, while
//! structured-era documents carry ISO-8601 (`2024-03-13T17:29:58Z`, or with
//! an explicit offset). Both normalize to a single canonical textual form so
//! that identity keys and display ordering never depend on which vintage a
//! record came from. The offset the source wrote is preserved, never
//! collapsed to a bare local time.

use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use regex::Regex;
use serde::{Serialize, Serializer};

use crate::error::{ExtractError, Result};

/// Canonical render format: zero-padded day, three-letter month, 24h clock,
/// colon-separated offset (`%:z` yields `+00:00`).
const CANONICAL_FORMAT: &str = "%d %b %Y, %H:%M:%S GMT%:z";

fn canonical_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(\d{1,2}) ([A-Z][a-z]{2}) (\d{4}), (\d{2}):(\d{2}):(\d{2}) GMT([+-]\d{2}):(\d{2})$",
        )
        .expect("canonical timestamp pattern")
    })
}

/// An instant plus the UTC offset it was written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanonicalTimestamp(DateTime<FixedOffset>);

impl CanonicalTimestamp {
    /// Parses either the canonical textual form or an ISO-8601 string.
    ///
    /// ISO-8601 input without an offset is assumed to be UTC. Anything else
    /// is a [`ExtractError::DateParse`]; callers skip the owning record
    /// rather than aborting the run.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();

        if canonical_re().is_match(raw) {
            let dt = DateTime::parse_from_str(raw, CANONICAL_FORMAT)
                .map_err(|_| ExtractError::DateParse(raw.to_string()))?;
            return Ok(Self(dt));
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Ok(Self(dt));
        }

        for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
                return Ok(Self(naive.and_utc().fixed_offset()));
            }
        }

        Err(ExtractError::DateParse(raw.to_string()))
    }

    /// Keep-style microsecond epoch timestamps, rendered as UTC.
    pub fn from_epoch_micros(usec: i64) -> Result<Self> {
        DateTime::from_timestamp_micros(usec)
            .map(|dt| Self(dt.fixed_offset()))
            .ok_or_else(|| ExtractError::DateParse(format!("epoch micros {usec}")))
    }

    /// Seconds since the Unix epoch, used for explicit chronological ordering.
    pub fn epoch_seconds(&self) -> i64 {
        self.0.timestamp()
    }
}

impl fmt::Display for CanonicalTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(CANONICAL_FORMAT))
    }
}

impl Serialize for CanonicalTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}
