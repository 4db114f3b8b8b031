//! Latest selector - Collapse a result list to its newest element
//!
//! Timestamps are compared as instants; versions are compared
//! component-wise as integers with any pre-release or build suffix removed.
//! On ties the first element encountered wins.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use log::warn;

use crate::error::FilterError;
use crate::field::{Accessor, FieldValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatestKind {
    /// RFC 3339, or the vendor's zone-less `YYYY-MM-DDTHH:MM:SS` (UTC)
    Timestamp,
    /// Dotted version such as `8.0.26` or `14.6-beta`
    Version,
}

/// Field used to pick the latest element
pub struct LatestKey<T> {
    pub field: &'static str,
    pub kind: LatestKind,
    pub accessor: Accessor<T>,
}

impl<T> Clone for LatestKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for LatestKey<T> {}

impl<T> fmt::Debug for LatestKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LatestKey")
            .field("field", &self.field)
            .field("kind", &self.kind)
            .finish()
    }
}

impl<T> LatestKey<T> {
    pub fn timestamp(field: &'static str, accessor: Accessor<T>) -> Self {
        Self {
            field,
            kind: LatestKind::Timestamp,
            accessor,
        }
    }

    pub fn version(field: &'static str, accessor: Accessor<T>) -> Self {
        Self {
            field,
            kind: LatestKind::Version,
            accessor,
        }
    }
}

/// Parse a vendor timestamp into UTC
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, FilterError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| FilterError::LatestSelection(format!("invalid timestamp '{}': {}", s, e)))
}

/// Dotted numeric version. Missing trailing components compare as zero.
#[derive(Debug, Clone)]
pub struct Version(Vec<u64>);

impl FromStr for Version {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || FilterError::LatestSelection(format!("invalid version '{}'", s));

        let trimmed = s.strip_prefix('v').unwrap_or(s);
        let core = trimmed
            .split(['-', '+'])
            .next()
            .filter(|c| !c.is_empty())
            .ok_or_else(invalid)?;

        let components = core
            .split('.')
            .map(|part| part.parse::<u64>().map_err(|_| invalid()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Version(components))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.0.len().max(other.0.len());
        for i in 0..len {
            let a = self.0.get(i).copied().unwrap_or(0);
            let b = other.0.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(u64::to_string).collect();
        write!(f, "{}", parts.join("."))
    }
}

/// Index of the first maximal element. Elements whose key is `None` are
/// skipped.
fn first_max<T, K: Ord>(
    items: &[T],
    mut key: impl FnMut(&T) -> Result<Option<K>, FilterError>,
) -> Result<Option<usize>, FilterError> {
    let mut best: Option<(usize, K)> = None;
    for (index, item) in items.iter().enumerate() {
        let Some(k) = key(item)? else {
            continue;
        };
        let replace = match &best {
            Some((_, current)) => k > *current,
            None => true,
        };
        if replace {
            best = Some((index, k));
        }
    }
    Ok(best.map(|(index, _)| index))
}

fn key_string<T>(key: &LatestKey<T>, item: &T) -> Result<Option<String>, FilterError> {
    match (key.accessor)(item) {
        FieldValue::Null => {
            warn!("Skipping element with null '{}' during latest selection", key.field);
            Ok(None)
        }
        FieldValue::String(s) => Ok(Some(s)),
        other => Err(FilterError::LatestSelection(format!(
            "field '{}' is not a string: {:?}",
            key.field, other
        ))),
    }
}

/// Return the latest element, or `None` for an empty list
pub fn select_latest<T>(items: Vec<T>, key: &LatestKey<T>) -> Result<Option<T>, FilterError> {
    let index = match key.kind {
        LatestKind::Timestamp => first_max(&items, |item| {
            key_string(key, item)?.map(|s| parse_timestamp(&s)).transpose()
        })?,
        LatestKind::Version => first_max(&items, |item| {
            key_string(key, item)?.map(|s| s.parse::<Version>()).transpose()
        })?,
    };
    Ok(index.and_then(|i| items.into_iter().nth(i)))
}
