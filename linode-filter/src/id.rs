//! Deterministic identifier for a filter set
//!
//! The identifier only depends on the logical content of the filter set:
//! entries are canonicalised (values sorted and deduplicated, `match_by`
//! aliases folded, entries sorted) before hashing, so the host sees the same
//! id for the same query regardless of how it was written.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::config::FilterConfig;
use crate::error::FilterError;
use crate::model::{FilterModel, MatchBy};

/// Identifier of the empty filter set: the SHA-256 of `[]`
pub const EMPTY_FILTER_SET_ID: &str =
    "4f53cda18c2baa0c0354bb5f9a3ecbe5ed12ab4d8e11ba873c2f11161202b945";

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
struct CanonicalEntry<'a> {
    name: &'a str,
    values: Vec<&'a str>,
    match_by: MatchBy,
}

/// Hex SHA-256 digest of the canonical JSON form of `filters`
pub fn generate_id(filters: &[FilterModel]) -> Result<String, FilterError> {
    let mut canonical: Vec<CanonicalEntry<'_>> = filters
        .iter()
        .map(|filter| {
            let mut values: Vec<&str> = filter.values.iter().map(String::as_str).collect();
            values.sort_unstable();
            values.dedup();
            CanonicalEntry {
                name: &filter.name,
                values,
                match_by: filter.match_by,
            }
        })
        .collect();
    canonical.sort();
    canonical.dedup();

    let encoded = serde_json::to_vec(&canonical)?;
    Ok(hex::encode(Sha256::digest(&encoded)))
}

impl<T> FilterConfig<T> {
    pub fn generate_id(&self, filters: &[FilterModel]) -> Result<String, FilterError> {
        generate_id(filters)
    }
}
