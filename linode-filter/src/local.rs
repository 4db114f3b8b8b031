//! Local filter - Client-side evaluation of the remaining predicates
//!
//! Entries that cannot be pushed to the vendor (substring and regex
//! matches, or fields the API does not filter on) are evaluated here
//! against the decoded entities. Input order is preserved and no sort is
//! performed.

use regex::Regex;
use tokio_util::sync::CancellationToken;

use crate::config::{FilterConfig, unknown_field_message};
use crate::error::FilterError;
use crate::field::{Accessor, FieldValue};
use crate::model::{FilterModel, MatchBy};

enum Matcher<'a> {
    Exact(&'a [String]),
    Substring(&'a [String]),
    Regex(Vec<Regex>),
}

impl Matcher<'_> {
    fn matches(&self, candidate: &str) -> bool {
        match self {
            Matcher::Exact(values) => values.iter().any(|v| v == candidate),
            Matcher::Substring(values) => values.iter().any(|v| candidate.contains(v.as_str())),
            Matcher::Regex(patterns) => patterns.iter().any(|re| re.is_match(candidate)),
        }
    }
}

struct LocalPredicate<'a, T> {
    accessor: Accessor<T>,
    matcher: Matcher<'a>,
}

impl<T> LocalPredicate<'_, T> {
    fn matches(&self, entity: &T) -> bool {
        let value: FieldValue = (self.accessor)(entity);
        value.any_scalar(&mut |candidate| self.matcher.matches(candidate))
    }
}

impl<T> FilterConfig<T> {
    /// Entries evaluated client-side
    pub fn local_filters<'a>(&self, filters: &'a [FilterModel]) -> Vec<&'a FilterModel> {
        filters.iter().filter(|f| !self.is_api_entry(f)).collect()
    }

    /// Resolve accessors and compile regexes once per read
    fn compile_local<'a>(
        &self,
        filters: &'a [FilterModel],
    ) -> Result<Vec<LocalPredicate<'a, T>>, FilterError> {
        let mut predicates = Vec::new();
        for filter in self.local_filters(filters) {
            let attribute = self.get(&filter.name).ok_or_else(|| {
                FilterError::configuration(unknown_field_message(&filter.name, &self.names()))
            })?;
            let matcher = match filter.match_by {
                MatchBy::Exact => Matcher::Exact(&filter.values),
                MatchBy::Substring => Matcher::Substring(&filter.values),
                MatchBy::Regex => Matcher::Regex(
                    filter
                        .values
                        .iter()
                        .map(|pattern| {
                            Regex::new(pattern).map_err(|source| FilterError::Regex {
                                pattern: pattern.clone(),
                                source,
                            })
                        })
                        .collect::<Result<_, _>>()?,
                ),
            };
            predicates.push(LocalPredicate {
                accessor: attribute.accessor,
                matcher,
            });
        }
        Ok(predicates)
    }

    /// Keep the entities that satisfy every local entry, in input order.
    ///
    /// Entities are dropped on the first failing entry. Cancellation is
    /// checked before each entity.
    pub fn apply_local_filtering(
        &self,
        filters: &[FilterModel],
        data: Vec<T>,
        cancel: &CancellationToken,
    ) -> Result<Vec<T>, FilterError> {
        let predicates = self.compile_local(filters)?;
        if predicates.is_empty() {
            return Ok(data);
        }

        let mut kept = Vec::with_capacity(data.len());
        for entity in data {
            if cancel.is_cancelled() {
                return Err(FilterError::Cancelled);
            }
            if predicates.iter().all(|p| p.matches(&entity)) {
                kept.push(entity);
            }
        }
        Ok(kept)
    }
}
