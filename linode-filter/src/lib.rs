//! Linode Filter
//!
//! Generic filtered-list engine shared by every list-style data source.
//! A data source describes its filterable fields once in a
//! [`FilterConfig`]; the engine then provides the schema fragments and
//! plan-time validators, splits user filters into a server-side
//! `X-Filter` query and a local pass, derives a deterministic identifier
//! for the filter set, and optionally narrows the result to its latest
//! element.

pub mod config;
pub mod driver;
pub mod error;
pub mod field;
pub mod id;
pub mod latest;
pub mod local;
pub mod model;
pub mod query;
pub mod validate;

pub use config::{FilterAttribute, FilterConfig, FilterType};
pub use driver::{ListFn, ListResult};
pub use error::{BoxError, FilterError};
pub use field::{Accessor, FieldValue};
pub use id::generate_id;
pub use latest::{LatestKey, LatestKind, select_latest};
pub use model::{FilterModel, FilterQuery, MatchBy, Order};
