//! Driver - Orchestrates a filtered list read
//!
//! Builds the `X-Filter` query, hands it to the data source's list
//! callback, then runs the local pass over what comes back.

use linode_core::provider::BoxFuture;
use log::debug;
use tokio_util::sync::CancellationToken;

use crate::config::FilterConfig;
use crate::error::{BoxError, FilterError};
use crate::latest::{LatestKey, select_latest};
use crate::model::{FilterModel, FilterQuery, Order};

pub type ListResult<T> = Result<Vec<T>, BoxError>;

/// List callback: fetch every entity matching the `X-Filter` query
pub type ListFn<C, T> =
    for<'a> fn(&'a CancellationToken, &'a C, &'a str) -> BoxFuture<'a, ListResult<T>>;

impl<T> FilterConfig<T> {
    /// Query the vendor with the api-filterable entries, then apply the
    /// remaining entries locally. The vendor's order is preserved.
    pub async fn get_and_filter<C>(
        &self,
        cancel: &CancellationToken,
        client: &C,
        filters: &[FilterModel],
        list_fn: ListFn<C, T>,
        order: Option<Order>,
        order_by: Option<&str>,
    ) -> Result<Vec<T>, FilterError>
    where
        C: ?Sized + Sync,
    {
        self.check_query(filters, order_by)?;
        let filter = self.construct_filter_string(filters, order, order_by)?;
        debug!("Listing with X-Filter: {}", filter);

        // A list callback that observes the token fails with its own error;
        // report the cancellation instead.
        let data = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(FilterError::Cancelled),
            result = list_fn(cancel, client, &filter) => result.map_err(|e| {
                if cancel.is_cancelled() {
                    FilterError::Cancelled
                } else {
                    FilterError::List(e)
                }
            })?,
        };
        if cancel.is_cancelled() {
            return Err(FilterError::Cancelled);
        }
        debug!("List returned {} element(s) before local filtering", data.len());

        self.apply_local_filtering(filters, data, cancel)
    }

    /// Full read of a [`FilterQuery`]: list, filter locally and, when
    /// requested and a key is configured, narrow to the latest element.
    pub async fn read_query<C>(
        &self,
        cancel: &CancellationToken,
        client: &C,
        query: &FilterQuery,
        list_fn: ListFn<C, T>,
        latest: Option<&LatestKey<T>>,
    ) -> Result<Vec<T>, FilterError>
    where
        C: ?Sized + Sync,
    {
        let data = self
            .get_and_filter(
                cancel,
                client,
                &query.filters,
                list_fn,
                query.order,
                query.order_by.as_deref(),
            )
            .await?;

        match latest {
            Some(key) if query.latest => {
                Ok(select_latest(data, key)?.into_iter().collect())
            }
            _ => Ok(data),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::config::FilterType;
    use crate::field::FieldValue;
    use crate::model::MatchBy;

    #[derive(Debug, Clone, PartialEq)]
    struct Engine {
        engine: String,
        version: String,
    }

    fn engine(engine: &str, version: &str) -> Engine {
        Engine {
            engine: engine.to_string(),
            version: version.to_string(),
        }
    }

    #[derive(Default)]
    struct FakeClient {
        data: Vec<Engine>,
        calls: AtomicUsize,
        last_filter: Mutex<Option<String>>,
        fail: bool,
    }

    fn list_engines<'a>(
        _cancel: &'a CancellationToken,
        client: &'a FakeClient,
        filter: &'a str,
    ) -> BoxFuture<'a, ListResult<Engine>> {
        Box::pin(async move {
            client.calls.fetch_add(1, Ordering::SeqCst);
            *client.last_filter.lock().unwrap() = Some(filter.to_string());
            if client.fail {
                return Err("[500] internal error".into());
            }
            Ok(client.data.clone())
        })
    }

    fn list_forever<'a>(
        _cancel: &'a CancellationToken,
        _client: &'a FakeClient,
        _filter: &'a str,
    ) -> BoxFuture<'a, ListResult<Engine>> {
        Box::pin(async move {
            tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
            Ok(Vec::new())
        })
    }

    fn list_until_cancelled<'a>(
        cancel: &'a CancellationToken,
        _client: &'a FakeClient,
        _filter: &'a str,
    ) -> BoxFuture<'a, ListResult<Engine>> {
        Box::pin(async move {
            if cancel.is_cancelled() {
                return Err("Listing cancelled".into());
            }
            Ok(Vec::new())
        })
    }

    fn list_then_cancel<'a>(
        cancel: &'a CancellationToken,
        client: &'a FakeClient,
        _filter: &'a str,
    ) -> BoxFuture<'a, ListResult<Engine>> {
        Box::pin(async move {
            cancel.cancel();
            Ok(client.data.clone())
        })
    }

    fn engine_config() -> FilterConfig<Engine> {
        FilterConfig::new()
            .api("engine", FilterType::String, |e: &Engine| FieldValue::from(&e.engine))
            .api("version", FilterType::String, |e: &Engine| FieldValue::from(&e.version))
    }

    #[tokio::test]
    async fn exact_api_filter_round_trip() {
        let client = FakeClient {
            data: vec![engine("mysql", "8"), engine("postgresql", "13")],
            ..Default::default()
        };
        let filters = vec![FilterModel::new("engine", ["mysql", "postgresql"])];
        let result = engine_config()
            .get_and_filter(
                &CancellationToken::new(),
                &client,
                &filters,
                list_engines,
                Some(Order::Asc),
                Some("engine"),
            )
            .await
            .unwrap();

        assert_eq!(result, vec![engine("mysql", "8"), engine("postgresql", "13")]);
        assert_eq!(
            client.last_filter.lock().unwrap().as_deref(),
            Some(r#"{"+and":[{"+or":[{"engine":"mysql"},{"engine":"postgresql"}]}],"+order":"asc","+order_by":"engine"}"#)
        );
    }

    #[tokio::test]
    async fn unknown_filter_never_lists() {
        let client = FakeClient::default();
        let filters = vec![FilterModel::new("bogus", ["x"])];
        let err = engine_config()
            .get_and_filter(
                &CancellationToken::new(),
                &client,
                &filters,
                list_engines,
                None,
                None,
            )
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Valid filters: engine, version"));
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn local_substring_applies_after_list() {
        let client = FakeClient {
            data: vec![engine("mysql", "8.0.26"), engine("postgresql", "13.2")],
            ..Default::default()
        };
        let filters = vec![FilterModel::new("version", ["13"]).with_match_by(MatchBy::Substring)];
        let result = engine_config()
            .get_and_filter(
                &CancellationToken::new(),
                &client,
                &filters,
                list_engines,
                None,
                None,
            )
            .await
            .unwrap();

        assert_eq!(result, vec![engine("postgresql", "13.2")]);
        assert_eq!(
            client.last_filter.lock().unwrap().as_deref(),
            Some(r#"{"+and":[],"+order":"desc"}"#)
        );
    }

    #[tokio::test]
    async fn list_errors_are_wrapped() {
        let client = FakeClient {
            fail: true,
            ..Default::default()
        };
        let err = engine_config()
            .get_and_filter(&CancellationToken::new(), &client, &[], list_engines, None, None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Failed to list resources: [500] internal error");
    }

    #[tokio::test]
    async fn cancellation_interrupts_list() {
        let client = FakeClient::default();
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            trigger.cancel();
        });

        let err = engine_config()
            .get_and_filter(&cancel, &client, &[], list_forever, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, FilterError::Cancelled));
    }

    #[tokio::test]
    async fn list_error_after_cancel_is_reported_as_cancelled() {
        let client = FakeClient::default();
        let cancel = CancellationToken::new();
        cancel.cancel();

        for _ in 0..50 {
            let err = engine_config()
                .get_and_filter(&cancel, &client, &[], list_until_cancelled, None, None)
                .await
                .unwrap_err();
            assert!(matches!(err, FilterError::Cancelled), "got {:?}", err);
        }
    }

    #[tokio::test]
    async fn cancellation_after_list_discards_results() {
        let client = FakeClient {
            data: vec![engine("mysql", "8")],
            ..Default::default()
        };
        let err = engine_config()
            .get_and_filter(&CancellationToken::new(), &client, &[], list_then_cancel, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, FilterError::Cancelled));
    }

    #[tokio::test]
    async fn read_query_selects_latest_version() {
        let client = FakeClient {
            data: vec![engine("mysql", "1.2.3"), engine("mysql", "1.3.1")],
            ..Default::default()
        };
        let key = LatestKey::version("version", |e: &Engine| FieldValue::from(&e.version));
        let config = engine_config();

        let query = FilterQuery::new(vec![FilterModel::new("engine", ["mysql"])]).with_latest(true);
        let result = config
            .read_query(&CancellationToken::new(), &client, &query, list_engines, Some(&key))
            .await
            .unwrap();
        assert_eq!(result, vec![engine("mysql", "1.3.1")]);

        let query = query.with_latest(false);
        let result = config
            .read_query(&CancellationToken::new(), &client, &query, list_engines, Some(&key))
            .await
            .unwrap();
        assert_eq!(result.len(), 2);
    }
}
