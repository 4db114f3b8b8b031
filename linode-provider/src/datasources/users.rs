//! linode_users - Account users

use linode_core::provider::BoxFuture;
use linode_core::resource::Value;
use linode_core::schema::{AttributeType, BlockSchema};
use linode_filter::{FieldValue, FilterConfig, FilterType, ListResult};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use super::{object, results_block, string_list};
use crate::client::{SharedApi, list_entities};
use crate::datasource::FilteredDataSource;

const ENDPOINT: &str = "account/users";

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub restricted: bool,
    #[serde(default)]
    pub ssh_keys: Vec<String>,
    #[serde(default)]
    pub tfa_enabled: bool,
    #[serde(default)]
    pub user_type: String,
    #[serde(default)]
    pub password_created: Option<String>,
    #[serde(default)]
    pub verified_phone_number: Option<String>,
}

pub fn filter_config() -> FilterConfig<User> {
    FilterConfig::<User>::new()
        .api("username", FilterType::String, |u| FieldValue::from(&u.username))
        .api("email", FilterType::String, |u| FieldValue::from(&u.email))
        .api("restricted", FilterType::Bool, |u| FieldValue::from(u.restricted))
        .local("ssh_keys", FilterType::String, |u| FieldValue::list(&u.ssh_keys))
        .local("tfa_enabled", FilterType::Bool, |u| FieldValue::from(u.tfa_enabled))
        .local("user_type", FilterType::String, |u| FieldValue::from(&u.user_type))
        .local("password_created", FilterType::String, |u| {
            FieldValue::from(u.password_created.as_ref())
        })
        .local("verified_phone_number", FilterType::String, |u| {
            FieldValue::from(u.verified_phone_number.as_ref())
        })
}

fn list<'a>(
    cancel: &'a CancellationToken,
    api: &'a SharedApi,
    filter: &'a str,
) -> BoxFuture<'a, ListResult<User>> {
    Box::pin(list_entities(api, ENDPOINT, filter, cancel))
}

fn flatten(user: &User) -> Value {
    object([
        ("username", Value::from(&user.username)),
        ("email", Value::from(&user.email)),
        ("restricted", Value::from(user.restricted)),
        ("ssh_keys", Value::from(user.ssh_keys.clone())),
        ("tfa_enabled", Value::from(user.tfa_enabled)),
        ("user_type", Value::from(&user.user_type)),
        ("password_created", Value::from(user.password_created.as_ref())),
        ("verified_phone_number", Value::from(user.verified_phone_number.as_ref())),
    ])
}

fn results() -> BlockSchema {
    results_block(
        "users",
        vec![
            ("username", AttributeType::String),
            ("email", AttributeType::String),
            ("restricted", AttributeType::Bool),
            ("ssh_keys", string_list()),
            ("tfa_enabled", AttributeType::Bool),
            ("user_type", AttributeType::String),
            ("password_created", AttributeType::String),
            ("verified_phone_number", AttributeType::String),
        ],
    )
}

pub fn data_source(api: SharedApi) -> FilteredDataSource<User> {
    FilteredDataSource::new("linode_users", api, filter_config(), list, flatten, results())
        .with_description("Lists the users on the account.")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::datasources::testing::{api, filter, query, read, sent_filter, strings};

    fn users() -> Vec<serde_json::Value> {
        vec![
            json!({
                "username": "admin", "email": "admin@example.com", "restricted": false,
                "tfa_enabled": true, "user_type": "default", "ssh_keys": ["laptop"]
            }),
            json!({
                "username": "ci-bot", "email": "ci@example.com", "restricted": true,
                "tfa_enabled": false, "user_type": "default"
            }),
            json!({
                "username": "ops", "email": "ops@example.org", "restricted": true,
                "tfa_enabled": true, "user_type": "proxy", "ssh_keys": ["desktop", "laptop"]
            }),
        ]
    }

    #[tokio::test]
    async fn restricted_users_with_a_laptop_key() {
        let memory = api(ENDPOINT, users());
        let ds = data_source(memory.clone());
        let config = query(vec![
            filter("restricted", &["true"], None),
            filter("ssh_keys", &["laptop"], None),
        ]);

        let state = read(&ds, &config).await.unwrap();

        assert_eq!(
            sent_filter(&memory),
            r#"{"+and":[{"+or":[{"restricted":"true"}]}],"+order":"desc"}"#
        );
        assert_eq!(strings(&state, "users", "username"), vec!["ops"]);
    }

    #[tokio::test]
    async fn email_domain_by_substring() {
        let ds = data_source(api(ENDPOINT, users()));
        let state = read(&ds, &query(vec![filter("email", &["@example.com"], Some("substring"))]))
            .await
            .unwrap();
        assert_eq!(strings(&state, "users", "username"), vec!["admin", "ci-bot"]);
    }

    #[tokio::test]
    async fn unknown_match_by_is_rejected() {
        let memory = api(ENDPOINT, users());
        let ds = data_source(memory.clone());
        let diags = read(&ds, &query(vec![filter("email", &["x"], Some("glob"))]))
            .await
            .unwrap_err();
        assert!(diags.to_string().contains("\"glob\" is not a valid match_by"));
        assert!(memory.requests().is_empty());
    }
}
