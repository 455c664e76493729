//! HTTP client for the DIA web service.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use reqwest::header::{HeaderMap, CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE};
use reqwest::redirect;
use url::Url;

use crate::nodes::{Endpoint, EndpointSet, Node};
use crate::query::{encode, Body, GetQuery, SaveRequest};
use crate::types::{ColumnDescription, Record};
use crate::{xml, Error};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Account credentials, set once at construction.
#[derive(Debug)]
struct Credentials {
    username: String,
    password: String,
    orgkey: String,
}

/// HTTP client for the DIA web service.
///
/// Every call is one blocking round trip against the connection's endpoint
/// URL set, with the credentials riding in the request body. Session cookies
/// returned by the service accumulate on the client for its lifetime and are
/// replayed on every request; the cookie store is mutex-guarded, so one
/// client can be shared across tasks.
///
/// Offline clients (see [`ClientBuilder::offline`]) never touch the network
/// and answer every call with an empty or neutral result.
#[derive(Debug)]
pub struct Client {
    credentials: Credentials,
    urls: EndpointSet,
    http: reqwest::Client,
    cookies: Mutex<Vec<String>>,
    authenticated: AtomicBool,
    offline: bool,
}

impl Client {
    /// Starts building a client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Returns one or more records from the service.
    pub async fn get(&self, table: &str, query: &GetQuery) -> Result<Vec<Record>, Error> {
        let mut body = Body::new();
        query.add_to_body(&mut body);
        self.finish_body(&mut body, table)?;
        let response = self.send(&self.urls.get, &body).await?;
        if xml::has_error(&response) {
            return Err(Error::InvalidLogin);
        }
        xml::parse_records(&response)
    }

    /// Returns only the first record of the result set. Forces `limit` to 1.
    pub async fn first(&self, table: &str, query: &GetQuery) -> Result<Option<Record>, Error> {
        let records = self.get(table, &query.clone().with_limit(1)).await?;
        Ok(records.into_iter().next())
    }

    /// Writes a record to the service, creating it or (when the request
    /// carries an identifier) updating it. Returns the record's key as text.
    pub async fn save(&self, table: &str, request: &SaveRequest) -> Result<String, Error> {
        let mut body = Body::new();
        request.add_to_body(&mut body);
        self.finish_body(&mut body, table)?;
        let response = self.send(&self.urls.save, &body).await?;
        Ok(xml::success_key(&response).unwrap_or_else(|| response.trim().to_string()))
    }

    /// Creates a new record. Alias for [`Client::save`].
    pub async fn post(&self, table: &str, request: &SaveRequest) -> Result<String, Error> {
        self.save(table, request).await
    }

    /// Updates an existing record. The request must carry an identifier the
    /// service accepts for updates (a key, a `<table>_KEY` field, or
    /// `Email` on the supporter table) and fails before any network call
    /// otherwise.
    pub async fn put(&self, table: &str, request: &SaveRequest) -> Result<String, Error> {
        if !request.has_identifier(table) {
            return Err(Error::MissingIdentifier {
                table: table.to_string(),
            });
        }
        self.save(table, request).await
    }

    /// Deletes a record by key. Returns `true` when the response carries the
    /// success marker; a record that was already gone reports `false` rather
    /// than an error.
    pub async fn delete(&self, table: &str, key: u64) -> Result<bool, Error> {
        let mut body = Body::new();
        body.push("key", key.to_string());
        self.finish_body(&mut body, table)?;
        let response = self.send(&self.urls.delete, &body).await?;
        Ok(xml::is_success(&response))
    }

    /// Returns the number of records the query matches. `limit` is forced to
    /// 1 because the count rides the container element, not the rows.
    pub async fn count(&self, table: &str, query: &GetQuery) -> Result<u64, Error> {
        let mut body = Body::new();
        query.clone().with_limit(1).add_to_body(&mut body);
        self.finish_body(&mut body, table)?;
        let response = self.send(&self.urls.get, &body).await?;
        if xml::has_error(&response) {
            return Err(Error::InvalidLogin);
        }
        xml::parse_count(&response)
    }

    /// Returns a description of the columns of a table.
    pub async fn columns(&self, table: &str) -> Result<Vec<ColumnDescription>, Error> {
        let mut body = Body::new();
        body.push("desc", "1");
        self.finish_body(&mut body, table)?;
        let response = self.send(&self.urls.get, &body).await?;
        if xml::has_error(&response) {
            return Err(Error::InvalidLogin);
        }
        xml::parse_description(&response)
    }

    /// Alias for [`Client::columns`].
    pub async fn describe(&self, table: &str) -> Result<Vec<ColumnDescription>, Error> {
        self.columns(table).await
    }

    /// Logs in against the dedicated authenticate endpoint and captures the
    /// session cookie. A rejected login (the service redirects back to its
    /// login page) flips the authenticated flag to `false` but is not an
    /// error; only transport failures are.
    pub async fn authenticate(&self) -> Result<bool, Error> {
        let url = self.urls.resolve(Endpoint::Authenticate)?;
        if self.offline {
            return Ok(false);
        }
        let body = format!(
            "email={}&password={}",
            encode(&self.credentials.username),
            encode(&self.credentials.password)
        );
        tracing::debug!(url = %url, "authenticating");
        let response = self
            .http
            .post(url.clone())
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("authentication request failed: {}", e);
                Error::RequestFailed
            })?;

        let redirected_to_login = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|location| location.contains("login"));
        let cookies = extract_cookies(response.headers());

        let ok = !redirected_to_login && !cookies.is_empty();
        if ok {
            self.store_cookies(cookies);
        }
        self.authenticated.store(ok, Ordering::Relaxed);
        Ok(ok)
    }

    /// Whether the last [`Client::authenticate`] call succeeded.
    pub fn authenticated(&self) -> bool {
        self.authenticated.load(Ordering::Relaxed)
    }

    /// Probes the service, swallowing any failure into `false`.
    pub async fn connected(&self) -> bool {
        self.offline || self.columns("supporter").await.is_ok()
    }

    /// A raw request against one of the configured endpoints. The usual
    /// authentication values and the xml flag are still appended.
    pub async fn request(
        &self,
        endpoint: Endpoint,
        table: &str,
        params: &[(&str, &str)],
    ) -> Result<String, Error> {
        let url = self.urls.resolve(endpoint)?;
        let mut body = Body::new();
        for (key, value) in params {
            body.push(*key, *value);
        }
        self.finish_body(&mut body, table)?;
        self.send(url, &body).await
    }

    /// Returns a handle with the table name bound into every call.
    pub fn table(&self, name: impl Into<String>) -> crate::Table<'_> {
        crate::Table::new(self, name.into())
    }

    /// Appends the table identifier, authentication values, and the
    /// xml-response flag. A missing table name is fatal before any I/O.
    fn finish_body(&self, body: &mut Body, table: &str) -> Result<(), Error> {
        if table.is_empty() {
            return Err(Error::MissingTable);
        }
        body.push("object", table);
        if !self.credentials.orgkey.is_empty() {
            body.push("organization_KEY", self.credentials.orgkey.clone());
        }
        if !self.credentials.username.is_empty() && !self.credentials.password.is_empty() {
            body.push("user", self.credentials.username.clone());
            body.push("password", self.credentials.password.clone());
        }
        body.push("xml", "true");
        Ok(())
    }

    async fn send(&self, url: &Url, body: &Body) -> Result<String, Error> {
        if self.offline {
            return Ok(String::new());
        }
        let encoded = body.encode();
        tracing::debug!(url = %url, body = %encoded, "sending request");

        let mut request = self
            .http
            .post(url.clone())
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(encoded);
        let cookie_header = self.cookie_header();
        if !cookie_header.is_empty() {
            request = request.header(COOKIE, cookie_header);
        }
        let response = request.send().await.map_err(|e| {
            tracing::error!("request to {} failed: {}", url, e);
            Error::RequestFailed
        })?;

        let status = response.status();
        let cookies = extract_cookies(response.headers());
        let text = response.text().await.map_err(|e| {
            tracing::error!("failed to read response body: {}", e);
            Error::RequestFailed
        })?;

        if !status.is_success() {
            let snippet = truncate_body(&text);
            tracing::error!("request failed with status {}: {}", status, snippet);
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body: snippet,
            });
        }

        self.store_cookies(cookies);
        Ok(text)
    }

    fn cookie_header(&self) -> String {
        let cookies = self.cookies.lock().unwrap_or_else(|e| e.into_inner());
        cookies.join(";")
    }

    fn store_cookies(&self, new: Vec<String>) {
        if new.is_empty() {
            return;
        }
        let mut cookies = self.cookies.lock().unwrap_or_else(|e| e.into_inner());
        cookies.extend(new);
    }
}

/// Every `Set-Cookie` value, truncated at its first `;`. No deduplication:
/// repeated logins accumulate repeated cookies, as the service expects.
fn extract_cookies(headers: &HeaderMap) -> Vec<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.split(';').next())
        .map(str::to_string)
        .collect()
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 2000;
    if body.len() <= MAX {
        body.to_string()
    } else {
        format!("{}...[truncated]", &body[..MAX])
    }
}

/// Builder for [`Client`].
///
/// Requires `username`, `password`, `orgkey`, and either a [`Node`] or a
/// custom [`EndpointSet`]. Offline clients skip connection validation
/// entirely.
#[derive(Default)]
pub struct ClientBuilder {
    username: Option<String>,
    password: Option<String>,
    orgkey: Option<String>,
    node: Option<Node>,
    urls: Option<EndpointSet>,
    offline: bool,
    accept_invalid_certs: bool,
    timeout: Option<Duration>,
}

impl ClientBuilder {
    /// The username used to log in to the account.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// The password used to log in to the account.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// The organization key identifying the account on the service.
    pub fn orgkey(mut self, orgkey: impl Into<String>) -> Self {
        self.orgkey = Some(orgkey.into());
        self
    }

    /// Connects to a known deployment.
    pub fn node(mut self, node: Node) -> Self {
        self.node = Some(node);
        self
    }

    /// Connects to a custom endpoint set instead of a known node.
    pub fn urls(mut self, urls: EndpointSet) -> Self {
        self.urls = Some(urls);
        self
    }

    /// Prevents the client from contacting the service at all; every call
    /// returns an empty or neutral result. For development and testing.
    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// Disables TLS certificate verification. Some historical deployments
    /// serve self-signed certificates; verification stays on unless this is
    /// set explicitly.
    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Per-request timeout. Defaults to 30 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Validates the configuration and builds the client.
    pub fn build(self) -> Result<Client, Error> {
        let credentials = if self.offline {
            Credentials {
                username: self.username.unwrap_or_default(),
                password: self.password.unwrap_or_default(),
                orgkey: self.orgkey.unwrap_or_default(),
            }
        } else {
            Credentials {
                username: require(self.username, "username")?,
                password: require(self.password, "password")?,
                orgkey: require(self.orgkey, "orgkey")?,
            }
        };

        let urls = match (self.urls, self.node) {
            (Some(urls), _) => urls,
            (None, Some(node)) => node.endpoints()?,
            (None, None) if self.offline => Node::Sandbox.endpoints()?,
            (None, None) => {
                return Err(Error::InvalidConnection(
                    "either a node or a custom endpoint set is required".to_string(),
                ))
            }
        };

        let http = reqwest::Client::builder()
            .redirect(redirect::Policy::none())
            .timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .build()
            .map_err(|e| Error::InvalidConnection(format!("failed to build http client: {}", e)))?;

        Ok(Client {
            credentials,
            urls,
            http,
            cookies: Mutex::new(Vec::new()),
            authenticated: AtomicBool::new(false),
            offline: self.offline,
        })
    }
}

fn require(value: Option<String>, name: &str) -> Result<String, Error> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::InvalidConnection(format!("{} is required", name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Condition, GetQuery, SaveRequest};

    fn offline_client() -> Client {
        Client::builder().offline(true).build().unwrap()
    }

    #[test]
    fn construction_requires_credentials() {
        let err = Client::builder().node(Node::Sandbox).build().unwrap_err();
        assert!(matches!(err, Error::InvalidConnection(_)));
    }

    #[test]
    fn construction_requires_a_node_or_urls() {
        let err = Client::builder()
            .username("user")
            .password("pass")
            .orgkey("962")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConnection(_)));
    }

    #[test]
    fn offline_clients_skip_connection_validation() {
        assert!(Client::builder().offline(true).build().is_ok());
    }

    #[tokio::test]
    async fn offline_calls_return_neutral_results_without_io() {
        let client = offline_client();
        let query = GetQuery::new().with_condition(Condition::field("First_Name", "test1"));
        assert!(client.get("supporter", &query).await.unwrap().is_empty());
        assert_eq!(client.first("supporter", &query).await.unwrap(), None);
        assert_eq!(client.count("supporter", &query).await.unwrap(), 0);
        assert!(client.columns("supporter").await.unwrap().is_empty());
        assert!(!client.delete("supporter", 234).await.unwrap());
        assert_eq!(
            client
                .save("supporter", &SaveRequest::new().with_field("First_Name", "x"))
                .await
                .unwrap(),
            ""
        );
        assert!(client.connected().await);
    }

    #[tokio::test]
    async fn an_empty_table_name_is_rejected_before_any_io() {
        let client = offline_client();
        let err = client.get("", &GetQuery::new()).await.unwrap_err();
        assert!(matches!(err, Error::MissingTable));
    }

    #[tokio::test]
    async fn put_without_an_identifier_fails_fast() {
        let client = offline_client();
        let request = SaveRequest::new().with_field("City", "Albany");
        let err = client.put("supporter", &request).await.unwrap_err();
        assert!(matches!(err, Error::MissingIdentifier { table } if table == "supporter"));
    }

    #[tokio::test]
    async fn put_accepts_any_recognized_identifier() {
        let client = offline_client();
        let keyed = SaveRequest::new().with_key(76544).with_field("City", "Albany");
        assert!(client.put("supporter", &keyed).await.is_ok());
        let by_email = SaveRequest::new().with_field("Email", "jones@example.org");
        assert!(client.put("supporter", &by_email).await.is_ok());
        let by_table_key = SaveRequest::new().with_field("groups_KEY", 234);
        assert!(client.put("groups", &by_table_key).await.is_ok());
    }
}
