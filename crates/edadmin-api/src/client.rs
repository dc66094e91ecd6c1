// Hand-crafted async HTTP client for the admin REST API.
//
// Base path: /api/
// Auth: X-Auth-UID / X-Auth-Cookie headers (see `auth`)

use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::auth::{LoginRequest, LoginResponse, Session};
use crate::{Error, TransportConfig};

// ── Error response shape from the backend ────────────────────────────

#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the admin API.
///
/// Requests are sent to `{base}/api/{path}`. Session headers are attached
/// per request because the impersonation header depends on the path.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    session: Option<Session>,
    timeout_secs: u64,
}

impl ApiClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build an unauthenticated client. Only [`login`](Self::login) works
    /// until a session is attached.
    pub fn new(base_url: &str, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url: Self::normalize_base_url(base_url)?,
            session: None,
            timeout_secs: transport.timeout.as_secs(),
        })
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        Ok(Self {
            http,
            base_url: Self::normalize_base_url(base_url)?,
            session: None,
            timeout_secs: 30,
        })
    }

    pub fn with_session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Ensure the base URL ends with `/` so `join("api/...")` keeps any
    /// path prefix the backend is mounted under.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{path}/"));
        Ok(url)
    }

    // ── Authentication ───────────────────────────────────────────────

    /// Exchange username and password for a session (`POST /api/login`).
    pub async fn login(&self, username: &str, password: &SecretString) -> Result<Session, Error> {
        let url = self.base_url.join("api/login")?;
        debug!("logging in at {url}");

        let body = LoginRequest {
            username,
            password: password.expose_secret(),
        };
        let resp = self.send(self.http.post(url).json(&body)).await?;

        let status = resp.status();
        if !status.is_success() {
            let message = match parse_error(status, resp).await {
                Error::Api { message, .. } => message,
                Error::SessionExpired => "invalid username or password".into(),
                other => other.to_string(),
            };
            return Err(Error::Authentication { message });
        }

        let login: LoginResponse = handle_body(resp).await?;
        debug!(uid = %login.uid, "login successful");
        Ok(Session::new(login.uid, SecretString::from(login.cookie)))
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Resolve a path relative to `/api/` (e.g. `"policies/7"`).
    ///
    /// Returns the full URL and the absolute API path used for the
    /// session header rules.
    fn api_url(&self, path: &str) -> Result<(Url, String), Error> {
        let api_path = format!("/api/{}", path.trim_start_matches('/'));
        let url = self.base_url.join(api_path.trim_start_matches('/'))?;
        Ok((url, api_path))
    }

    fn request(&self, method: Method, path: &str) -> Result<reqwest::RequestBuilder, Error> {
        let (url, api_path) = self.api_url(path)?;
        debug!("{method} {url}");

        let session = self.session.as_ref().ok_or(Error::NoSession)?;
        let headers = session.headers_for(&api_path)?;
        Ok(self.http.request(method, url).headers(headers))
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, Error> {
        builder.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout {
                    timeout_secs: self.timeout_secs,
                }
            } else {
                Error::Transport(e)
            }
        })
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let resp = self.send(self.request(Method::GET, path)?).await?;
        handle_response(resp).await
    }

    pub async fn get_with_params<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        debug!("params={params:?}");
        let resp = self
            .send(self.request(Method::GET, path)?.query(params))
            .await?;
        handle_response(resp).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let resp = self
            .send(self.request(Method::POST, path)?.json(body))
            .await?;
        handle_response(resp).await
    }

    /// POST whose response body may be empty (`null` is returned then).
    pub async fn post_value<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<Value, Error> {
        let resp = self
            .send(self.request(Method::POST, path)?.json(body))
            .await?;
        handle_value(resp).await
    }

    /// PATCH whose response body may be empty (`null` is returned then).
    pub async fn patch_value<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<Value, Error> {
        let resp = self
            .send(self.request(Method::PATCH, path)?.json(body))
            .await?;
        handle_value(resp).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), Error> {
        let resp = self.send(self.request(Method::DELETE, path)?).await?;
        handle_empty(resp).await
    }

    // ━━ Collection CRUD ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// List a collection.
    ///
    /// Most collections return a bare array; a few (broadcasts) wrap it in
    /// an object next to a count. The first array-valued field is used then.
    pub async fn list<T: DeserializeOwned>(
        &self,
        collection: &str,
        params: &[(&str, String)],
    ) -> Result<Vec<T>, Error> {
        let body: Value = if params.is_empty() {
            self.get(collection).await?
        } else {
            self.get_with_params(collection, params).await?
        };
        unwrap_list(body)
    }

    /// Fetch one record (`GET /api/{collection}/{id}`).
    pub async fn fetch<T: DeserializeOwned>(&self, collection: &str, id: &str) -> Result<T, Error> {
        self.get(&format!("{collection}/{id}")).await
    }

    /// Create a record (`POST /api/{collection}`); returns the created document.
    pub async fn create<B: Serialize + Sync>(&self, collection: &str, body: &B) -> Result<Value, Error> {
        self.post_value(collection, body).await
    }

    /// Update a record (`PATCH /api/{collection}/{id}`).
    pub async fn update<B: Serialize + Sync>(
        &self,
        collection: &str,
        id: &str,
        body: &B,
    ) -> Result<Value, Error> {
        self.patch_value(&format!("{collection}/{id}"), body).await
    }

    /// Delete a record (`DELETE /api/{collection}/{id}`).
    pub async fn remove(&self, collection: &str, id: &str) -> Result<(), Error> {
        self.delete(&format!("{collection}/{id}")).await
    }

    /// Run a record action (`POST /api/{collection}/{id}/{verb}`).
    pub async fn action(&self, collection: &str, id: &str, verb: &str) -> Result<Value, Error> {
        self.post_value(&format!("{collection}/{id}/{verb}"), &serde_json::json!({}))
            .await
    }
}

// ── Response handling ────────────────────────────────────────────────

async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let status = resp.status();
    if status.is_success() {
        handle_body(resp).await
    } else {
        Err(parse_error(status, resp).await)
    }
}

async fn handle_body<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let body = resp.text().await?;
    serde_json::from_str(&body).map_err(|e| decode_error(&e, body))
}

async fn handle_value(resp: reqwest::Response) -> Result<Value, Error> {
    let status = resp.status();
    if !status.is_success() {
        return Err(parse_error(status, resp).await);
    }
    let body = resp.text().await?;
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&body).map_err(|e| decode_error(&e, body))
}

fn decode_error(err: &serde_json::Error, body: String) -> Error {
    Error::Deserialization {
        message: format!("{err} (body preview: {:?})", preview(&body)),
        body,
    }
}

const PREVIEW_CHARS: usize = 200;

/// At most the first 200 characters, cut on a char boundary.
fn preview(body: &str) -> &str {
    body.char_indices()
        .nth(PREVIEW_CHARS)
        .map_or(body, |(end, _)| &body[..end])
}

async fn handle_empty(resp: reqwest::Response) -> Result<(), Error> {
    let status = resp.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(parse_error(status, resp).await)
    }
}

async fn parse_error(status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Error::SessionExpired;
    }

    let raw = resp.text().await.unwrap_or_default();

    if let Ok(err) = serde_json::from_str::<ErrorResponse>(&raw) {
        let message = err
            .description
            .clone()
            .or_else(|| err.title.clone())
            .or(err.message)
            .unwrap_or_else(|| status.to_string());
        Error::Api {
            status: status.as_u16(),
            title: err.title,
            message,
        }
    } else {
        Error::Api {
            status: status.as_u16(),
            title: None,
            message: if raw.is_empty() {
                status.to_string()
            } else {
                raw
            },
        }
    }
}

fn unwrap_list<T: DeserializeOwned>(body: Value) -> Result<Vec<T>, Error> {
    let items = match body {
        Value::Array(_) => body,
        Value::Object(map) => map
            .into_iter()
            .map(|(_, v)| v)
            .find(Value::is_array)
            .unwrap_or_else(|| Value::Array(Vec::new())),
        Value::Null => Value::Array(Vec::new()),
        other => {
            return Err(Error::Deserialization {
                message: "expected a JSON array or list envelope".into(),
                body: other.to_string(),
            });
        }
    };
    serde_json::from_value(items).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body: String::new(),
    })
}
