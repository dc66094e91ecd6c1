// Session credentials and the header rules the backend expects.
//
// Every `/api/` call except `/api/login` carries `X-Auth-UID` and
// `X-Auth-Cookie`. When an admin impersonates a customer, `X-Auth-Impersonate`
// is added too, except on admin-level endpoints which need the admin's own
// context.

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::Error;

pub const HEADER_UID: &str = "x-auth-uid";
pub const HEADER_COOKIE: &str = "x-auth-cookie";
pub const HEADER_IMPERSONATE: &str = "x-auth-impersonate";

/// Endpoint prefixes that never receive the impersonation header.
pub const ADMIN_ENDPOINTS: &[&str] = &[
    "/api/sinks",
    "/api/dkimentries",
    "/api/companies",
    "/api/frontends",
    "/api/policies",
    "/api/routes",
    "/api/domaingroups",
    "/api/routepolicies",
    "/api/mailgun",
    "/api/ses",
    "/api/smtprelays",
    "/api/userlogs",
    "/api/allstats",
    "/api/ipstats",
    "/api/companybroadcasts",
    "/api/warmups",
    "/api/plans",
    "/api/billing/gateways",
];

const LOGIN_PATH: &str = "/api/login";

/// Whether `path` (absolute, starting with `/api/`) is an admin-level endpoint.
///
/// Matches by prefix, so `/api/policies/7/publish` counts as admin.
pub fn is_admin_endpoint(path: &str) -> bool {
    ADMIN_ENDPOINTS.iter().any(|ep| path.starts_with(ep))
}

/// An authenticated backend session.
#[derive(Debug, Clone)]
pub struct Session {
    pub uid: String,
    pub cookie: SecretString,
    /// Customer id to act as, if impersonating.
    pub impersonate: Option<String>,
}

impl Session {
    pub fn new(uid: impl Into<String>, cookie: SecretString) -> Self {
        Self {
            uid: uid.into(),
            cookie,
            impersonate: None,
        }
    }

    pub fn with_impersonate(mut self, customer: Option<String>) -> Self {
        self.impersonate = customer.filter(|c| !c.is_empty());
        self
    }

    /// Session headers for a request to `path`.
    ///
    /// Empty for non-`/api` paths and for the login endpoint.
    pub fn headers_for(&self, path: &str) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();
        if !path.starts_with("/api") || path == LOGIN_PATH {
            return Ok(headers);
        }

        headers.insert(HEADER_UID, header_value(&self.uid)?);
        let mut cookie = header_value(self.cookie.expose_secret())?;
        cookie.set_sensitive(true);
        headers.insert(HEADER_COOKIE, cookie);

        let impersonate = self
            .impersonate
            .as_deref()
            .filter(|_| !is_admin_endpoint(path));
        if let Some(customer) = impersonate {
            headers.insert(HEADER_IMPERSONATE, header_value(customer)?);
        }

        Ok(headers)
    }
}

fn header_value(raw: &str) -> Result<HeaderValue, Error> {
    HeaderValue::from_str(raw).map_err(|e| Error::Authentication {
        message: format!("invalid session header value: {e}"),
    })
}

// ── Login wire types ─────────────────────────────────────────────────

#[derive(Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Deserialize)]
pub(crate) struct LoginResponse {
    pub uid: String,
    pub cookie: String,
}
