//! Firestore REST store.
//!
//! Reads the latest record with a `:runQuery` (order by `timestamp` desc,
//! limit 1) and appends with a `:commit` whose `timestamp` field is set by a
//! server-side `REQUEST_TIME` transform.
//!
//! Auth is the service-account flow: an RS256 JWT signed with the account's
//! private key is exchanged at `token_uri` for a bearer token, which is reused
//! until a minute before it expires.

use super::{NewSignalRecord, SignalStore, StoreError};
use crate::credentials::ServiceAccount;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use nifty_renko_core::SignalType;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, warn};

const FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com/v1";
const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";
const JWT_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const TOKEN_LIFETIME_SECS: i64 = 3600;
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    TOKEN_LIFETIME_SECS
}

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: DateTime<Utc>,
}

pub struct FirestoreStore {
    client: reqwest::blocking::Client,
    account: ServiceAccount,
    collection: String,
    base_url: String,
    token: Mutex<Option<AccessToken>>,
}

impl FirestoreStore {
    pub fn new(
        account: ServiceAccount,
        collection: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            account,
            collection: collection.into(),
            base_url: FIRESTORE_BASE_URL.to_string(),
            token: Mutex::new(None),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    fn documents_path(&self) -> String {
        format!(
            "projects/{}/databases/(default)/documents",
            self.account.project_id
        )
    }

    fn access_token(&self) -> Result<String, StoreError> {
        let mut cached = self.token.lock().unwrap_or_else(|p| p.into_inner());
        let now = Utc::now();
        if let Some(token) = cached.as_ref() {
            if token.expires_at - ChronoDuration::seconds(TOKEN_REFRESH_MARGIN_SECS) > now {
                return Ok(token.value.clone());
            }
        }

        let token = self.fetch_token(now)?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    fn fetch_token(&self, now: DateTime<Utc>) -> Result<AccessToken, StoreError> {
        let assertion = sign_assertion(&self.account, now)?;
        let resp = self
            .client
            .post(&self.account.token_uri)
            .form(&[("grant_type", JWT_GRANT_TYPE), ("assertion", assertion.as_str())])
            .send()
            .map_err(|e| StoreError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(StoreError::Auth(format!("token endpoint HTTP {}: {body}", status.as_u16())));
        }

        let token: TokenResponse = resp
            .json()
            .map_err(|e| StoreError::Auth(format!("token response malformed: {e}")))?;
        debug!(expires_in = token.expires_in, "obtained access token");
        Ok(AccessToken {
            value: token.access_token,
            expires_at: now + ChronoDuration::seconds(token.expires_in),
        })
    }

    fn post_json(&self, url: &str, body: &Value) -> Result<Value, StoreError> {
        let token = self.access_token()?;
        let resp = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(body)
            .send()
            .map_err(|e| StoreError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(StoreError::Http {
                status: status.as_u16(),
                body,
            });
        }
        resp.json()
            .map_err(|e| StoreError::Response(format!("invalid JSON: {e}")))
    }
}

impl SignalStore for FirestoreStore {
    fn name(&self) -> &str {
        "firestore"
    }

    fn latest_type(&self) -> Result<Option<SignalType>, StoreError> {
        let url = format!("{}/{}:runQuery", self.base_url, self.documents_path());
        let resp = self.post_json(&url, &run_query_body(&self.collection))?;
        let raw = parse_latest_type(&resp)?;
        Ok(raw.and_then(|t| match t.parse::<SignalType>() {
            Ok(signal_type) => Some(signal_type),
            Err(e) => {
                warn!(error = %e, "latest record has an unrecognised type");
                None
            }
        }))
    }

    fn append(&self, record: &NewSignalRecord) -> Result<(), StoreError> {
        let document = format!(
            "{}/{}/{}",
            self.documents_path(),
            self.collection,
            uuid::Uuid::new_v4().simple()
        );
        let url = format!("{}/{}:commit", self.base_url, self.documents_path());
        self.post_json(&url, &commit_body(&document, record))?;
        debug!(%document, "committed signal document");
        Ok(())
    }
}

/// Signed JWT assertion for the token exchange.
fn sign_assertion(account: &ServiceAccount, now: DateTime<Utc>) -> Result<String, StoreError> {
    let key = EncodingKey::from_rsa_pem(account.private_key.as_bytes())
        .map_err(|e| StoreError::Auth(format!("private key unusable: {e}")))?;
    let mut header = Header::new(Algorithm::RS256);
    header.kid = account.private_key_id.clone();
    let claims = jwt_claims(account, now);
    jsonwebtoken::encode(&header, &claims, &key)
        .map_err(|e| StoreError::Auth(format!("signing assertion failed: {e}")))
}

fn jwt_claims(account: &ServiceAccount, now: DateTime<Utc>) -> Claims<'_> {
    let iat = now.timestamp();
    Claims {
        iss: &account.client_email,
        scope: DATASTORE_SCOPE,
        aud: &account.token_uri,
        iat,
        exp: iat + TOKEN_LIFETIME_SECS,
    }
}

pub(crate) fn run_query_body(collection: &str) -> Value {
    json!({
        "structuredQuery": {
            "from": [{ "collectionId": collection }],
            "orderBy": [{
                "field": { "fieldPath": "timestamp" },
                "direction": "DESCENDING"
            }],
            "limit": 1
        }
    })
}

/// Raw `type` string of the first document in a `:runQuery` response.
/// A document without a string `type` field is an error, not "no record".
pub(crate) fn parse_latest_type(resp: &Value) -> Result<Option<String>, StoreError> {
    let rows = resp
        .as_array()
        .ok_or_else(|| StoreError::Response("runQuery response is not an array".into()))?;

    let Some(document) = rows.iter().find_map(|row| row.get("document")) else {
        return Ok(None);
    };
    document
        .pointer("/fields/type/stringValue")
        .and_then(Value::as_str)
        .map(|t| Some(t.to_string()))
        .ok_or_else(|| StoreError::Response("latest record has no type".into()))
}

pub(crate) fn commit_body(document_name: &str, record: &NewSignalRecord) -> Value {
    let stochastics = match record.stochastics {
        Some(k) if k.is_finite() => json!({ "doubleValue": k }),
        _ => json!({ "nullValue": null }),
    };
    json!({
        "writes": [{
            "update": {
                "name": document_name,
                "fields": {
                    "type": { "stringValue": record.signal_type.as_str() },
                    "price": { "doubleValue": record.price },
                    "stochastics": stochastics,
                    "reason": { "stringValue": record.reason },
                    "source": { "stringValue": record.source }
                }
            },
            "updateTransforms": [{
                "fieldPath": "timestamp",
                "setToServerValue": "REQUEST_TIME"
            }],
            "currentDocument": { "exists": false }
        }]
    })
}
