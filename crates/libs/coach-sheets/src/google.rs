//! [`SheetGateway`] over the Google Sheets v4 REST API.
//!
//! Authenticates as a service account: a signed RS256 assertion is exchanged
//! for a bearer token, which is cached until shortly before it expires.

use std::path::Path;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::{Response, Url};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::Mutex;
use tracing::debug;

use crate::cell::Row;
use crate::error::GatewayError;
use crate::gateway::{SheetGateway, TabInfo, a1_range};

pub const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
/// Tokens are renewed this long before they expire.
const REFRESH_MARGIN: Duration = Duration::from_secs(60);
/// Upper bound on one exchange with the API or the token endpoint.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

fn default_token_uri() -> String {
    String::from(DEFAULT_TOKEN_URI)
}

/// The fields used from a service-account key file.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl ServiceAccountKey {
    pub fn from_json(json: &str) -> Result<Self, GatewayError> {
        let key: Self = serde_json::from_str(json)?;
        if key.client_email.is_empty() || key.private_key.is_empty() {
            return Err(GatewayError::Credentials(String::from(
                "service account key lacks client_email or private_key",
            )));
        }
        Ok(key)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, GatewayError> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug)]
struct AccessToken {
    value: String,
    renew_at: Instant,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetProperties {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    title: String,
    #[serde(default)]
    sheet_id: i64,
    #[serde(default)]
    index: i64,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Row>,
}

pub struct GoogleSheetsGateway {
    client: reqwest::Client,
    key: ServiceAccountKey,
    spreadsheet_id: String,
    base_url: String,
    token: Mutex<Option<AccessToken>>,
}

fn http_client(timeout: Duration) -> Result<reqwest::Client, GatewayError> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

impl GoogleSheetsGateway {
    pub fn new(
        key: ServiceAccountKey,
        spreadsheet_id: impl Into<String>,
    ) -> Result<Self, GatewayError> {
        Ok(Self {
            client: http_client(REQUEST_TIMEOUT)?,
            key,
            spreadsheet_id: spreadsheet_id.into(),
            base_url: String::from(SHEETS_API),
            token: Mutex::new(None),
        })
    }

    /// Replaces the per-request timeout (default [`REQUEST_TIMEOUT`]).
    pub fn with_request_timeout(mut self, timeout: Duration) -> Result<Self, GatewayError> {
        self.client = http_client(timeout)?;
        Ok(self)
    }

    /// Points the gateway at another API root, e.g. a local emulator.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn assertion(&self) -> Result<String, GatewayError> {
        let now = chrono::Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope: SCOPE,
            aud: &self.key.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };
        let signing_key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())?;
        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::RS256),
            &claims,
            &signing_key,
        )?)
    }

    async fn access_token(&self) -> Result<String, GatewayError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref().filter(|token| token.renew_at > Instant::now()) {
            return Ok(token.value.clone());
        }

        debug!("Requesting spreadsheet access token for {}", self.key.client_email);
        let assertion = self.assertion()?;
        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&[("grant_type", GRANT_TYPE), ("assertion", assertion.as_str())])
            .send()
            .await?;
        let granted: TokenResponse = ensure_success(response).await?.json().await?;

        let lifetime = Duration::from_secs(granted.expires_in).saturating_sub(REFRESH_MARGIN);
        let value = granted.access_token;
        *cached = Some(AccessToken {
            value: value.clone(),
            renew_at: Instant::now() + lifetime,
        });
        Ok(value)
    }

    /// `{base}/{spreadsheet}` followed by `segments`, each percent-encoded.
    fn url(&self, segments: &[&str]) -> Result<Url, GatewayError> {
        let mut url =
            Url::parse(&self.base_url).map_err(|err| GatewayError::Rejected(err.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| GatewayError::Rejected(format!("{} cannot be a base", self.base_url)))?
            .pop_if_empty()
            .push(&self.spreadsheet_id)
            .extend(segments);
        Ok(url)
    }
}

async fn ensure_success(response: Response) -> Result<Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(GatewayError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl SheetGateway for GoogleSheetsGateway {
    async fn list_tabs(&self) -> Result<Vec<TabInfo>, GatewayError> {
        let token = self.access_token().await?;
        let response = self
            .client
            .get(self.url(&[])?)
            .query(&[("fields", "sheets.properties")])
            .bearer_auth(token)
            .send()
            .await?;
        let spreadsheet: SpreadsheetProperties = ensure_success(response).await?.json().await?;
        Ok(spreadsheet
            .sheets
            .into_iter()
            .map(|sheet| TabInfo {
                title: sheet.properties.title,
                sheet_id: sheet.properties.sheet_id,
                index: sheet.properties.index,
            })
            .collect())
    }

    async fn read_range(&self, tab: &str, columns: &str) -> Result<Vec<Row>, GatewayError> {
        let token = self.access_token().await?;
        let range = a1_range(tab, columns);
        let response = self
            .client
            .get(self.url(&["values", &range])?)
            .bearer_auth(token)
            .send()
            .await?;
        let values: ValueRange = ensure_success(response).await?.json().await?;
        Ok(values.values)
    }

    async fn append_rows(
        &self,
        tab: &str,
        columns: &str,
        rows: Vec<Vec<String>>,
    ) -> Result<(), GatewayError> {
        let token = self.access_token().await?;
        let target = format!("{}:append", a1_range(tab, columns));
        let response = self
            .client
            .post(self.url(&["values", &target])?)
            .query(&[("valueInputOption", "RAW"), ("insertDataOption", "INSERT_ROWS")])
            .bearer_auth(token)
            .json(&json!({ "values": rows }))
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }
}
