//! Firestore REST v1 implementation of [`DocumentStore`].

mod token;
mod value;

use reqwest::{RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::debug;

pub use token::ServiceAccount;
use token::TokenSource;

use super::{require_object, DocPath, Document, DocumentStore};
use crate::{Config, Error, Result};

const FIRESTORE_HOST: &str = "https://firestore.googleapis.com";
const PAGE_SIZE: &str = "300";

#[derive(Debug, Deserialize)]
struct RawDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<RawDocument>,
    next_page_token: Option<String>,
}

/// Firestore client speaking the REST API.
pub struct FirestoreStore {
    http: reqwest::Client,
    /// `.../v1/projects/{project}/databases/(default)/documents`
    documents_url: String,
    tokens: Option<TokenSource>,
}

impl FirestoreStore {
    pub fn new(http: reqwest::Client, project_id: &str, account: Option<ServiceAccount>) -> Self {
        Self::with_base_url(http, FIRESTORE_HOST, project_id, account)
    }

    /// Point the client at another host: the emulator, or a mock server in tests.
    pub fn with_base_url(
        http: reqwest::Client,
        base_url: &str,
        project_id: &str,
        account: Option<ServiceAccount>,
    ) -> Self {
        Self {
            http,
            documents_url: format!(
                "{}/v1/projects/{}/databases/(default)/documents",
                base_url.trim_end_matches('/'),
                project_id
            ),
            tokens: account.map(TokenSource::new),
        }
    }

    /// Build the store the way the deployed functions use it.
    ///
    /// The emulator needs no credentials; everywhere else a service account is required.
    pub fn from_config(http: reqwest::Client, config: &Config) -> Result<Self> {
        if let Some(host) = &config.firestore_emulator_host {
            let base_url = format!("http://{}", host);
            return Ok(Self::with_base_url(http, &base_url, &config.firebase_project_id, None));
        }

        let raw = config
            .firebase_service_account
            .as_deref()
            .ok_or_else(|| Error::Config("FIREBASE_SERVICE_ACCOUNT not set".to_string()))?;

        Ok(Self::new(
            http,
            &config.firebase_project_id,
            Some(ServiceAccount::from_json(raw)?),
        ))
    }

    fn url(&self, path: &DocPath) -> String {
        let encoded: Vec<_> = path
            .as_str()
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        format!("{}/{}", self.documents_url, encoded.join("/"))
    }

    async fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        match &self.tokens {
            Some(tokens) => Ok(request.bearer_auth(tokens.access_token(&self.http).await?)),
            None => Ok(request),
        }
    }

    async fn send(&self, request: RequestBuilder, path: &DocPath) -> Result<Option<Value>> {
        let response = self.authorized(request).await?.send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::Store(format!(
                "Firestore returned {} for {}: {}",
                status, path, error_text
            )));
        }

        Ok(Some(response.json().await?))
    }

    async fn patch(&self, path: &DocPath, data: &Value, mask: Option<Vec<String>>) -> Result<()> {
        let fields = value::encode_fields(require_object(path, data)?);
        let mut request = self.http.patch(self.url(path)).json(&json!({ "fields": fields }));

        if let Some(mask) = mask {
            let params: Vec<_> = mask
                .iter()
                .map(|field| ("updateMask.fieldPaths", field.as_str()))
                .collect();
            request = request.query(&params);
        }

        debug!(%path, "Writing document");
        self.send(request, path).await?;
        Ok(())
    }
}

/// Quote a top-level field name for an update mask when it is not a simple identifier.
fn field_path(key: &str) -> String {
    let simple = key
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

    if simple {
        key.to_string()
    } else {
        format!("`{}`", key.replace('\\', "\\\\").replace('`', "\\`"))
    }
}

impl DocumentStore for FirestoreStore {
    async fn get(&self, path: &DocPath) -> Result<Option<Value>> {
        let request = self.http.get(self.url(path));
        let Some(body) = self.send(request, path).await? else {
            return Ok(None);
        };

        let raw: RawDocument = serde_json::from_value(body)?;
        Ok(Some(Value::Object(value::decode_fields(&raw.fields)?)))
    }

    async fn set(&self, path: &DocPath, data: &Value) -> Result<()> {
        self.patch(path, data, None).await
    }

    async fn merge(&self, path: &DocPath, data: &Value) -> Result<()> {
        let mask = require_object(path, data)?
            .keys()
            .map(|key| field_path(key))
            .collect();
        self.patch(path, data, Some(mask)).await
    }

    async fn list(&self, collection: &DocPath) -> Result<Vec<Document>> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .http
                .get(self.url(collection))
                .query(&[("pageSize", PAGE_SIZE)]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let Some(body) = self.send(request, collection).await? else {
                break;
            };
            let page: ListResponse = serde_json::from_value(body)?;

            for raw in page.documents {
                let id = raw.name.rsplit('/').next().unwrap_or_default().to_string();
                documents.push(Document {
                    id,
                    data: Value::Object(value::decode_fields(&raw.fields)?),
                });
            }

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(documents)
    }
}
