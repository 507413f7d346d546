//! FirestoreProjectStore — concrete `ProjectStore` over the Firestore REST
//! API.
//!
//! Documents are fetched and patched through the `v1` document endpoints.
//! Firestore wraps every field in a typed-value envelope
//! (`{"stringValue": ...}` and friends); the pure conversion helpers below
//! translate between that envelope and plain JSON, and are unit tested
//! without network access.

use serde_json::{json, Map, Value};

use super::ProjectStore;
use crate::error::AppError;
use crate::models::{ProjectDetails, ProjectPatch};

const FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com/v1";
const USER_AGENT: &str = "escrowdesk/0.1.0";

pub struct FirestoreProjectStore {
    client: reqwest::Client,
    /// Firebase project id (not a marketplace project id).
    firebase_project: String,
    /// Collection holding the marketplace project documents.
    collection: String,
}

impl FirestoreProjectStore {
    pub fn new(firebase_project: &str, collection: &str) -> crate::error::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            firebase_project: firebase_project.to_string(),
            collection: collection.to_string(),
        })
    }

    fn document_url(&self, project_id: &str) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents/{}/{}",
            FIRESTORE_BASE_URL, self.firebase_project, self.collection, project_id
        )
    }
}

impl ProjectStore for FirestoreProjectStore {
    async fn fetch_project(
        &self,
        project_id: &str,
    ) -> crate::error::Result<(Value, ProjectDetails)> {
        let resp = self
            .client
            .get(self.document_url(project_id))
            .send()
            .await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(project_id.to_string()));
        }
        let body: Value = resp.error_for_status()?.json().await?;
        let raw = decode_document(&body)?;
        let details: ProjectDetails = serde_json::from_value(raw.clone())?;
        Ok((raw, details))
    }

    async fn update_project(
        &self,
        project_id: &str,
        patch: &ProjectPatch,
    ) -> crate::error::Result<()> {
        let fields = serde_json::to_value(patch)?;
        let fields = fields
            .as_object()
            .ok_or_else(|| AppError::Internal("patch did not serialize to an object".into()))?;
        if fields.is_empty() {
            return Ok(());
        }

        // Restrict the write to exactly the patched fields.
        let mask: Vec<(&str, &str)> = fields
            .keys()
            .map(|k| ("updateMask.fieldPaths", k.as_str()))
            .collect();
        let body = json!({ "fields": encode_fields(fields) });

        let resp = self
            .client
            .patch(self.document_url(project_id))
            .query(&mask)
            .json(&body)
            .send()
            .await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(project_id.to_string()));
        }
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(AppError::Storage(format!(
                "update rejected: status={}, response={}",
                status, text
            )));
        }
        Ok(())
    }
}

/// Unwrap a Firestore document body (`{"name": ..., "fields": {...}}`) into
/// a plain JSON object.
pub(crate) fn decode_document(body: &Value) -> crate::error::Result<Value> {
    let fields = body
        .get("fields")
        .and_then(|f| f.as_object())
        .ok_or_else(|| AppError::Storage(format!("document without fields: {}", body)))?;
    let mut out = Map::new();
    for (key, value) in fields {
        out.insert(key.clone(), decode_value(value)?);
    }
    Ok(Value::Object(out))
}

/// Firestore typed value -> plain JSON.
pub(crate) fn decode_value(value: &Value) -> crate::error::Result<Value> {
    let obj = value
        .as_object()
        .ok_or_else(|| AppError::Storage(format!("malformed typed value: {}", value)))?;
    let (kind, inner) = obj
        .iter()
        .next()
        .ok_or_else(|| AppError::Storage("empty typed value".into()))?;
    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" | "doubleValue" | "stringValue" | "timestampValue" => Ok(inner.clone()),
        // Firestore transports integers as decimal strings.
        "integerValue" => {
            let n = inner
                .as_str()
                .and_then(|s| s.parse::<i64>().ok())
                .or_else(|| inner.as_i64())
                .ok_or_else(|| AppError::Storage(format!("bad integerValue: {}", inner)))?;
            Ok(json!(n))
        }
        "arrayValue" => {
            let values = inner
                .get("values")
                .and_then(|v| v.as_array())
                .cloned()
                .unwrap_or_default();
            let decoded: crate::error::Result<Vec<Value>> =
                values.iter().map(decode_value).collect();
            Ok(Value::Array(decoded?))
        }
        "mapValue" => {
            let fields = inner.get("fields").and_then(|f| f.as_object());
            let mut out = Map::new();
            if let Some(fields) = fields {
                for (key, value) in fields {
                    out.insert(key.clone(), decode_value(value)?);
                }
            }
            Ok(Value::Object(out))
        }
        other => Err(AppError::Storage(format!("unsupported value kind: {}", other))),
    }
}

/// Plain JSON object -> Firestore `fields` map.
pub(crate) fn encode_fields(fields: &Map<String, Value>) -> Value {
    let mut out = Map::new();
    for (key, value) in fields {
        out.insert(key.clone(), encode_value(value));
    }
    Value::Object(out)
}

/// Plain JSON -> Firestore typed value.
pub(crate) fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                json!({ "integerValue": i.to_string() })
            } else {
                json!({ "doubleValue": n.as_f64() })
            }
        }
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}
