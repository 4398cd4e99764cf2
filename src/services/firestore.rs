use std::collections::BTreeMap;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};

const FIRESTORE_HOST: &str = "https://firestore.googleapis.com/v1";

/// A Firestore REST `Value`. Externally tagged serde matches the wire shape
/// exactly: `{"stringValue": "x"}`, `{"integerValue": "3"}`, and so on.
/// Integers travel as strings on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FirestoreValue {
    NullValue(()),
    BooleanValue(bool),
    IntegerValue(String),
    DoubleValue(f64),
    TimestampValue(String),
    StringValue(String),
    ReferenceValue(String),
    ArrayValue(ArrayValue),
    MapValue(MapValue),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArrayValue {
    #[serde(default)]
    pub values: Vec<FirestoreValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapValue {
    #[serde(default)]
    pub fields: Fields,
}

pub type Fields = BTreeMap<String, FirestoreValue>;

impl FirestoreValue {
    /// Encode a plain JSON value. Whole numbers become `integerValue`,
    /// everything else maps structurally.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => FirestoreValue::NullValue(()),
            Value::Bool(b) => FirestoreValue::BooleanValue(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => FirestoreValue::IntegerValue(i.to_string()),
                None => FirestoreValue::DoubleValue(n.as_f64().unwrap_or(0.0)),
            },
            Value::String(s) => FirestoreValue::StringValue(s.clone()),
            Value::Array(items) => FirestoreValue::ArrayValue(ArrayValue {
                values: items.iter().map(FirestoreValue::from_json).collect(),
            }),
            Value::Object(map) => FirestoreValue::MapValue(MapValue {
                fields: map
                    .iter()
                    .map(|(k, v)| (k.clone(), FirestoreValue::from_json(v)))
                    .collect(),
            }),
        }
    }

    /// Decode back to plain JSON. Timestamps stay RFC 3339 strings; an
    /// `integerValue` that does not parse is kept verbatim as a string.
    pub fn to_json(&self) -> Value {
        match self {
            FirestoreValue::NullValue(()) => Value::Null,
            FirestoreValue::BooleanValue(b) => json!(b),
            FirestoreValue::IntegerValue(s) => match s.parse::<i64>() {
                Ok(i) => json!(i),
                Err(_) => Value::String(s.clone()),
            },
            FirestoreValue::DoubleValue(f) => json!(f),
            FirestoreValue::TimestampValue(s)
            | FirestoreValue::StringValue(s)
            | FirestoreValue::ReferenceValue(s) => Value::String(s.clone()),
            FirestoreValue::ArrayValue(arr) => {
                Value::Array(arr.values.iter().map(FirestoreValue::to_json).collect())
            }
            FirestoreValue::MapValue(map) => Value::Object(
                map.fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

/// Encode a JSON object into a Firestore fields map.
pub fn fields_from_json(value: &Value) -> AppResult<Fields> {
    match value {
        Value::Object(map) => Ok(map
            .iter()
            .map(|(k, v)| (k.clone(), FirestoreValue::from_json(v)))
            .collect()),
        _ => Err(AppError::Internal(
            "Document body must be a JSON object".to_string(),
        )),
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Document {
    pub name: String,
    #[serde(default)]
    pub fields: Fields,
    #[serde(rename = "createTime")]
    pub create_time: Option<String>,
    #[serde(rename = "updateTime")]
    pub update_time: Option<String>,
}

impl Document {
    /// Last segment of the full resource name.
    pub fn doc_id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    /// Plain JSON object with the document id injected under `"id"`, the
    /// same shape the mobile client builds from a snapshot.
    pub fn to_json(&self) -> Value {
        let mut map = serde_json::Map::new();
        map.insert("id".to_string(), json!(self.doc_id()));
        for (key, value) in &self.fields {
            map.insert(key.clone(), value.to_json());
        }
        Value::Object(map)
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.to_json())
    }
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    documents: Vec<Document>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QueryResult {
    #[serde(default)]
    document: Option<Document>,
}

#[derive(Clone)]
pub struct FirestoreService {
    client: Client,
    api_key: String,
    documents_url: String,
}

impl FirestoreService {
    pub fn new(project_id: &str, api_key: &str) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            documents_url: format!(
                "{}/projects/{}/databases/(default)/documents",
                FIRESTORE_HOST, project_id
            ),
        }
    }

    /// Fetch every document in a collection, following page tokens.
    pub async fn list(&self, collection: &str) -> AppResult<Vec<Document>> {
        let url = format!("{}/{}", self.documents_url, collection);
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![
                ("key".to_string(), self.api_key.clone()),
                ("pageSize".to_string(), "300".to_string()),
            ];
            if let Some(token) = &page_token {
                query.push(("pageToken".to_string(), token.clone()));
            }

            let response = self
                .client
                .get(&url)
                .query(&query)
                .send()
                .await
                .map_err(|e| AppError::Remote(format!("Firestore request failed: {}", e)))?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(AppError::Remote(format!(
                    "Firestore error {}: {}",
                    status, body
                )));
            }

            let page: ListResponse = response.json().await.map_err(|e| {
                AppError::Remote(format!("Failed to parse Firestore response: {}", e))
            })?;

            documents.extend(page.documents);
            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(documents)
    }

    /// Fetch one document. A missing document is `None`, not an error.
    pub async fn get(&self, collection: &str, doc_id: &str) -> AppResult<Option<Document>> {
        let url = format!("{}/{}/{}", self.documents_url, collection, doc_id);

        let response = self
            .client
            .get(&url)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| AppError::Remote(format!("Firestore request failed: {}", e)))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Remote(format!(
                "Firestore error {}: {}",
                status, body
            )));
        }

        let document = response
            .json()
            .await
            .map_err(|e| AppError::Remote(format!("Failed to parse Firestore response: {}", e)))?;

        Ok(Some(document))
    }

    /// Create a document with a server-assigned id.
    pub async fn create(&self, collection: &str, fields: Fields) -> AppResult<Document> {
        let url = format!("{}/{}", self.documents_url, collection);

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&json!({ "fields": fields }))
            .send()
            .await
            .map_err(|e| AppError::Remote(format!("Firestore request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Remote(format!(
                "Firestore error {}: {}",
                status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Remote(format!("Failed to parse Firestore response: {}", e)))
    }

    /// Full-document upsert under a known id.
    pub async fn set(&self, collection: &str, doc_id: &str, fields: Fields) -> AppResult<Document> {
        let url = format!("{}/{}/{}", self.documents_url, collection, doc_id);

        let response = self
            .client
            .patch(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&json!({ "fields": fields }))
            .send()
            .await
            .map_err(|e| AppError::Remote(format!("Firestore request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Remote(format!(
                "Firestore error {}: {}",
                status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Remote(format!("Failed to parse Firestore response: {}", e)))
    }

    /// Patch only the named fields of an existing document. The update mask
    /// keeps every other field untouched; the exists precondition turns a
    /// missing document into an error instead of an upsert.
    pub async fn update(
        &self,
        collection: &str,
        doc_id: &str,
        fields: Fields,
    ) -> AppResult<Document> {
        let url = format!("{}/{}/{}", self.documents_url, collection, doc_id);

        let mut query: Vec<(String, String)> = vec![
            ("key".to_string(), self.api_key.clone()),
            ("currentDocument.exists".to_string(), "true".to_string()),
        ];
        for field in fields.keys() {
            query.push(("updateMask.fieldPaths".to_string(), field.clone()));
        }

        let response = self
            .client
            .patch(&url)
            .query(&query)
            .json(&json!({ "fields": fields }))
            .send()
            .await
            .map_err(|e| AppError::Remote(format!("Firestore request failed: {}", e)))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!(
                "Document {}/{} not found",
                collection, doc_id
            )));
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Remote(format!(
                "Firestore error {}: {}",
                status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Remote(format!("Failed to parse Firestore response: {}", e)))
    }

    pub async fn delete(&self, collection: &str, doc_id: &str) -> AppResult<()> {
        let url = format!("{}/{}/{}", self.documents_url, collection, doc_id);

        let response = self
            .client
            .delete(&url)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| AppError::Remote(format!("Firestore request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Remote(format!(
                "Firestore error {}: {}",
                status, body
            )));
        }

        Ok(())
    }

    /// Single-field equality query, the only query shape the client uses
    /// (`cliente_id == uid`, `id_usuario == uid`, `id_categoria == id`).
    pub async fn query_equal(
        &self,
        collection: &str,
        field: &str,
        value: FirestoreValue,
    ) -> AppResult<Vec<Document>> {
        let url = format!("{}:runQuery", self.documents_url);

        let body = json!({
            "structuredQuery": {
                "from": [{ "collectionId": collection }],
                "where": {
                    "fieldFilter": {
                        "field": { "fieldPath": field },
                        "op": "EQUAL",
                        "value": value,
                    }
                }
            }
        });

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Remote(format!("Firestore request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Remote(format!(
                "Firestore error {}: {}",
                status, body
            )));
        }

        let results: Vec<QueryResult> = response
            .json()
            .await
            .map_err(|e| AppError::Remote(format!("Failed to parse Firestore response: {}", e)))?;

        // Partial result entries carry only a read time, no document.
        Ok(results.into_iter().filter_map(|r| r.document).collect())
    }
}
