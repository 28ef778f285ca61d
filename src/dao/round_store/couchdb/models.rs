use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Stored JSON value wrapped with CouchDB's `_id`/`_rev` bookkeeping fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    pub payload: Value,
}

/// Body returned by CouchDB after a successful document write.
#[derive(Debug, Deserialize)]
pub struct WriteResponse {
    pub rev: String,
}
