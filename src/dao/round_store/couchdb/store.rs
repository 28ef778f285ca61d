use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use tracing::debug;

use crate::dao::{
    round_store::{Revision, RoundStore, Versioned, WriteOutcome},
    storage::StorageResult,
};

use super::{
    config::CouchConfig,
    error::{CouchDaoError, CouchResult},
    models::{CouchDocument, WriteResponse},
};

/// [`RoundStore`] backed by a CouchDB database, using `_rev` for conditional writes.
#[derive(Clone)]
pub struct CouchRoundStore {
    client: Client,
    base_url: Arc<str>,
    database: Arc<str>,
    auth: Option<(Arc<str>, Arc<str>)>,
}

impl CouchRoundStore {
    /// Establish a connection to CouchDB and ensure the database exists.
    pub async fn connect(config: CouchConfig) -> CouchResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|source| CouchDaoError::ClientBuilder { source })?;

        let base_url = Arc::<str>::from(config.base_url.trim_end_matches('/'));
        let database = Arc::<str>::from(config.database);
        let auth = config
            .username
            .zip(config.password)
            .map(|(u, p)| (Arc::<str>::from(u), Arc::<str>::from(p)));

        let store = Self {
            client,
            base_url,
            database,
            auth,
        };

        store.ensure_database().await?;
        Ok(store)
    }

    fn database_url(&self) -> String {
        format!("{}/{}", self.base_url, self.database)
    }

    fn request(&self, method: Method, url: &str) -> reqwest::RequestBuilder {
        let builder = self.client.request(method, url);
        match self.auth {
            Some((ref user, ref pass)) => builder.basic_auth(user.as_ref(), Some(pass.as_ref())),
            None => builder,
        }
    }

    fn document_request(&self, method: Method, doc_id: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", self.database_url(), doc_id);
        self.request(method, &url)
    }

    async fn ensure_database(&self) -> CouchResult<()> {
        let database = self.database.to_string();
        let url = self.database_url();

        let response = self
            .request(Method::GET, &url)
            .send()
            .await
            .map_err(|source| CouchDaoError::PrepareDatabase {
                database: database.clone(),
                source,
            })?;

        match response.status() {
            StatusCode::OK => Ok(()),
            StatusCode::NOT_FOUND => {
                let create = self
                    .request(Method::PUT, &url)
                    .send()
                    .await
                    .map_err(|source| CouchDaoError::PrepareDatabase {
                        database: database.clone(),
                        source,
                    })?;
                // 412 means a concurrent instance created it first.
                if create.status().is_success() || create.status() == StatusCode::PRECONDITION_FAILED
                {
                    Ok(())
                } else {
                    Err(CouchDaoError::DatabaseStatus {
                        database,
                        status: create.status(),
                    })
                }
            }
            other => Err(CouchDaoError::DatabaseStatus {
                database,
                status: other,
            }),
        }
    }

    async fn get_document(&self, doc_id: &str) -> CouchResult<Option<CouchDocument>> {
        let response = self
            .document_request(Method::GET, doc_id)
            .send()
            .await
            .map_err(|source| CouchDaoError::Transport {
                target: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => response
                .json::<CouchDocument>()
                .await
                .map(Some)
                .map_err(|source| CouchDaoError::Decode {
                    target: doc_id.to_string(),
                    source,
                }),
            other => Err(CouchDaoError::UnexpectedStatus {
                target: doc_id.to_string(),
                status: other,
            }),
        }
    }

    async fn put_document(&self, document: &CouchDocument) -> CouchResult<WriteOutcome> {
        let response = self
            .document_request(Method::PUT, &document.id)
            .json(document)
            .send()
            .await
            .map_err(|source| CouchDaoError::Transport {
                target: document.id.clone(),
                source,
            })?;

        match response.status() {
            StatusCode::CONFLICT => {
                debug!(doc_id = %document.id, "CouchDB rejected stale revision");
                Ok(WriteOutcome::Conflict)
            }
            status if status.is_success() => {
                let body = response.json::<WriteResponse>().await.map_err(|source| {
                    CouchDaoError::Decode {
                        target: document.id.clone(),
                        source,
                    }
                })?;
                Ok(WriteOutcome::Stored(Revision::new(body.rev)))
            }
            other => Err(CouchDaoError::UnexpectedStatus {
                target: document.id.clone(),
                status: other,
            }),
        }
    }
}

impl RoundStore for CouchRoundStore {
    fn load(&self, key: &'static str) -> BoxFuture<'static, StorageResult<Option<Versioned<Value>>>> {
        let store = self.clone();
        Box::pin(async move {
            let maybe_doc = store.get_document(key).await?;
            Ok(maybe_doc.and_then(|doc| {
                doc.rev.map(|rev| Versioned {
                    revision: Revision::new(rev),
                    value: doc.payload,
                })
            }))
        })
    }

    fn compare_and_set(
        &self,
        key: &'static str,
        expected: Option<Revision>,
        value: Value,
    ) -> BoxFuture<'static, StorageResult<WriteOutcome>> {
        let store = self.clone();
        Box::pin(async move {
            let document = CouchDocument {
                id: key.to_string(),
                rev: expected.map(|revision| revision.as_str().to_string()),
                payload: value,
            };
            store.put_document(&document).await.map_err(Into::into)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let url = store.database_url();
            let response = store
                .request(Method::GET, &url)
                .send()
                .await
                .map_err(|source| CouchDaoError::Transport {
                    target: url.clone(),
                    source,
                })?;

            if response.status().is_success() {
                Ok(())
            } else {
                Err(CouchDaoError::UnexpectedStatus {
                    target: url,
                    status: response.status(),
                }
                .into())
            }
        })
    }
}
