//! Failures of the CouchDB round store.

use reqwest::StatusCode;
use thiserror::Error;

/// Convenient result alias returning [`CouchDaoError`] failures.
pub type CouchResult<T> = Result<T, CouchDaoError>;

/// Failures that can occur while talking to CouchDB.
#[derive(Debug, Error)]
pub enum CouchDaoError {
    /// Required environment variable is missing.
    #[error("missing CouchDB environment variable `{var}`")]
    MissingEnvVar { var: &'static str },
    #[error("failed to build CouchDB client")]
    ClientBuilder {
        #[source]
        source: reqwest::Error,
    },
    /// Looking up or creating the database failed at the transport level.
    #[error("could not prepare CouchDB database `{database}`")]
    PrepareDatabase {
        database: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("CouchDB answered {status} while preparing database `{database}`")]
    DatabaseStatus {
        database: String,
        status: StatusCode,
    },
    /// The request never got an answer (connection refused, timeout...).
    #[error("CouchDB request for `{target}` failed")]
    Transport {
        target: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("CouchDB answered {status} for `{target}`")]
    UnexpectedStatus { target: String, status: StatusCode },
    #[error("unreadable CouchDB response for `{target}`")]
    Decode {
        target: String,
        #[source]
        source: reqwest::Error,
    },
}
