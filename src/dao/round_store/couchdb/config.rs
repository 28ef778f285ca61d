use std::{env, time::Duration};

use super::error::{CouchDaoError, CouchResult};

/// Upper bound applied to every CouchDB request unless `COUCH_TIMEOUT_MS` says otherwise.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Where the round documents live and how to authenticate.
#[derive(Debug, Clone)]
pub struct CouchConfig {
    pub base_url: String,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub request_timeout: Duration,
}

impl CouchConfig {
    pub fn new(base_url: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            database: database.into(),
            username: None,
            password: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Attach basic-auth credentials.
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout.max(Duration::from_millis(1));
        self
    }

    /// Read `COUCH_BASE_URL` and `COUCH_DB` (required), plus the optional
    /// `COUCH_USERNAME`/`COUCH_PASSWORD` pair and `COUCH_TIMEOUT_MS`.
    pub fn from_env() -> CouchResult<Self> {
        let required = |var: &'static str| {
            env::var(var)
                .ok()
                .filter(|value| !value.trim().is_empty())
                .ok_or(CouchDaoError::MissingEnvVar { var })
        };

        let mut config = Self::new(required("COUCH_BASE_URL")?, required("COUCH_DB")?);

        if let (Ok(username), Ok(password)) = (env::var("COUCH_USERNAME"), env::var("COUCH_PASSWORD"))
        {
            config = config.with_credentials(username, password);
        }

        if let Some(timeout_ms) = env::var("COUCH_TIMEOUT_MS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
        {
            config = config.with_request_timeout(Duration::from_millis(timeout_ms));
        }

        Ok(config)
    }
}
