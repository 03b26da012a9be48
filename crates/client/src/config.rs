use academy_core::pagination::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

use crate::api::HttpEntityApi;

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base URL of the API, without the resource (e.g. `http://localhost:3000/api/v1`).
    pub api_url: String,
    /// Bearer token sent with every request.
    pub token: Option<String>,
    /// Initial page size of list controllers.
    pub page_size: i64,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("{var} has invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

impl ClientConfig {
    /// Load configuration from `.env` (if present) and the process environment.
    ///
    /// | Env Var             | Default                        |
    /// |---------------------|--------------------------------|
    /// | `ACADEMY_API_URL`   | `http://localhost:3000/api/v1` |
    /// | `ACADEMY_API_TOKEN` | unset                          |
    /// | `ACADEMY_PAGE_SIZE` | `10`                           |
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_url = lookup("ACADEMY_API_URL")
            .unwrap_or_else(|| "http://localhost:3000/api/v1".into())
            .trim_end_matches('/')
            .to_string();
        if !api_url.starts_with("http://") && !api_url.starts_with("https://") {
            return Err(ConfigError::Invalid {
                var: "ACADEMY_API_URL",
                value: api_url,
                reason: "expected an http(s) URL".into(),
            });
        }

        let token = lookup("ACADEMY_API_TOKEN").filter(|t| !t.trim().is_empty());

        let page_size = match lookup("ACADEMY_PAGE_SIZE") {
            None => DEFAULT_PAGE_SIZE,
            Some(value) => match value.trim().parse::<i64>() {
                Ok(size) if (1..=MAX_PAGE_SIZE).contains(&size) => size,
                Ok(_) => {
                    return Err(ConfigError::Invalid {
                        var: "ACADEMY_PAGE_SIZE",
                        value,
                        reason: format!("must be between 1 and {MAX_PAGE_SIZE}"),
                    })
                }
                Err(e) => {
                    return Err(ConfigError::Invalid {
                        var: "ACADEMY_PAGE_SIZE",
                        reason: e.to_string(),
                        value,
                    })
                }
            },
        };

        Ok(Self {
            api_url,
            token,
            page_size,
        })
    }

    /// An HTTP collaborator for `resource` (e.g. `"trainings"`).
    pub fn api_for<E>(&self, client: reqwest::Client, resource: &str) -> HttpEntityApi<E> {
        HttpEntityApi::with_client(client, format!("{}/{resource}", self.api_url))
            .with_token(self.token.clone())
    }
}
