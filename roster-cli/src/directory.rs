//! HTTP [`AccountDirectory`] backed by `ureq`.
//!
//! | Call             | Request                                              |
//! |------------------|------------------------------------------------------|
//! | `fetch_roster`   | `GET  {base}/orgs/{org_id}/students`                 |
//! | `set_password`   | `PUT  {base}/users/{username}/password` `{password}` |
//! | `enable_service` | `POST {base}/users/{username}/services/{service}`    |

use std::time::Duration;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use roster_core::{DirectoryConfig, StudentRecord, Username};
use roster_sync::{AccountDirectory, DirectoryError};

/// One roster row as the directory returns it.
#[derive(Debug, Clone, Deserialize)]
struct RemoteStudent {
    id: String,
    username: String,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    #[serde(default)]
    year_level: String,
    #[serde(default)]
    class_name: String,
    #[serde(default)]
    email: Option<String>,
}

impl From<RemoteStudent> for StudentRecord {
    fn from(s: RemoteStudent) -> Self {
        StudentRecord {
            username: Username(s.username.trim().to_string()),
            first_name: s.first_name,
            last_name: s.last_name,
            year_level: s.year_level,
            class_name: s.class_name,
            email: s.email.unwrap_or_default(),
            secret: None,
            remote_ref: Some(s.id),
        }
    }
}

#[derive(Serialize)]
struct PasswordBody<'a> {
    password: &'a str,
}

pub struct HttpDirectory {
    agent: ureq::Agent,
    base_url: String,
    token: String,
}

impl HttpDirectory {
    /// Build a client from config; the bearer token is read from `token_env`.
    pub fn from_config(config: &DirectoryConfig) -> Result<Self> {
        let token = match std::env::var(&config.token_env) {
            Ok(token) if !token.trim().is_empty() => token,
            _ => bail!(
                "directory token missing: set the {} environment variable",
                config.token_env
            ),
        };
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build();
        Ok(Self {
            agent,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn url(&self, segments: &[&str]) -> String {
        let mut url = self.base_url.clone();
        for segment in segments {
            url.push('/');
            url.push_str(&urlencoding::encode(segment));
        }
        url
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

impl AccountDirectory for HttpDirectory {
    fn fetch_roster(&self, org_id: &str) -> Result<Vec<StudentRecord>, DirectoryError> {
        let url = self.url(&["orgs", org_id, "students"]);
        tracing::debug!("GET {url}");
        let response = self
            .agent
            .get(&url)
            .set("Authorization", &self.bearer())
            .set("Accept", "application/json")
            .call()
            .map_err(|e| map_ureq_error(e, Call::Fetch))?;
        let rows: Vec<RemoteStudent> = response
            .into_json()
            .map_err(|e| DirectoryError::Unavailable(format!("malformed roster payload: {e}")))?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            if row.username.trim().is_empty() {
                tracing::warn!(remote_ref = %row.id, "skipping roster row without a username");
                continue;
            }
            records.push(StudentRecord::from(row));
        }
        Ok(records)
    }

    fn set_password(&self, username: &Username, secret: &str) -> Result<(), DirectoryError> {
        let url = self.url(&["users", username.as_str(), "password"]);
        self.agent
            .put(&url)
            .set("Authorization", &self.bearer())
            .send_json(PasswordBody { password: secret })
            .map_err(|e| map_ureq_error(e, Call::Mutation))?;
        Ok(())
    }

    fn enable_service(&self, username: &Username, service: &str) -> Result<(), DirectoryError> {
        let url = self.url(&["users", username.as_str(), "services", service]);
        self.agent
            .post(&url)
            .set("Authorization", &self.bearer())
            .call()
            .map_err(|e| map_ureq_error(e, Call::Mutation))?;
        Ok(())
    }
}

#[derive(Clone, Copy)]
enum Call {
    Fetch,
    Mutation,
}

fn map_ureq_error(err: ureq::Error, call: Call) -> DirectoryError {
    match err {
        ureq::Error::Status(status, response) => map_status(status, body_of(response), call),
        ureq::Error::Transport(transport) => DirectoryError::Unavailable(transport.to_string()),
    }
}

/// 401/403 are credential problems on any call; other statuses depend on the call.
fn map_status(status: u16, body: String, call: Call) -> DirectoryError {
    match (status, call) {
        (401 | 403, _) => DirectoryError::AuthenticationFailed(format!("status {status}: {body}")),
        (_, Call::Fetch) => DirectoryError::Unavailable(format!("status {status}: {body}")),
        (_, Call::Mutation) => DirectoryError::Rejected {
            status,
            message: body,
        },
    }
}

fn body_of(response: ureq::Response) -> String {
    response
        .into_string()
        .map(|s| s.trim().chars().take(200).collect())
        .unwrap_or_default()
}
