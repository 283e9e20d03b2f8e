//! Transport seam for the sync client.
//!
//! The remote contract is a small JSON-over-HTTP API: responses carry
//! either a `results` payload or an `error` string. [`HttpRemote`] talks
//! to a real server; tests drive the client through an in-memory fake.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::RemoteError;

/// A secret as listed by the remote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSecretInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Operations the sync client needs from a remote server.
#[async_trait]
pub trait Remote: Send + Sync {
    /// Registers a new account for `fingerprint`.
    async fn create_user(
        &self,
        fingerprint: &str,
        public_key: &str,
        password: &str,
    ) -> Result<(), RemoteError>;

    /// Exchanges fingerprint + password for a session token.
    async fn login(&self, fingerprint: &str, password: &str) -> Result<String, RemoteError>;

    /// Probes whether a session token is still accepted.
    async fn whoami(&self, jwt: &str) -> Result<(), RemoteError>;

    /// Lists the secrets stored for the authenticated account.
    async fn list_secrets(&self, jwt: &str) -> Result<Vec<RemoteSecretInfo>, RemoteError>;

    /// Fetches the ciphertext of a named secret.
    async fn fetch_secret(&self, jwt: &str, name: &str) -> Result<Vec<u8>, RemoteError>;

    /// Creates a named secret holding `ciphertext`.
    async fn add_secret(
        &self,
        jwt: &str,
        name: &str,
        kind: &str,
        ciphertext: &[u8],
    ) -> Result<(), RemoteError>;

    /// Replaces the ciphertext of an existing secret.
    async fn update_secret(&self, jwt: &str, name: &str, ciphertext: &[u8])
        -> Result<(), RemoteError>;
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    results: Option<T>,
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreateUserBody<'a> {
    fingerprint: &'a str,
    #[serde(rename = "publicKey")]
    public_key: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct LoginBody<'a> {
    fingerprint: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct AddSecretBody<'a> {
    secret: String,
    name: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
}

#[derive(Debug, Serialize)]
struct UpdateSecretBody {
    secret: String,
}

/// [`Remote`] implementation over HTTP.
///
/// Ciphertext travels base64-encoded inside JSON bodies and comes back
/// base64-encoded in the fetch response body.
#[derive(Debug, Clone)]
pub struct HttpRemote {
    base_url: String,
    client: reqwest::Client,
}

impl HttpRemote {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Unwraps the `{ results } | { error }` envelope, mapping error
    /// strings onto the error taxonomy.
    fn unwrap_envelope<T>(envelope: Envelope<T>) -> Result<T, RemoteError> {
        if let Some(error) = envelope.error {
            return Err(RemoteError::classify(&error));
        }
        envelope
            .results
            .ok_or_else(|| RemoteError::Protocol("response carried neither results nor error".to_string()))
    }

    async fn read_envelope<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, RemoteError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        match serde_json::from_str::<Envelope<T>>(&body) {
            Ok(envelope) => Self::unwrap_envelope(envelope),
            Err(_) if status == reqwest::StatusCode::UNAUTHORIZED => Err(RemoteError::Unauthorized),
            Err(_) if status == reqwest::StatusCode::NOT_FOUND => {
                Err(RemoteError::NotFound(body.trim().to_string()))
            }
            Err(e) => Err(RemoteError::Protocol(e.to_string())),
        }
    }
}

#[async_trait]
impl Remote for HttpRemote {
    async fn create_user(
        &self,
        fingerprint: &str,
        public_key: &str,
        password: &str,
    ) -> Result<(), RemoteError> {
        debug!(fingerprint, "creating remote account");
        let response = self
            .client
            .post(self.url("/users/create"))
            .json(&CreateUserBody {
                fingerprint,
                public_key,
                password,
            })
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        Self::read_envelope::<String>(response).await.map(|_| ())
    }

    async fn login(&self, fingerprint: &str, password: &str) -> Result<String, RemoteError> {
        debug!(fingerprint, "logging in");
        let response = self
            .client
            .post(self.url("/login"))
            .json(&LoginBody {
                fingerprint,
                password,
            })
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        Self::read_envelope::<String>(response).await
    }

    async fn whoami(&self, jwt: &str) -> Result<(), RemoteError> {
        let response = self
            .client
            .get(self.url("/user"))
            .header("Authorization", jwt)
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        if response.status().is_success() {
            return Ok(());
        }
        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(RemoteError::Unauthorized);
        }
        Self::read_envelope::<String>(response).await.map(|_| ())
    }

    async fn list_secrets(&self, jwt: &str) -> Result<Vec<RemoteSecretInfo>, RemoteError> {
        let response = self
            .client
            .get(self.url("/secrets/list"))
            .header("Authorization", jwt)
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        Self::read_envelope::<Vec<RemoteSecretInfo>>(response).await
    }

    async fn fetch_secret(&self, jwt: &str, name: &str) -> Result<Vec<u8>, RemoteError> {
        let response = self
            .client
            .get(self.url(&format!("/secrets/{}", name)))
            .header("Authorization", jwt)
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(RemoteError::Unauthorized);
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(RemoteError::NotFound(name.to_string()));
        }
        if !status.is_success() {
            return Err(RemoteError::Protocol(format!(
                "fetch of '{}' returned status {}",
                name, status
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        // The stored payload is base64 as uploaded; tolerate servers
        // that return the decoded ciphertext directly.
        match BASE64.decode(body.as_ref()) {
            Ok(decoded) => Ok(decoded),
            Err(_) => Ok(body.to_vec()),
        }
    }

    async fn add_secret(
        &self,
        jwt: &str,
        name: &str,
        kind: &str,
        ciphertext: &[u8],
    ) -> Result<(), RemoteError> {
        debug!(name, "creating remote secret");
        let response = self
            .client
            .post(self.url("/secrets"))
            .header("Authorization", jwt)
            .json(&AddSecretBody {
                secret: BASE64.encode(ciphertext),
                name,
                kind,
            })
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        Self::read_envelope::<String>(response).await.map(|_| ())
    }

    async fn update_secret(
        &self,
        jwt: &str,
        name: &str,
        ciphertext: &[u8],
    ) -> Result<(), RemoteError> {
        debug!(name, "updating remote secret");
        let response = self
            .client
            .post(self.url(&format!("/secrets/{}", name)))
            .header("Authorization", jwt)
            .json(&UpdateSecretBody {
                secret: BASE64.encode(ciphertext),
            })
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        Self::read_envelope::<String>(response).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let remote = HttpRemote::new("https://vault.example.com/");
        assert_eq!(remote.base_url(), "https://vault.example.com");
        assert_eq!(remote.url("/login"), "https://vault.example.com/login");
    }

    #[test]
    fn test_envelope_error_classification() {
        let envelope: Envelope<String> = serde_json::from_str(r#"{"error":"Unauthorized"}"#).unwrap();
        assert!(matches!(
            HttpRemote::unwrap_envelope(envelope),
            Err(RemoteError::Unauthorized)
        ));

        let envelope: Envelope<String> =
            serde_json::from_str(r#"{"error":"User already exists"}"#).unwrap();
        assert!(matches!(
            HttpRemote::unwrap_envelope(envelope),
            Err(RemoteError::AccountExists)
        ));

        let envelope: Envelope<String> = serde_json::from_str(r#"{"results":"tok"}"#).unwrap();
        assert_eq!(HttpRemote::unwrap_envelope(envelope).unwrap(), "tok");
    }

    #[test]
    fn test_envelope_empty_is_protocol_error() {
        let envelope: Envelope<String> = serde_json::from_str("{}").unwrap();
        assert!(matches!(
            HttpRemote::unwrap_envelope(envelope),
            Err(RemoteError::Protocol(_))
        ));
    }

    #[test]
    fn test_secret_info_type_field_name() {
        let info: RemoteSecretInfo =
            serde_json::from_str(r#"{"name":"vault","type":"tagvault"}"#).unwrap();
        assert_eq!(info.name, "vault");
        assert_eq!(info.kind, "tagvault");
    }
}
