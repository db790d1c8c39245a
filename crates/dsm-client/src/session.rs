//! Session lifecycle: login, SID reuse, relogin on expiry, logout.

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::api::{ApiClient, ApiRequest};
use crate::{DsmConfig, DsmError};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    LoggedOut,
    LoggedIn {
        sid: String,
    },
}

/// Where the SID handed out by [`SessionManager::ensure_session`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOrigin {
    Cached,
    NewLogin,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnsuredSession {
    pub sid: String,
    pub origin: SessionOrigin,
}

/// Owns the SID for one DSM account.
///
/// The state sits behind a mutex that is held across the login request, so
/// concurrent callers never trigger more than one login.
pub struct SessionManager {
    api: ApiClient,
    account: String,
    password: SecretString,
    session_name: String,
    auth_version: u32,
    state: Mutex<SessionState>,
}

impl SessionManager {
    pub fn new(api: ApiClient, config: &DsmConfig) -> Self {
        Self {
            api,
            account: config.account.clone(),
            password: config.password.clone(),
            session_name: config.session_name.clone(),
            auth_version: config.api_version,
            state: Mutex::new(SessionState::LoggedOut),
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub async fn state(&self) -> SessionState {
        self.state.lock().await.clone()
    }

    pub async fn is_logged_in(&self) -> bool {
        matches!(*self.state.lock().await, SessionState::LoggedIn { .. })
    }

    /// Returns the cached SID, logging in first when there is none.
    pub async fn ensure_session(&self) -> Result<EnsuredSession, DsmError> {
        let mut state = self.state.lock().await;
        if let SessionState::LoggedIn { sid } = &*state {
            return Ok(EnsuredSession {
                sid: sid.clone(),
                origin: SessionOrigin::Cached,
            });
        }

        let sid = self.login_locked(&mut state).await?;
        Ok(EnsuredSession {
            sid,
            origin: SessionOrigin::NewLogin,
        })
    }

    /// Logs in unconditionally and replaces any cached SID.
    pub async fn login(&self) -> Result<String, DsmError> {
        let mut state = self.state.lock().await;
        self.login_locked(&mut state).await
    }

    async fn login_locked(&self, state: &mut SessionState) -> Result<String, DsmError> {
        *state = SessionState::LoggedOut;

        let request = ApiRequest::auth(self.auth_version, "login")
            .param("account", self.account.clone())
            .param("passwd", self.password.expose_secret())
            .param("session", self.session_name.clone())
            .param("format", "sid")
            .into_form();

        tracing::info!(
            account = %self.account,
            session = %self.session_name,
            "Logging in to DSM"
        );

        let envelope = self
            .api
            .call(&request, None)
            .await
            .map_err(|e| DsmError::Authentication {
                code: None,
                reason: e.to_string(),
            })?;

        let data = envelope
            .into_result(request.api, request.method)
            .map_err(|e| DsmError::Authentication {
                code: e.code(),
                reason: e.remote_message(),
            })?;

        let sid = data
            .get("sid")
            .and_then(Value::as_str)
            .filter(|sid| !sid.is_empty())
            .ok_or_else(|| DsmError::Authentication {
                code: None,
                reason: "login response did not contain a session id".to_string(),
            })?
            .to_string();

        *state = SessionState::LoggedIn { sid: sid.clone() };
        tracing::info!(account = %self.account, "DSM session established");
        Ok(sid)
    }

    /// Ends the session if there is one. Never fails; the cached SID is
    /// dropped whatever the remote side answers.
    pub async fn logout(&self) {
        let mut state = self.state.lock().await;
        let SessionState::LoggedIn { sid } = std::mem::take(&mut *state) else {
            tracing::debug!("Logout requested without an active session");
            return;
        };

        let request = ApiRequest::auth(self.auth_version, "logout")
            .param("session", self.session_name.clone());

        match self.api.send(&request, Some(&sid)).await {
            Ok(_) => tracing::info!(account = %self.account, "Logged out of DSM"),
            Err(e) => tracing::warn!(error = %e, "DSM logout failed, session dropped locally"),
        }
    }

    /// Drops the cached SID if it is still `stale_sid`.
    ///
    /// A different SID means another caller already logged in again.
    pub async fn invalidate(&self, stale_sid: &str) {
        let mut state = self.state.lock().await;
        if matches!(&*state, SessionState::LoggedIn { sid } if sid == stale_sid) {
            tracing::info!("DSM session expired, clearing cached session id");
            *state = SessionState::LoggedOut;
        }
    }

    /// Runs `request` with the current SID, recovering once from an expired
    /// session by logging in again and resending.
    pub async fn execute(&self, request: &ApiRequest) -> Result<Value, DsmError> {
        let session = self.ensure_session().await?;
        match self.api.send(request, Some(&session.sid)).await {
            Err(DsmError::SessionExpired { code }) => {
                tracing::warn!(
                    code,
                    api = request.api,
                    method = request.method,
                    "Session expired, logging in again"
                );
                self.invalidate(&session.sid).await;
                let session = self.ensure_session().await?;
                self.api.send(request, Some(&session.sid)).await
            }
            other => other,
        }
    }

    /// Like [`Self::execute`] for requests that answer with raw file content.
    pub async fn execute_download(&self, request: &ApiRequest) -> Result<Vec<u8>, DsmError> {
        let session = self.ensure_session().await?;
        match self.api.download(request, Some(&session.sid)).await {
            Err(DsmError::SessionExpired { code }) => {
                tracing::warn!(
                    code,
                    api = request.api,
                    "Session expired during download, logging in again"
                );
                self.invalidate(&session.sid).await;
                let session = self.ensure_session().await?;
                self.api.download(request, Some(&session.sid)).await
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn starts_logged_out() {
        let config = DsmConfig::new("http://127.0.0.1:9", "admin", "pw");
        let manager = SessionManager::new(ApiClient::new(&config).unwrap(), &config);
        assert_eq!(manager.state().await, SessionState::LoggedOut);
        assert!(!manager.is_logged_in().await);
    }

    #[tokio::test]
    async fn logout_without_session_is_a_no_op() {
        let config = DsmConfig::new("http://127.0.0.1:9", "admin", "pw");
        let manager = SessionManager::new(ApiClient::new(&config).unwrap(), &config);
        manager.logout().await;
        manager.logout().await;
        assert_eq!(manager.state().await, SessionState::LoggedOut);
    }
}
