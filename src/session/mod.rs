mod store;
mod user;

pub use store::{CredentialStore, Credentials, FileStore, MemoryStore};
pub use user::{Principal, Registration, Role};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use std::sync::{Arc, RwLock};

use crate::api::AuthAPI;
use crate::error::{invalid_input_error, Error};

#[derive(Debug, Deserialize)]
struct Claims {
    exp: i64,
}

/// Reads the `exp` claim out of a JWT without verifying the signature.
/// Verification belongs to the server; the client only needs to know
/// whether presenting the token is pointless.
pub fn decode_expiry(token: &str) -> Result<DateTime<Utc>, Error> {
    let payload = token.split('.').nth(1).ok_or_else(invalid_input_error)?;

    let raw = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| invalid_input_error())?;

    let claims: Claims = serde_json::from_slice(&raw)?;

    Utc.timestamp_opt(claims.exp, 0)
        .single()
        .ok_or_else(invalid_input_error)
}

/// Read-only view of the current access credential. Every outgoing
/// call reads through one of these; only the owning [`SessionStore`]
/// ever writes it.
#[derive(Clone, Default)]
pub struct SessionHandle {
    access: Arc<RwLock<Option<String>>>,
}

impl SessionHandle {
    pub fn access_token(&self) -> Option<String> {
        match self.access.read() {
            Ok(guard) => guard.clone(),
            Err(_) => None,
        }
    }

    fn set(&self, token: Option<String>) {
        if let Ok(mut guard) = self.access.write() {
            *guard = token;
        }
    }
}

/// Outcome of a session restore.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Restore {
    /// Credential live, principal resolved.
    Authenticated,
    /// Credential live, but the profile lookup failed transiently.
    /// The caller may retry; the credential is kept.
    Unresolved,
    /// No usable credential. The store has been torn down.
    LoggedOut,
}

/// Owns the process-wide session: the persisted credential pair and
/// the resolved principal.
pub struct SessionStore {
    store: Box<dyn CredentialStore>,
    handle: SessionHandle,
    principal: Option<Principal>,
}

impl SessionStore {
    pub fn new(store: Box<dyn CredentialStore>) -> Self {
        Self {
            store,
            handle: SessionHandle::default(),
            principal: None,
        }
    }

    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.principal.is_some()
    }

    /// Restores the session from persisted storage. An expired or
    /// undecodable credential is torn down locally, with no network
    /// call attempted using it. A live credential is installed first,
    /// then the principal is resolved through the profile endpoint:
    /// an auth-class failure there invalidates the session, while a
    /// transient failure keeps the credential for a later retry.
    #[tracing::instrument(skip_all)]
    pub async fn restore<A: AuthAPI + ?Sized>(&mut self, api: &A) -> Result<Restore, Error> {
        let credentials = match self.store.load()? {
            Some(credentials) => credentials,
            None => return Ok(Restore::LoggedOut),
        };

        match decode_expiry(&credentials.access) {
            Ok(expiry) if expiry > Utc::now() => {}
            _ => {
                tracing::info!("persisted credential expired or unreadable");
                self.teardown()?;
                return Ok(Restore::LoggedOut);
            }
        }

        self.handle.set(Some(credentials.access.clone()));

        match api.current_user().await {
            Ok(principal) => {
                tracing::info!(username = %principal.username, "session restored");
                self.principal = Some(principal);
                Ok(Restore::Authenticated)
            }
            Err(err) if err.is_auth() => {
                tracing::warn!("credential rejected by profile lookup");
                self.teardown()?;
                Ok(Restore::LoggedOut)
            }
            Err(err) => {
                tracing::warn!(code = err.code, "profile lookup failed, keeping credential");
                Ok(Restore::Unresolved)
            }
        }
    }

    #[tracing::instrument(skip(self, api, password))]
    pub async fn login<A: AuthAPI + ?Sized>(
        &mut self,
        api: &A,
        username: &str,
        password: &str,
    ) -> Result<Principal, Error> {
        let credentials = api.issue_token(username, password).await?;

        self.store.save(&credentials)?;
        self.handle.set(Some(credentials.access));

        let principal = api.current_user().await?;
        self.principal = Some(principal.clone());

        Ok(principal)
    }

    #[tracing::instrument(skip(self))]
    pub fn logout(&mut self) -> Result<(), Error> {
        self.teardown()
    }

    fn teardown(&mut self) -> Result<(), Error> {
        self.store.clear()?;
        self.handle.set(None);
        self.principal = None;

        Ok(())
    }
}
