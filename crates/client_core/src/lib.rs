use std::sync::Arc;

use shared::{
    domain::SortField,
    protocol::{CatalogEntry, Credentials},
};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

pub mod api;
pub mod draft;
pub mod error;
pub mod notification;
pub mod session;
pub mod sort;
pub mod token_store;

pub use api::{CatalogApi, HttpCatalogApi, DEFAULT_API_URL};
pub use draft::{DraftError, WineDraft};
pub use error::CatalogError;
pub use notification::{Notification, NotificationLevel};
pub use session::SessionState;
pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStore};

const NOTIFICATION_CAPACITY: usize = 64;

const LOGIN_FAILED: &str = "Login Failed";
const SIGNUP_SUCCESSFUL: &str = "Signup Successful";
const SIGNUP_FAILED: &str = "Signup Failed";
const LOAD_FAILED: &str = "Could not load wines";
const ADD_FAILED: &str = "Could not add wine";
const SESSION_EXPIRED: &str = "Session Expired";

/// Owns the session, the catalog snapshot and the notification channel.
///
/// All mutation goes through `&mut self`, so operations run one at a time and the
/// snapshot is always the full result of the last successful fetch.
pub struct CatalogController {
    api: Arc<dyn CatalogApi>,
    tokens: Arc<dyn TokenStore>,
    session: SessionState,
    snapshot: Vec<CatalogEntry>,
    snapshot_stale: bool,
    events: broadcast::Sender<Notification>,
}

impl CatalogController {
    /// Starts logged out, ignoring anything in the token store.
    pub fn new(api: Arc<dyn CatalogApi>, tokens: Arc<dyn TokenStore>) -> Self {
        let (events, _) = broadcast::channel(NOTIFICATION_CAPACITY);
        Self {
            api,
            tokens,
            session: SessionState::LoggedOut,
            snapshot: Vec::new(),
            snapshot_stale: false,
            events,
        }
    }

    /// Reads the persisted token once. A token found there puts the session in
    /// `PendingValidation` until the next catalog fetch settles it.
    pub async fn restore(
        api: Arc<dyn CatalogApi>,
        tokens: Arc<dyn TokenStore>,
    ) -> Result<Self, CatalogError> {
        let stored = tokens.load().await.map_err(CatalogError::TokenStore)?;
        let mut controller = Self::new(api, tokens);
        controller.session = SessionState::restored(stored);
        info!(
            session = controller.session.label(),
            "catalog: session restored from token store"
        );
        Ok(controller)
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.is_logged_in()
    }

    pub fn snapshot(&self) -> &[CatalogEntry] {
        &self.snapshot
    }

    /// True after a failed fetch left an older snapshot in place.
    pub fn is_snapshot_stale(&self) -> bool {
        self.snapshot_stale
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.events.subscribe()
    }

    pub async fn authenticate(&mut self, email: &str, password: &str) -> Result<(), CatalogError> {
        let credentials = Credentials::new(email, password);
        let response = match self.api.login(&credentials).await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "catalog: login failed");
                return Err(self.fail(LOGIN_FAILED, err));
            }
        };

        if let Err(err) = self.tokens.save(&response.access_token).await {
            warn!(error = %err, "catalog: could not persist access token");
        }
        self.session = SessionState::LoggedIn {
            token: response.access_token,
        };
        info!("catalog: logged in");

        self.refresh_catalog().await.map(|_| ())
    }

    /// Creates an account. Never logs in; the user authenticates separately.
    pub async fn register(&mut self, email: &str, password: &str) -> Result<(), CatalogError> {
        let credentials = Credentials::new(email, password);
        match self.api.signup(&credentials).await {
            Ok(()) => {
                info!("catalog: signup accepted");
                self.publish(Notification::success(SIGNUP_SUCCESSFUL, "You can now login"));
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "catalog: signup failed");
                Err(self.fail(SIGNUP_FAILED, err))
            }
        }
    }

    /// Replaces the snapshot with the server's catalog.
    ///
    /// On failure the previous snapshot is kept and flagged stale. A refused token
    /// ends the session.
    pub async fn refresh_catalog(&mut self) -> Result<&[CatalogEntry], CatalogError> {
        let Some(token) = self.session.token().map(str::to_owned) else {
            return Err(self.fail(LOAD_FAILED, CatalogError::NotLoggedIn));
        };

        match self.api.list_wines(&token).await {
            Ok(entries) => {
                self.snapshot = entries;
                self.snapshot_stale = false;
                self.session.confirm();
                debug!(count = self.snapshot.len(), "catalog: snapshot replaced");
                Ok(&self.snapshot)
            }
            Err(err) => {
                error!(error = %err, "catalog: fetch failed");
                self.snapshot_stale = true;
                if err.is_unauthorized() {
                    self.expire_session().await;
                }
                Err(self.fail(LOAD_FAILED, err))
            }
        }
    }

    /// Submits `draft`, then reloads the catalog. The draft is cleared once the
    /// server accepts it.
    pub async fn add_entry(
        &mut self,
        draft: &mut WineDraft,
    ) -> Result<&[CatalogEntry], CatalogError> {
        let Some(token) = self.session.token().map(str::to_owned) else {
            return Err(self.fail(ADD_FAILED, CatalogError::NotLoggedIn));
        };
        let entry = match draft.validate() {
            Ok(entry) => entry,
            Err(err) => {
                debug!(error = %err, "catalog: draft rejected");
                return Err(self.fail(ADD_FAILED, err.into()));
            }
        };

        if let Err(err) = self.api.create_wine(&token, &entry).await {
            error!(error = %err, title = %entry.title, "catalog: create failed");
            if err.is_unauthorized() {
                self.expire_session().await;
            }
            return Err(self.fail(ADD_FAILED, err));
        }
        info!(title = %entry.title, year = entry.year, "catalog: wine added");
        draft.clear();

        self.refresh_catalog().await
    }

    /// Sorted copy of the snapshot; recomputed on every call.
    pub fn sorted(&self, field: SortField) -> Vec<CatalogEntry> {
        sort::sorted_entries(&self.snapshot, field)
    }

    pub async fn logout(&mut self) -> Result<(), CatalogError> {
        self.tokens
            .clear()
            .await
            .map_err(CatalogError::TokenStore)?;
        self.session = SessionState::LoggedOut;
        self.snapshot.clear();
        self.snapshot_stale = false;
        info!("catalog: logged out");
        Ok(())
    }

    async fn expire_session(&mut self) {
        if let Err(err) = self.tokens.clear().await {
            warn!(error = %err, "catalog: could not clear rejected token");
        }
        self.session = SessionState::LoggedOut;
        self.snapshot.clear();
        self.snapshot_stale = false;
        warn!("catalog: token rejected, session ended");
        self.publish(Notification::info(SESSION_EXPIRED, "Please log in again"));
    }

    fn fail(&self, title: &str, err: CatalogError) -> CatalogError {
        self.publish(Notification::error(title, err.user_message()));
        err
    }

    fn publish(&self, notification: Notification) {
        // No subscribers is fine; the error is also returned to the caller.
        let _ = self.events.send(notification);
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
