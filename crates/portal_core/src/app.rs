//! Composition root: session gating on top, one dashboard orchestrator per
//! authenticated user session underneath.

use std::sync::Arc;

use anyhow::Result;
use shared::{
    domain::Role,
    protocol::{AuthResponse, LoginRequest, RegisterRequest},
};
use tokio::{sync::broadcast, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::{
    api::BankingApi,
    error::PortalError,
    orchestrator::{ViewOrchestrator, ViewState},
    payments::PaymentSubmitter,
    session::{Credential, Session, SessionController, View, ViewTarget, ROOT_PATH},
    PortalEvent,
};

// Resolves needed for the longest chain: unknown path, then "/", then the
// role home that renders.
const MAX_REDIRECT_HOPS: usize = 3;

pub struct PortalApp {
    api: Arc<dyn BankingApi>,
    session: SessionController,
    orchestrator: Option<Arc<ViewOrchestrator>>,
    pending_sync: Option<JoinHandle<ViewState>>,
    current_path: String,
    current_view: View,
    events: broadcast::Sender<PortalEvent>,
}

impl PortalApp {
    pub fn new(api: Arc<dyn BankingApi>) -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            api,
            session: SessionController::with_events(events.clone()),
            orchestrator: None,
            pending_sync: None,
            current_path: ROOT_PATH.to_string(),
            current_view: View::Landing,
            events,
        }
    }

    pub fn session(&self) -> &Session {
        self.session.session()
    }

    pub fn current_path(&self) -> &str {
        &self.current_path
    }

    pub fn current_view(&self) -> View {
        self.current_view
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PortalEvent> {
        self.events.subscribe()
    }

    /// The logout control only exists inside the authenticated area.
    pub fn can_logout(&self) -> bool {
        self.session().is_authenticated()
    }

    pub async fn sign_in(&mut self, request: &LoginRequest) -> Result<View> {
        let response = self.api.authenticate(request).await?;
        Ok(self.accept(response).await)
    }

    pub async fn register(&mut self, request: &RegisterRequest) -> Result<View> {
        let response = self.api.register(request).await?;
        Ok(self.accept(response).await)
    }

    async fn accept(&mut self, response: AuthResponse) -> View {
        self.login(Credential::new(response.token), response.role)
            .await
    }

    /// Installs a new session. Any dashboard state from a previous session
    /// is torn down first, and a fresh idle orchestrator is created for
    /// user sessions.
    pub async fn login(&mut self, credential: Credential, role: Role) -> View {
        self.discard_orchestrator().await;
        self.session.login(credential.clone(), role);
        if role == Role::User {
            self.orchestrator = Some(ViewOrchestrator::with_events(
                Arc::clone(&self.api),
                credential,
                self.events.clone(),
            ));
        }
        let path = self.current_path.clone();
        self.navigate(&path).await
    }

    pub async fn logout(&mut self) -> View {
        self.discard_orchestrator().await;
        self.session.logout();
        self.navigate(ROOT_PATH).await
    }

    /// Ends the session when `err` says the server no longer accepts the
    /// credential. Returns whether the session was ended.
    pub async fn expire_session_if_rejected(&mut self, err: &anyhow::Error) -> bool {
        let rejected = err
            .chain()
            .filter_map(|cause| cause.downcast_ref::<PortalError>())
            .any(PortalError::requires_reauth);
        if !rejected || !self.session().is_authenticated() {
            return false;
        }
        warn!("credential rejected by server; signing out");
        self.logout().await;
        true
    }

    /// Follows the routing table from `path` to a rendered view, mounting
    /// the dashboard when the user home becomes active.
    pub async fn navigate(&mut self, path: &str) -> View {
        let mut path = path.to_string();
        for _ in 0..MAX_REDIRECT_HOPS {
            match self.session.resolve(&path) {
                ViewTarget::Render(view) => {
                    self.current_path = path;
                    self.current_view = view;
                    if view == View::UserHome {
                        self.mount_dashboard().await;
                    }
                    return view;
                }
                ViewTarget::Redirect(to) => {
                    debug!(from = %path, to, "route redirected");
                    path = to.to_string();
                }
            }
        }
        warn!(%path, "redirect chain did not settle; staying on current view");
        self.current_view
    }

    pub fn orchestrator(&self) -> std::result::Result<Arc<ViewOrchestrator>, PortalError> {
        match (self.session(), &self.orchestrator) {
            (Session::Authenticated { .. }, Some(orchestrator)) => Ok(Arc::clone(orchestrator)),
            _ => Err(PortalError::NotAuthenticated),
        }
    }

    pub fn payment_submitter(&self) -> std::result::Result<PaymentSubmitter, PortalError> {
        let orchestrator = self.orchestrator()?;
        Ok(PaymentSubmitter::new(
            Arc::clone(&self.api),
            orchestrator.credential().clone(),
            orchestrator.resync_handle(),
        ))
    }

    /// Waits for the sync cycle started by mounting, if one is pending.
    pub async fn settle(&mut self) -> Option<ViewState> {
        let handle = self.pending_sync.take()?;
        match handle.await {
            Ok(view) => Some(view),
            Err(err) => {
                warn!("dashboard sync task ended early: {err}");
                None
            }
        }
    }

    async fn mount_dashboard(&mut self) {
        let Some(orchestrator) = self.orchestrator.clone() else {
            return;
        };
        let handle = orchestrator.mount().await;
        if handle.is_some() {
            self.pending_sync = handle;
        }
    }

    async fn discard_orchestrator(&mut self) {
        if let Some(handle) = self.pending_sync.take() {
            handle.abort();
        }
        if let Some(orchestrator) = self.orchestrator.take() {
            orchestrator.teardown().await;
            info!("dashboard torn down");
        }
    }
}

#[cfg(test)]
#[path = "tests/app_tests.rs"]
mod tests;
