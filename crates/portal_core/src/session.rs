//! Authentication state and the role-gated routing table.

use std::fmt;

use shared::domain::Role;
use tokio::sync::broadcast;
use tracing::info;

use crate::PortalEvent;

pub const ROOT_PATH: &str = "/";
pub const LOGIN_PATH: &str = "/login";
pub const REGISTER_PATH: &str = "/register";
pub const ADMIN_PATH: &str = "/admin";
pub const USER_HOME_PATH: &str = "/user-home";

/// Opaque bearer token granted at login.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Unauthenticated,
    Authenticated,
}

/// Credential and role exist exactly when the session is authenticated.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Session {
    #[default]
    Unauthenticated,
    Authenticated { credential: Credential, role: Role },
}

impl Session {
    pub fn status(&self) -> SessionStatus {
        match self {
            Session::Unauthenticated => SessionStatus::Unauthenticated,
            Session::Authenticated { .. } => SessionStatus::Authenticated,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.status() == SessionStatus::Authenticated
    }

    pub fn credential(&self) -> Option<&Credential> {
        match self {
            Session::Authenticated { credential, .. } => Some(credential),
            Session::Unauthenticated => None,
        }
    }

    pub fn role(&self) -> Option<Role> {
        match self {
            Session::Authenticated { role, .. } => Some(*role),
            Session::Unauthenticated => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Landing,
    Login,
    Register,
    Admin,
    UserHome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewTarget {
    Render(View),
    Redirect(&'static str),
}

pub fn home_path(role: Role) -> &'static str {
    match role {
        Role::Admin => ADMIN_PATH,
        Role::User => USER_HOME_PATH,
    }
}

/// Decides which view a path reaches for the given session. Authorization
/// failures and unknown paths redirect to the root instead of erroring.
pub fn resolve_route(path: &str, session: &Session) -> ViewTarget {
    match (path, session) {
        (ROOT_PATH, Session::Unauthenticated) => ViewTarget::Render(View::Landing),
        (LOGIN_PATH, Session::Unauthenticated) => ViewTarget::Render(View::Login),
        (REGISTER_PATH, Session::Unauthenticated) => ViewTarget::Render(View::Register),
        (ROOT_PATH | LOGIN_PATH | REGISTER_PATH, Session::Authenticated { role, .. }) => {
            ViewTarget::Redirect(home_path(*role))
        }
        (
            ADMIN_PATH,
            Session::Authenticated {
                role: Role::Admin, ..
            },
        ) => ViewTarget::Render(View::Admin),
        (
            USER_HOME_PATH,
            Session::Authenticated {
                role: Role::User, ..
            },
        ) => ViewTarget::Render(View::UserHome),
        _ => ViewTarget::Redirect(ROOT_PATH),
    }
}

pub struct SessionController {
    session: Session,
    events: broadcast::Sender<PortalEvent>,
}

impl Default for SessionController {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionController {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(64);
        Self::with_events(events)
    }

    pub fn with_events(events: broadcast::Sender<PortalEvent>) -> Self {
        Self {
            session: Session::Unauthenticated,
            events,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PortalEvent> {
        self.events.subscribe()
    }

    /// Replaces the current session wholesale. The credential and role are
    /// taken as issued by the authentication collaborator.
    pub fn login(&mut self, credential: Credential, role: Role) -> Session {
        self.session = Session::Authenticated { credential, role };
        info!(?role, "session authenticated");
        let _ = self
            .events
            .send(PortalEvent::SessionChanged(SessionStatus::Authenticated));
        self.session.clone()
    }

    pub fn logout(&mut self) -> Session {
        let was_authenticated = self.session.is_authenticated();
        self.session = Session::Unauthenticated;
        if was_authenticated {
            info!("session cleared");
        }
        let _ = self
            .events
            .send(PortalEvent::SessionChanged(SessionStatus::Unauthenticated));
        self.session.clone()
    }

    pub fn resolve(&self, path: &str) -> ViewTarget {
        resolve_route(path, &self.session)
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
