//! Client core of the customer banking portal: session gating and routing,
//! plus the dashboard's data orchestration against the remote banking API.

use shared::domain::Section;

pub mod api;
pub mod app;
pub mod error;
pub mod orchestrator;
pub mod payments;
pub mod session;
pub mod views;

pub use api::{BankingApi, HttpBankingApi};
pub use app::PortalApp;
pub use error::{PortalError, SYNC_ERROR_MESSAGE};
pub use orchestrator::{
    Account, DashboardData, ResyncHandle, SyncStatus, UserProfile, ViewOrchestrator, ViewState,
};
pub use payments::PaymentSubmitter;
pub use session::{
    resolve_route, Credential, Session, SessionController, SessionStatus, View, ViewTarget,
};
pub use views::{MainArea, SectionContent};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortalEvent {
    SessionChanged(SessionStatus),
    ViewStateChanged(ViewState),
    SectionSelected(Section),
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod api_tests;

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
