//! Dashboard data orchestration: one consistent snapshot of account,
//! transactions and profile per session, refreshed in whole sync cycles.

use std::sync::{Arc, Weak};

use futures::future;
use rust_decimal::Decimal;
use shared::{
    domain::{AccountNumber, Section},
    protocol::{BalanceAndTransactions, ProfileResponse, Transaction},
};
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{
    api::BankingApi,
    error::SYNC_ERROR_MESSAGE,
    session::Credential,
    views::{self, Header, MainArea},
    PortalEvent,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncStatus {
    #[default]
    Idle,
    Loading,
    Loaded,
    Errored,
}

/// `error_message` is set exactly when `sync_status` is `Errored`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ViewState {
    pub selected_section: Section,
    pub sync_status: SyncStatus,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub balance: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub account_number: AccountNumber,
    pub full_name: String,
}

impl From<ProfileResponse> for UserProfile {
    fn from(value: ProfileResponse) -> Self {
        Self {
            account_number: value.account_number,
            full_name: format!("{} {}", value.name, value.surname),
        }
    }
}

/// Result of one successful sync cycle. All three parts are replaced together.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardData {
    pub account: Account,
    /// Server order, not re-sorted.
    pub transactions: Vec<Transaction>,
    pub profile: UserProfile,
}

impl DashboardData {
    fn from_responses(balance: BalanceAndTransactions, profile: ProfileResponse) -> Self {
        Self {
            account: Account {
                balance: balance.balance,
            },
            transactions: balance.transactions,
            profile: profile.into(),
        }
    }
}

#[derive(Default)]
struct OrchestratorState {
    view: ViewState,
    data: Option<DashboardData>,
    generation: u64,
    mounted: bool,
    torn_down: bool,
}

pub struct ViewOrchestrator {
    api: Arc<dyn BankingApi>,
    credential: Credential,
    state: Mutex<OrchestratorState>,
    events: broadcast::Sender<PortalEvent>,
}

impl ViewOrchestrator {
    pub fn new(api: Arc<dyn BankingApi>, credential: Credential) -> Arc<Self> {
        let (events, _) = broadcast::channel(64);
        Self::with_events(api, credential, events)
    }

    pub fn with_events(
        api: Arc<dyn BankingApi>,
        credential: Credential,
        events: broadcast::Sender<PortalEvent>,
    ) -> Arc<Self> {
        Arc::new(Self {
            api,
            credential,
            state: Mutex::new(OrchestratorState::default()),
            events,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PortalEvent> {
        self.events.subscribe()
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub async fn view_state(&self) -> ViewState {
        self.state.lock().await.view.clone()
    }

    pub async fn snapshot(&self) -> Option<DashboardData> {
        self.state.lock().await.data.clone()
    }

    pub async fn is_torn_down(&self) -> bool {
        self.state.lock().await.torn_down
    }

    /// Starts the first sync cycle in the background. Only the first call
    /// after construction does anything.
    pub async fn mount(self: &Arc<Self>) -> Option<JoinHandle<ViewState>> {
        {
            let mut state = self.state.lock().await;
            if state.mounted || state.torn_down {
                return None;
            }
            state.mounted = true;
        }
        debug!("dashboard mounted");
        Some(self.spawn_synchronize())
    }

    pub fn spawn_synchronize(self: &Arc<Self>) -> JoinHandle<ViewState> {
        let orchestrator = Arc::clone(self);
        tokio::spawn(async move { orchestrator.synchronize().await })
    }

    /// Runs one full sync cycle. Both fetches must succeed for the snapshot
    /// to change; otherwise the previous snapshot stays and the view is
    /// marked errored. A completion belonging to an older cycle, or arriving
    /// after teardown, is dropped.
    pub async fn synchronize(&self) -> ViewState {
        let generation = {
            let mut state = self.state.lock().await;
            if state.torn_down {
                debug!("synchronize ignored after teardown");
                return state.view.clone();
            }
            state.mounted = true;
            state.generation += 1;
            state.view.sync_status = SyncStatus::Loading;
            state.view.error_message = None;
            self.emit_view(&state.view);
            state.generation
        };
        info!(generation, "sync started");

        let (balance, profile) = future::join(
            self.api.fetch_balance_and_transactions(&self.credential),
            self.api.fetch_profile(&self.credential),
        )
        .await;

        let mut state = self.state.lock().await;
        if state.torn_down || state.generation != generation {
            debug!(
                generation,
                current = state.generation,
                torn_down = state.torn_down,
                "discarding stale sync completion"
            );
            return state.view.clone();
        }

        match (balance, profile) {
            (Ok(balance), Ok(profile)) => {
                let data = DashboardData::from_responses(balance, profile);
                info!(
                    generation,
                    transactions = data.transactions.len(),
                    "sync completed"
                );
                state.data = Some(data);
                state.view.sync_status = SyncStatus::Loaded;
                state.view.error_message = None;
            }
            (balance, profile) => {
                if let Err(err) = &balance {
                    warn!(generation, "balance fetch failed: {err:#}");
                }
                if let Err(err) = &profile {
                    warn!(generation, "profile fetch failed: {err:#}");
                }
                state.view.sync_status = SyncStatus::Errored;
                state.view.error_message = Some(SYNC_ERROR_MESSAGE.to_string());
            }
        }
        self.emit_view(&state.view);
        state.view.clone()
    }

    /// Full resync after a mutation performed elsewhere (e.g. a payment).
    pub async fn request_resync(&self) -> ViewState {
        info!("resync requested");
        self.synchronize().await
    }

    pub fn resync_handle(self: &Arc<Self>) -> ResyncHandle {
        ResyncHandle {
            orchestrator: Arc::downgrade(self),
        }
    }

    /// Switches the visible section. Never fetches.
    pub async fn select_section(&self, section: Section) -> ViewState {
        let mut state = self.state.lock().await;
        if state.view.selected_section != section {
            debug!(section = section.id(), "section selected");
            state.view.selected_section = section;
            let _ = self.events.send(PortalEvent::SectionSelected(section));
        }
        state.view.clone()
    }

    /// Drops all held data and fences off every in-flight cycle.
    pub async fn teardown(&self) {
        let mut state = self.state.lock().await;
        if state.torn_down {
            return;
        }
        state.torn_down = true;
        state.generation += 1;
        state.data = None;
        state.view = ViewState::default();
        info!("dashboard state discarded");
    }

    pub async fn main_area(&self) -> MainArea {
        let state = self.state.lock().await;
        views::main_area(&state.view, state.data.as_ref())
    }

    pub async fn header(&self) -> Header {
        let state = self.state.lock().await;
        views::header(&state.view, state.data.as_ref())
    }

    fn emit_view(&self, view: &ViewState) {
        let _ = self.events.send(PortalEvent::ViewStateChanged(view.clone()));
    }
}

/// Refresh capability handed to subordinate views. Does nothing once the
/// owning orchestrator is gone.
#[derive(Clone)]
pub struct ResyncHandle {
    orchestrator: Weak<ViewOrchestrator>,
}

impl ResyncHandle {
    pub async fn request_resync(&self) -> Option<ViewState> {
        let orchestrator = self.orchestrator.upgrade()?;
        Some(orchestrator.request_resync().await)
    }
}

#[cfg(test)]
#[path = "tests/orchestrator_tests.rs"]
mod tests;
