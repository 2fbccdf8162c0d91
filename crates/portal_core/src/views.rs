//! Read-only projections of the dashboard snapshot for each section.

use rust_decimal::Decimal;
use shared::{
    domain::{AccountNumber, Direction, Section, TransactionStatus},
    protocol::Transaction,
};

use crate::orchestrator::{DashboardData, SyncStatus, ViewState};

pub const RECENT_TRANSACTIONS: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub enum MainArea {
    Loading,
    Error(String),
    Ready(SectionContent),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SectionContent {
    Dashboard(DashboardSummary),
    MakePayment(PaymentContext),
    Statements(Vec<Transaction>),
    Insights(InsightsSummary),
    Settings(SettingsView),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSummary {
    pub balance: Decimal,
    pub account_number: AccountNumber,
    pub recent_transactions: Vec<Transaction>,
    pub quick_actions: [Section; 2],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentContext {
    pub balance: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InsightsSummary {
    pub total_incoming: Decimal,
    pub total_outgoing: Decimal,
    pub net_flow: Decimal,
    pub approved: usize,
    pub pending: usize,
    pub other: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsView {
    pub first_name: String,
    pub last_name: String,
    pub account_number: AccountNumber,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub title: &'static str,
    pub greeting: String,
    pub avatar_initial: Option<char>,
}

/// Content is shown only for a loaded snapshot; a held-over snapshot from
/// an earlier cycle stays hidden behind the error.
pub fn main_area(view: &ViewState, data: Option<&DashboardData>) -> MainArea {
    match (view.sync_status, data) {
        (SyncStatus::Errored, _) => MainArea::Error(
            view.error_message
                .clone()
                .unwrap_or_else(|| crate::error::SYNC_ERROR_MESSAGE.to_string()),
        ),
        (SyncStatus::Loaded, Some(data)) => {
            MainArea::Ready(section_content(view.selected_section, data))
        }
        _ => MainArea::Loading,
    }
}

pub fn section_content(section: Section, data: &DashboardData) -> SectionContent {
    match section {
        Section::Dashboard => SectionContent::Dashboard(DashboardSummary {
            balance: data.account.balance,
            account_number: data.profile.account_number.clone(),
            recent_transactions: data
                .transactions
                .iter()
                .take(RECENT_TRANSACTIONS)
                .cloned()
                .collect(),
            quick_actions: [Section::MakePayment, Section::Statements],
        }),
        Section::MakePayment => SectionContent::MakePayment(PaymentContext {
            balance: data.account.balance,
        }),
        Section::Statements => SectionContent::Statements(data.transactions.clone()),
        Section::Insights => SectionContent::Insights(insights(&data.transactions)),
        Section::Settings => {
            let (first_name, last_name) = split_full_name(&data.profile.full_name);
            SectionContent::Settings(SettingsView {
                first_name,
                last_name,
                account_number: data.profile.account_number.clone(),
            })
        }
    }
}

pub fn insights(transactions: &[Transaction]) -> InsightsSummary {
    let mut summary = InsightsSummary::default();
    for transaction in transactions {
        match transaction.direction {
            Direction::Incoming => summary.total_incoming += transaction.amount,
            Direction::Outgoing => summary.total_outgoing += transaction.amount,
        }
        match transaction.status {
            TransactionStatus::Approved => summary.approved += 1,
            TransactionStatus::Pending => summary.pending += 1,
            TransactionStatus::Other(_) => summary.other += 1,
        }
    }
    summary.net_flow = summary.total_incoming - summary.total_outgoing;
    summary
}

pub fn header(view: &ViewState, data: Option<&DashboardData>) -> Header {
    let full_name = data.map(|data| data.profile.full_name.as_str()).unwrap_or("");
    Header {
        title: view.selected_section.title(),
        greeting: format!("Hello, {full_name}"),
        avatar_initial: full_name.chars().next(),
    }
}

fn split_full_name(full_name: &str) -> (String, String) {
    match full_name.split_once(' ') {
        Some((first, last)) => (first.to_string(), last.to_string()),
        None => (full_name.to_string(), String::new()),
    }
}

#[cfg(test)]
#[path = "tests/views_tests.rs"]
mod tests;
