//! Scripted in-memory banking API for orchestrator and app tests.

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use shared::{
    domain::{AccountNumber, Direction, Role, TransactionId, TransactionStatus},
    error::ApiError,
    protocol::{
        AuthResponse, BalanceAndTransactions, LoginRequest, PaymentReceipt, PaymentRequest,
        ProfileResponse, RegisterRequest, Transaction,
    },
};
use tokio::sync::oneshot;

use crate::{api::BankingApi, error::PortalError, session::Credential};

struct Scripted<T> {
    result: Result<T>,
    gate: Option<oneshot::Receiver<()>>,
}

impl<T> Scripted<T> {
    async fn resolve(self) -> Result<T> {
        if let Some(gate) = self.gate {
            let _ = gate.await;
        }
        self.result
    }
}

fn pop<T>(queue: &Mutex<VecDeque<Scripted<T>>>, what: &str) -> Scripted<T> {
    queue
        .lock()
        .expect("script lock")
        .pop_front()
        .unwrap_or_else(|| Scripted {
            result: Err(anyhow!("no scripted {what} response")),
            gate: None,
        })
}

#[derive(Default)]
pub(crate) struct ScriptedBankingApi {
    auth: Mutex<Option<AuthResponse>>,
    balances: Mutex<VecDeque<Scripted<BalanceAndTransactions>>>,
    profiles: Mutex<VecDeque<Scripted<ProfileResponse>>>,
    payments: Mutex<VecDeque<Scripted<PaymentReceipt>>>,
    balance_calls: AtomicUsize,
    profile_calls: AtomicUsize,
    seen_credentials: Mutex<Vec<String>>,
}

impl ScriptedBankingApi {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_auth(self, token: &str, role: Role) -> Self {
        *self.auth.lock().expect("script lock") = Some(AuthResponse {
            token: token.to_string(),
            role,
        });
        self
    }

    pub(crate) fn push_balance(&self, result: std::result::Result<BalanceAndTransactions, &str>) {
        self.push_balance_inner(result, None);
    }

    pub(crate) fn push_balance_gated(
        &self,
        result: std::result::Result<BalanceAndTransactions, &str>,
        gate: oneshot::Receiver<()>,
    ) {
        self.push_balance_inner(result, Some(gate));
    }

    fn push_balance_inner(
        &self,
        result: std::result::Result<BalanceAndTransactions, &str>,
        gate: Option<oneshot::Receiver<()>>,
    ) {
        self.balances.lock().expect("script lock").push_back(Scripted {
            result: result.map_err(|err| anyhow!("{err}")),
            gate,
        });
    }

    pub(crate) fn push_profile(&self, result: std::result::Result<ProfileResponse, &str>) {
        self.push_profile_inner(result, None);
    }

    pub(crate) fn push_profile_gated(
        &self,
        result: std::result::Result<ProfileResponse, &str>,
        gate: oneshot::Receiver<()>,
    ) {
        self.push_profile_inner(result, Some(gate));
    }

    fn push_profile_inner(
        &self,
        result: std::result::Result<ProfileResponse, &str>,
        gate: Option<oneshot::Receiver<()>>,
    ) {
        self.profiles.lock().expect("script lock").push_back(Scripted {
            result: result.map_err(|err| anyhow!("{err}")),
            gate,
        });
    }

    pub(crate) fn push_payment(&self, result: std::result::Result<PaymentReceipt, &str>) {
        self.payments.lock().expect("script lock").push_back(Scripted {
            result: result.map_err(|err| anyhow!("{err}")),
            gate: None,
        });
    }

    /// Scripts a payment rejected by the server with `status`.
    pub(crate) fn push_payment_rejection(&self, status: u16, message: &str) {
        let body: ApiError =
            serde_json::from_value(serde_json::json!({ "message": message })).expect("body");
        self.payments.lock().expect("script lock").push_back(Scripted {
            result: Err(PortalError::from_status(status, Some(body)).into()),
            gate: None,
        });
    }

    pub(crate) fn balance_calls(&self) -> usize {
        self.balance_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn profile_calls(&self) -> usize {
        self.profile_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn seen_credentials(&self) -> Vec<String> {
        self.seen_credentials.lock().expect("script lock").clone()
    }

    fn record(&self, credential: &Credential) {
        self.seen_credentials
            .lock()
            .expect("script lock")
            .push(credential.expose().to_string());
    }

    fn auth_response(&self) -> Result<AuthResponse> {
        self.auth
            .lock()
            .expect("script lock")
            .clone()
            .ok_or_else(|| anyhow!("invalid credentials"))
    }
}

#[async_trait]
impl BankingApi for ScriptedBankingApi {
    async fn authenticate(&self, _request: &LoginRequest) -> Result<AuthResponse> {
        self.auth_response()
    }

    async fn register(&self, _request: &RegisterRequest) -> Result<AuthResponse> {
        self.auth_response()
    }

    async fn fetch_balance_and_transactions(
        &self,
        credential: &Credential,
    ) -> Result<BalanceAndTransactions> {
        self.balance_calls.fetch_add(1, Ordering::SeqCst);
        self.record(credential);
        pop(&self.balances, "balance").resolve().await
    }

    async fn fetch_profile(&self, credential: &Credential) -> Result<ProfileResponse> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        self.record(credential);
        pop(&self.profiles, "profile").resolve().await
    }

    async fn submit_payment(
        &self,
        credential: &Credential,
        _request: &PaymentRequest,
    ) -> Result<PaymentReceipt> {
        self.record(credential);
        pop(&self.payments, "payment").resolve().await
    }
}

pub(crate) fn transaction(
    id: &str,
    amount: Decimal,
    direction: Direction,
    status: TransactionStatus,
) -> Transaction {
    Transaction {
        id: TransactionId(id.to_string()),
        created_at: Utc
            .with_ymd_and_hms(2024, 9, 1, 10, 0, 0)
            .single()
            .expect("timestamp"),
        display_text: format!("payment {id}"),
        amount,
        direction,
        status,
    }
}

pub(crate) fn numbered_transactions(count: usize) -> Vec<Transaction> {
    (1..=count)
        .map(|n| {
            transaction(
                &format!("t{n}"),
                Decimal::new(n as i64 * 100, 2),
                Direction::Outgoing,
                TransactionStatus::Approved,
            )
        })
        .collect()
}

pub(crate) fn balance(amount: Decimal, transactions: Vec<Transaction>) -> BalanceAndTransactions {
    BalanceAndTransactions {
        balance: amount,
        transactions,
    }
}

pub(crate) fn profile(account_number: &str, name: &str, surname: &str) -> ProfileResponse {
    ProfileResponse {
        account_number: AccountNumber(account_number.to_string()),
        name: name.to_string(),
        surname: surname.to_string(),
    }
}

pub(crate) fn payment_request(amount: Decimal) -> PaymentRequest {
    PaymentRequest {
        amount,
        currency: "USD".to_string(),
        provider: "SWIFT".to_string(),
        recipient_account: "987654321".to_string(),
        swift_code: "ABCDZAJJ".to_string(),
    }
}
