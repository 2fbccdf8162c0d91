//! Remote banking API collaborator: the trait the core depends on and its
//! reqwest-backed implementation.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use shared::{
    error::ApiError,
    protocol::{
        AuthResponse, BalanceAndTransactions, LoginRequest, PaymentReceipt, PaymentRequest,
        ProfileResponse, RegisterRequest,
    },
};
use tracing::debug;
use url::Url;

use crate::{error::PortalError, session::Credential};

const LOGIN_PATH: &str = "api/auth/login";
const REGISTER_PATH: &str = "api/auth/register";
const BALANCE_PATH: &str = "api/transactions/balance";
const PROFILE_PATH: &str = "api/users/profile";
const PAYMENT_PATH: &str = "api/transactions/payment";

#[async_trait]
pub trait BankingApi: Send + Sync {
    async fn authenticate(&self, request: &LoginRequest) -> Result<AuthResponse>;
    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse>;
    async fn fetch_balance_and_transactions(
        &self,
        credential: &Credential,
    ) -> Result<BalanceAndTransactions>;
    async fn fetch_profile(&self, credential: &Credential) -> Result<ProfileResponse>;
    async fn submit_payment(
        &self,
        credential: &Credential,
        request: &PaymentRequest,
    ) -> Result<PaymentReceipt>;
}

pub struct HttpBankingApi {
    http: Client,
    base: Url,
}

impl HttpBankingApi {
    pub fn new(server_url: &str) -> std::result::Result<Self, PortalError> {
        let mut base = Url::parse(server_url.trim())?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            http: Client::new(),
            base,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> std::result::Result<Url, PortalError> {
        Ok(self.base.join(path)?)
    }

    async fn decode<T: DeserializeOwned>(
        response: Response,
    ) -> std::result::Result<T, PortalError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.json::<ApiError>().await.ok();
            return Err(PortalError::from_status(status.as_u16(), body));
        }
        Ok(response.json().await?)
    }

    async fn get_authorized<T: DeserializeOwned>(
        &self,
        path: &str,
        credential: &Credential,
    ) -> std::result::Result<T, PortalError> {
        let url = self.endpoint(path)?;
        debug!(%url, "GET");
        let response = self
            .http
            .get(url)
            .bearer_auth(credential.expose())
            .send()
            .await?;
        Self::decode(response).await
    }
}

#[async_trait]
impl BankingApi for HttpBankingApi {
    async fn authenticate(&self, request: &LoginRequest) -> Result<AuthResponse> {
        let url = self.endpoint(LOGIN_PATH)?;
        debug!(%url, username = %request.username, "POST login");
        let response = self.http.post(url).json(request).send().await?;
        Ok(Self::decode(response).await?)
    }

    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse> {
        let url = self.endpoint(REGISTER_PATH)?;
        debug!(%url, username = %request.username, "POST register");
        let response = self.http.post(url).json(request).send().await?;
        Ok(Self::decode(response).await?)
    }

    async fn fetch_balance_and_transactions(
        &self,
        credential: &Credential,
    ) -> Result<BalanceAndTransactions> {
        Ok(self.get_authorized(BALANCE_PATH, credential).await?)
    }

    async fn fetch_profile(&self, credential: &Credential) -> Result<ProfileResponse> {
        Ok(self.get_authorized(PROFILE_PATH, credential).await?)
    }

    async fn submit_payment(
        &self,
        credential: &Credential,
        request: &PaymentRequest,
    ) -> Result<PaymentReceipt> {
        let url = self.endpoint(PAYMENT_PATH)?;
        debug!(%url, amount = %request.amount, "POST payment");
        let response = self
            .http
            .post(url)
            .bearer_auth(credential.expose())
            .json(request)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.json::<ApiError>().await.ok();
            return Err(PortalError::from_status(status.as_u16(), body).into());
        }
        // Some servers acknowledge a payment with an empty body.
        let bytes = response.bytes().await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(PaymentReceipt::default());
        }
        Ok(serde_json::from_slice(&bytes)?)
    }
}
