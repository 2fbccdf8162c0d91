use std::sync::Arc;

use anyhow::Result;
use shared::protocol::{PaymentReceipt, PaymentRequest};
use tracing::{info, warn};

use crate::{api::BankingApi, orchestrator::ResyncHandle, session::Credential};

/// Bridge handed to the payment view: submits through the API and, on
/// success, forces a full resync so balance and history come from the
/// server rather than a local patch.
#[derive(Clone)]
pub struct PaymentSubmitter {
    api: Arc<dyn BankingApi>,
    credential: Credential,
    resync: ResyncHandle,
}

impl PaymentSubmitter {
    pub fn new(api: Arc<dyn BankingApi>, credential: Credential, resync: ResyncHandle) -> Self {
        Self {
            api,
            credential,
            resync,
        }
    }

    pub async fn submit(&self, request: &PaymentRequest) -> Result<PaymentReceipt> {
        let receipt = match self.api.submit_payment(&self.credential, request).await {
            Ok(receipt) => receipt,
            Err(err) => {
                warn!(amount = %request.amount, "payment submission failed: {err:#}");
                return Err(err);
            }
        };
        info!(
            amount = %request.amount,
            transaction_id = ?receipt.transaction_id,
            "payment accepted"
        );
        if self.resync.request_resync().await.is_none() {
            warn!("payment accepted after dashboard teardown; skipping resync");
        }
        Ok(receipt)
    }
}
