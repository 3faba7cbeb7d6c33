//! ProcessReferralHandler - Credits the referrer of a purchase.

use std::sync::Arc;

use crate::domain::foundation::DomainError;
use crate::ports::{ReferralOutcome, ReferralProcessor, ReferralPurchase};

pub struct ProcessReferralHandler {
    referrals: Arc<dyn ReferralProcessor>,
}

impl ProcessReferralHandler {
    pub fn new(referrals: Arc<dyn ReferralProcessor>) -> Self {
        Self { referrals }
    }

    pub async fn handle(&self, purchase: ReferralPurchase) -> Result<ReferralOutcome, DomainError> {
        purchase.validate()?;

        let outcome = self.referrals.process_referral_purchase(&purchase).await?;
        tracing::info!(
            buyer_id = %purchase.buyer_id,
            order_id = %purchase.order_id,
            success = outcome.success,
            commission_cents = ?outcome.commission_cents,
            "Referral purchase processed"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::StubProcedures;
    use crate::domain::foundation::UserId;

    #[tokio::test]
    async fn blank_order_id_is_rejected() {
        let procedures = Arc::new(StubProcedures::new());
        let handler = ProcessReferralHandler::new(procedures.clone());

        let result = handler
            .handle(ReferralPurchase {
                buyer_id: UserId::new(),
                order_id: "  ".into(),
                amount_cents: 1000,
            })
            .await;

        assert!(result.is_err());
        assert_eq!(procedures.calls(), 0);
    }

    #[tokio::test]
    async fn valid_purchase_returns_procedure_outcome() {
        let handler = ProcessReferralHandler::new(Arc::new(StubProcedures::new()));

        let outcome = handler
            .handle(ReferralPurchase {
                buyer_id: UserId::new(),
                order_id: "HP-1".into(),
                amount_cents: 1000,
            })
            .await
            .unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.commission_cents, Some(100));
    }
}
