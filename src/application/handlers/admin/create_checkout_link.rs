//! CreateCheckoutLinkHandler - Builds a provider checkout URL for a user.

use std::sync::Arc;

use crate::domain::billing::Plan;
use crate::domain::foundation::{DomainError, UserId};
use crate::ports::CheckoutLinks;

pub struct CreateCheckoutLinkHandler {
    links: Arc<dyn CheckoutLinks>,
}

impl CreateCheckoutLinkHandler {
    pub fn new(links: Arc<dyn CheckoutLinks>) -> Self {
        Self { links }
    }

    pub async fn handle(&self, user_id: &UserId, plan: Plan) -> Result<String, DomainError> {
        if !plan.is_purchasable() {
            return Err(DomainError::validation("plan", format!("plan '{}' has no checkout", plan)));
        }

        let url = self.links.create_checkout_url(user_id, plan).await?;
        tracing::debug!(user_id = %user_id, plan = %plan, "Checkout link created");
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::StubProcedures;
    use crate::domain::foundation::ErrorCode;

    #[tokio::test]
    async fn paid_plan_gets_a_link_for_the_user() {
        let handler = CreateCheckoutLinkHandler::new(Arc::new(StubProcedures::new()));
        let user = UserId::new();

        let url = handler.handle(&user, Plan::Vip).await.unwrap();

        assert!(url.contains("/vip"));
        assert!(url.contains(&user.to_string()));
    }

    #[tokio::test]
    async fn free_plan_is_rejected() {
        let procedures = Arc::new(StubProcedures::new());
        let handler = CreateCheckoutLinkHandler::new(procedures.clone());

        let err = handler.handle(&UserId::new(), Plan::Free).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert_eq!(procedures.calls(), 0);
    }
}
