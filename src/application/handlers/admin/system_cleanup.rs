//! RunSystemCleanupHandler - Admin-triggered data cleanup.

use std::sync::Arc;

use serde_json::Value;

use crate::domain::foundation::{DomainError, UserId};
use crate::ports::{CleanupRequest, SystemCleanup};

pub struct RunSystemCleanupHandler {
    cleanup: Arc<dyn SystemCleanup>,
}

impl RunSystemCleanupHandler {
    pub fn new(cleanup: Arc<dyn SystemCleanup>) -> Self {
        Self { cleanup }
    }

    /// Runs the cleanup procedure and returns its report unchanged.
    pub async fn handle(&self, admin: &UserId, request: CleanupRequest) -> Result<Value, DomainError> {
        request.validate()?;

        let report = self.cleanup.run_system_cleanup(&request).await?;
        tracing::warn!(admin = %admin, scope = %request.scope, "System cleanup executed");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::StubProcedures;
    use crate::domain::foundation::ErrorCode;

    #[tokio::test]
    async fn unconfirmed_cleanup_never_reaches_the_procedure() {
        let procedures = Arc::new(StubProcedures::new());
        let handler = RunSystemCleanupHandler::new(procedures.clone());

        let err = handler
            .handle(
                &UserId::new(),
                CleanupRequest {
                    scope: "test_data".into(),
                    confirm: false,
                },
            )
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert_eq!(procedures.calls(), 0);
    }

    #[tokio::test]
    async fn confirmed_cleanup_returns_the_report() {
        let procedures = Arc::new(StubProcedures::new());
        let handler = RunSystemCleanupHandler::new(procedures.clone());

        let report = handler
            .handle(
                &UserId::new(),
                CleanupRequest {
                    scope: "test_data".into(),
                    confirm: true,
                },
            )
            .await
            .unwrap();

        assert_eq!(report["scope"], "test_data");
        assert_eq!(procedures.calls(), 1);
    }
}
