//! Administrative and scheduled operations backed by stored procedures.

mod auto_status;
mod create_checkout_link;
mod process_referral;
mod system_cleanup;

pub use auto_status::ProcessAutoStatusHandler;
pub use create_checkout_link::CreateCheckoutLinkHandler;
pub use process_referral::ProcessReferralHandler;
pub use system_cleanup::RunSystemCleanupHandler;
