//! HTTP delivery to outbound subscribers.

mod http_sender;

pub use http_sender::{HttpWebhookSender, SIGNATURE_HEADER};
