//! Ad platform conversions API adapter.

mod meta_client;

pub use meta_client::MetaConversionsClient;
