//! Server-side conversion tracking.

mod conversion;
mod errors;
mod pixel;

pub use conversion::{
    hash_email, Conversion, ConversionRequest, ConversionsEnvelope, CustomData, ServerEvent,
    UserData, ACTION_SOURCE, DEFAULT_CURRENCY,
};
pub use errors::TrackingError;
pub use pixel::{TrackingConfig, TrackingEvent};
