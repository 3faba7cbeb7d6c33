//! Conversion tracking handlers.

mod forward_conversion;

pub use forward_conversion::ForwardConversionHandler;
