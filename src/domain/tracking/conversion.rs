//! Conversion events and the ad platform's server-side event envelope.
//!
//! Emails are normalized (trimmed, lower-cased) and SHA-256 hashed before
//! they leave this module; the raw address is never part of an envelope.

use serde::{de, Deserialize, Deserializer, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::foundation::{Timestamp, ValidationError};

/// Currency assumed when the caller sends none.
pub const DEFAULT_CURRENCY: &str = "BRL";

/// Action source reported for every forwarded event.
pub const ACTION_SOURCE: &str = "website";

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

/// Incoming conversion event as posted by the front end or a backend job.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ConversionRequest {
    #[serde(default)]
    pub event_name: Option<String>,
    #[serde(default)]
    pub event_id: Option<String>,
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default, deserialize_with = "number_or_numeric_string")]
    pub value: Option<f64>,
    /// Missing, null or blank means [`DEFAULT_CURRENCY`].
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub external_order_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub event_source_url: Option<String>,
}

/// A conversion whose required fields are present.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub event_name: String,
    pub event_id: String,
    pub user_email: Option<String>,
    pub value: Option<f64>,
    pub currency: String,
    pub external_order_id: Option<String>,
    pub user_id: Option<String>,
    pub event_source_url: Option<String>,
}

impl ConversionRequest {
    /// Checks required fields. Blank optional strings are dropped.
    pub fn validate(self) -> Result<Conversion, ValidationError> {
        let event_name = required(self.event_name, "event_name")?;
        let event_id = required(self.event_id, "event_id")?;
        let currency = non_blank(self.currency).unwrap_or_else(default_currency);

        Ok(Conversion {
            event_name,
            event_id,
            user_email: non_blank(self.user_email),
            value: self.value,
            currency,
            external_order_id: non_blank(self.external_order_id),
            user_id: non_blank(self.user_id),
            event_source_url: non_blank(self.event_source_url),
        })
    }
}

/// Accepts `49.9`, `"49.90"` or `null`. A blank string counts as absent.
fn number_or_numeric_string<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Number(n)) => Ok(Some(n)),
        Some(Raw::Text(text)) => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            match text.parse::<f64>() {
                Ok(n) if n.is_finite() => Ok(Some(n)),
                _ => Err(de::Error::custom(format!("invalid value '{}'", text))),
            }
        }
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, ValidationError> {
    non_blank(value).ok_or_else(|| ValidationError::empty_field(field))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Lower-cases and trims an email, then returns its SHA-256 as lowercase hex.
pub fn hash_email(email: &str) -> String {
    let normalized = email.trim().to_lowercase();
    hex::encode(Sha256::digest(normalized.as_bytes()))
}

/// Request body of the ad platform's server-side events endpoint.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ConversionsEnvelope {
    pub data: Vec<ServerEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_event_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ServerEvent {
    pub event_name: String,
    pub event_time: i64,
    pub event_id: String,
    pub action_source: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_source_url: Option<String>,
    pub user_data: UserData,
    pub custom_data: CustomData,
}

#[derive(Debug, Clone, Serialize, PartialEq, Default)]
pub struct UserData {
    /// Hashed emails.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub em: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CustomData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
}

impl ConversionsEnvelope {
    /// Builds the single-event envelope sent upstream.
    pub fn build(conversion: &Conversion, test_event_code: Option<String>, now: Timestamp) -> Self {
        let user_data = UserData {
            em: conversion.user_email.as_deref().map(|e| vec![hash_email(e)]),
            external_id: conversion.user_id.clone().map(|id| vec![id]),
        };

        let event = ServerEvent {
            event_name: conversion.event_name.clone(),
            event_time: now.as_unix_secs(),
            event_id: conversion.event_id.clone(),
            action_source: ACTION_SOURCE,
            event_source_url: conversion.event_source_url.clone(),
            user_data,
            custom_data: CustomData {
                value: conversion.value,
                currency: conversion.currency.clone(),
                order_id: conversion.external_order_id.clone(),
            },
        };

        Self {
            data: vec![event],
            test_event_code: test_event_code.filter(|c| !c.is_empty()),
        }
    }
}
