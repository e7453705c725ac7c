//! Discord webhook alerting.
//!
//! This crate provides:
//! - Embed payload builders for rate alerts and first-check notices
//! - Best-effort webhook delivery with a bounded timeout

pub mod dispatcher;
pub mod payload;

pub use dispatcher::{AlertDispatcher, AlertSink, DispatchError, DispatchOutcome};
pub use payload::{first_check_payload, rate_alert_payload, Embed, EmbedField, EmbedFooter, WebhookPayload};
