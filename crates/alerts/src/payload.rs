//! Discord webhook payload construction.

use chrono::{SecondsFormat, Utc};
use ratewatch_core::{RateChangeAlert, VaultConfig};
use serde::Serialize;

// Colors keyed to borrower impact: a rate increase is bad news.
const COLOR_RATE_UP: u32 = 0xff0000;
const COLOR_RATE_DOWN: u32 = 0x00ff00;
const COLOR_FIRST_CHECK: u32 = 0x808080;

const FOOTER_TEXT: &str = "ratewatch";

#[derive(Debug, Clone, Serialize)]
pub struct WebhookPayload {
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Embed {
    pub title: String,
    pub description: String,
    pub color: u32,
    pub fields: Vec<EmbedField>,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbedFooter {
    pub text: String,
}

fn pair_label(vault_pair: Option<String>) -> String {
    vault_pair.unwrap_or_else(|| "Unknown".to_string())
}

fn alert_description(alert: &RateChangeAlert) -> String {
    let (icon, direction) = if alert.increased() {
        ("\u{1F4C8}", "increased")
    } else {
        ("\u{1F4C9}", "decreased")
    };
    format!(
        "{icon} **Rate Alert: {nickname}**\n\n\
         **Current Rate: {current:.2}%**\n\
         Previous Rate: {previous:.2}%\n\
         Change: {direction} by {change:.2} percentage points\n\n\
         <t:{unix}:R>",
        nickname = alert.nickname,
        current = alert.current_rate,
        previous = alert.previous_rate,
        change = alert.change_points.abs(),
        unix = alert.timestamp.timestamp(),
    )
}

/// Build the webhook payload for a rate-change alert.
pub fn rate_alert_payload(alert: &RateChangeAlert) -> WebhookPayload {
    let color = if alert.increased() {
        COLOR_RATE_UP
    } else {
        COLOR_RATE_DOWN
    };

    WebhookPayload {
        embeds: vec![Embed {
            title: format!("Rate Alert: {}", alert.nickname),
            description: alert_description(alert),
            color,
            fields: vec![
                EmbedField {
                    name: "Vault ID".to_string(),
                    value: alert.vault_id.clone(),
                    inline: true,
                },
                EmbedField {
                    name: "Market Pair".to_string(),
                    value: pair_label(alert.market_pair.as_ref().map(|p| p.to_string())),
                    inline: true,
                },
            ],
            timestamp: alert.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            footer: Some(EmbedFooter {
                text: FOOTER_TEXT.to_string(),
            }),
        }],
    }
}

/// Build the gray status payload for a vault's first observation.
pub fn first_check_payload(vault: &VaultConfig, rate: f64) -> WebhookPayload {
    WebhookPayload {
        embeds: vec![Embed {
            title: format!("Rate Status: {}", vault.nickname),
            description: format!("First rate check for {}", vault.nickname),
            color: COLOR_FIRST_CHECK,
            fields: vec![
                EmbedField {
                    name: format!("**Current Rate:** {rate:.2}%"),
                    value: " ".to_string(),
                    inline: false,
                },
                EmbedField {
                    name: "Market Pair".to_string(),
                    value: pair_label(vault.market_pair.as_ref().map(|p| p.to_string())),
                    inline: true,
                },
            ],
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            footer: Some(EmbedFooter {
                text: FOOTER_TEXT.to_string(),
            }),
        }],
    }
}
