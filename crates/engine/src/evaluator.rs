//! Rate-change evaluation.
//!
//! Pure decision logic: given a vault's configuration, the freshly observed
//! borrow rate, and the stored history, decide whether to alert and what the
//! next history values are. All effects (dispatch, persistence) belong to the
//! caller.

use ratewatch_core::{RateChangeAlert, VaultConfig};

/// Result of evaluating one observation against a vault's history.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Alert to dispatch, when the move crossed the vault's threshold.
    pub alert: Option<RateChangeAlert>,
    /// New last-observed rate; always the observation itself.
    pub last_rate: f64,
    /// New last-alerted rate, present only when it moved (first observation
    /// seeds it, an alert re-anchors it).
    pub last_alert_rate: Option<f64>,
    /// True when this was the vault's first observation.
    pub first_observation: bool,
}

/// Evaluate one observed rate.
///
/// The comparison baseline is the last alerted rate when one is recorded and
/// non-zero, otherwise the last observed rate. The change is measured in
/// absolute percentage points, so a 0.1-point move counts the same at 2% and
/// at 60%. The threshold boundary is inclusive.
pub fn evaluate(vault: &VaultConfig, observed_rate: f64, last_rate: Option<f64>) -> Evaluation {
    let Some(last_rate) = last_rate else {
        // First observation: seed both history values so the first real
        // change has a correct baseline. Never alerts.
        return Evaluation {
            alert: None,
            last_rate: observed_rate,
            last_alert_rate: Some(observed_rate),
            first_observation: true,
        };
    };

    let baseline = match vault.last_alert_rate {
        Some(rate) if rate != 0.0 => rate,
        _ => last_rate,
    };

    let change_points = (observed_rate - baseline).abs();
    let alert = if change_points >= vault.threshold_percent {
        Some(RateChangeAlert::new(vault, baseline, observed_rate))
    } else {
        None
    };

    Evaluation {
        last_alert_rate: alert.as_ref().map(|a| a.current_rate),
        alert,
        last_rate: observed_rate,
        first_observation: false,
    }
}
