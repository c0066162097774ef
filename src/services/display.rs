//! Display formatting.
//!
//! Fixed precision per kind of value: 2 decimals for currency, 6 for asset
//! quantity, 1 for leverage, 2 for ratios. Missing values render as
//! [`PLACEHOLDER`], never as zero.

use crate::error::ValidationError;
use crate::types::{CalculationResult, Constants, RateState, RateStatus, RiskReward};
use std::fmt::Write as _;

/// Shown wherever a value is absent.
pub const PLACEHOLDER: &str = "-";
/// Shown for an unbounded risk/reward ratio.
pub const INFINITY_SYMBOL: &str = "∞";

/// Currency amount with thousands separators, e.g. `1,234.56`.
pub fn format_currency(value: f64) -> String {
    group_thousands(&format!("{:.2}", normalize_zero(value, 2)))
}

/// Currency amount with an explicit `+` for non-negative values.
pub fn format_signed_currency(value: f64) -> String {
    let value = normalize_zero(value, 2);
    let body = format_currency(value);
    if value >= 0.0 {
        format!("+{}", body)
    } else {
        body
    }
}

/// Asset quantity, 6 decimals.
pub fn format_quantity(value: f64) -> String {
    format!("{:.6}", normalize_zero(value, 6))
}

/// Leverage multiplier, e.g. `9.6x`.
pub fn format_leverage(value: f64) -> String {
    format!("{:.1}x", value)
}

/// Risk/reward ratio: 2 decimals, `∞`, or the placeholder.
pub fn format_ratio(ratio: &RiskReward) -> String {
    match ratio {
        RiskReward::Ratio(r) => format!("{:.2}", r),
        RiskReward::Infinite => INFINITY_SYMBOL.to_string(),
        RiskReward::NotApplicable => PLACEHOLDER.to_string(),
    }
}

/// Fee rate as a percentage, e.g. `0.05%`.
pub fn format_fee_rate(fee_rate: f64) -> String {
    format!("{:.2}%", fee_rate * 100.0)
}

/// Apply `f` or fall back to the placeholder.
pub fn format_optional(value: Option<f64>, f: impl Fn(f64) -> String) -> String {
    value.map(f).unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// Collapse values that round to zero so they never print as `-0.00`.
fn normalize_zero(value: f64, decimals: i32) -> f64 {
    let half_ulp = 0.5 * 10f64.powi(-decimals);
    if value.abs() < half_ulp {
        0.0
    } else {
        value
    }
}

fn group_thousands(formatted: &str) -> String {
    let (sign, digits) = match formatted.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", formatted),
    };
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(frac) => format!("{}{}.{}", sign, grouped, frac),
        None => format!("{}{}", sign, grouped),
    }
}

// =============================================================================
// Report
// =============================================================================

/// Labels used when rendering a report.
#[derive(Debug, Clone)]
pub struct ReportUnits {
    /// Settlement currency, e.g. "USDT".
    pub quote: String,
    /// Underlying asset, e.g. "BTC".
    pub asset: String,
}

impl Default for ReportUnits {
    fn default() -> Self {
        Self {
            quote: "USDT".to_string(),
            asset: "BTC".to_string(),
        }
    }
}

/// Plain-text rendering of a calculation for the terminal.
pub struct Report<'a> {
    pub outcome: &'a Result<CalculationResult, ValidationError>,
    pub constants: &'a Constants,
    pub rate: Option<&'a RateState>,
    pub units: &'a ReportUnits,
}

impl Report<'_> {
    pub fn render(&self) -> String {
        let quote = &self.units.quote;
        let mut out = String::new();

        let _ = writeln!(out, "{:<16}{}", "Fee rate:", format_fee_rate(self.constants.fee_rate));

        let result = match self.outcome {
            Ok(result) => result,
            Err(e) => {
                let _ = writeln!(out, "{:<16}{}", "Error:", e);
                return out;
            }
        };

        let _ = writeln!(out, "{:<16}{} {}", "Margin:", format_currency(result.margin), quote);

        let leverage = result
            .leverage
            .map(|l| format!("{} ({})", format_leverage(l.value), l.source))
            .unwrap_or_else(|| PLACEHOLDER.to_string());
        let _ = writeln!(out, "{:<16}{}", "Leverage:", leverage);

        let _ = writeln!(
            out,
            "{:<16}{} {}",
            "Position size:",
            format_quantity(result.position_size),
            self.units.asset
        );

        if let Some(RateStatus::Error(msg)) = self.rate.map(|r| &r.status) {
            let _ = writeln!(out, "{:<16}{}", "Rate status:", msg);
        }

        let Some(pnl) = &result.pnl else {
            for label in ["Gross PnL:", "Fees:", "Net PnL:", "Liquidation:", "R/R:"] {
                let _ = writeln!(out, "{:<16}{}", label, PLACEHOLDER);
            }
            return out;
        };

        let _ = writeln!(
            out,
            "{:<16}{} {}",
            "Gross PnL:",
            format_signed_currency(pnl.gross_pnl),
            quote
        );
        let _ = writeln!(out, "{:<16}{} {}", "Fees:", format_currency(pnl.total_fee), quote);

        let local = match (pnl.net_pnl_local, self.rate) {
            (Some(v), Some(rate)) => format!(" (≈ {} {})", format_currency(v), rate.currency),
            (Some(v), None) => format!(" (≈ {})", format_currency(v)),
            (None, Some(rate)) => format!(" ({} rate unavailable)", rate.currency),
            (None, None) => String::new(),
        };
        let _ = writeln!(
            out,
            "{:<16}{} {}{}",
            "Net PnL:",
            format_signed_currency(pnl.net_pnl),
            quote,
            local
        );

        let liquidation = format_optional(pnl.actual_liquidation_price, format_currency);
        let _ = writeln!(out, "{:<16}{}", "Liquidation:", liquidation);

        let _ = writeln!(
            out,
            "{:<16}{} ({})",
            "R/R:",
            format_ratio(&pnl.risk_reward),
            pnl.risk_reward.grade()
        );

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::compute;
    use crate::types::{Direction, TradeInputs};

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(0.0), "0.00");
        assert_eq!(format_currency(999.999), "1,000.00");
        assert_eq!(format_currency(1234567.891), "1,234,567.89");
        assert_eq!(format_currency(-1234.5), "-1,234.50");
        assert_eq!(format_currency(-0.001), "0.00");
    }

    #[test]
    fn test_format_signed_currency() {
        assert_eq!(format_signed_currency(33.333), "+33.33");
        assert_eq!(format_signed_currency(-2.0), "-2.00");
        assert_eq!(format_signed_currency(-0.004), "+0.00");
    }

    #[test]
    fn test_precision_per_kind() {
        assert_eq!(format_quantity(1.0 / 60.0), "0.016667");
        assert_eq!(format_leverage(9.615384), "9.6x");
        assert_eq!(format_ratio(&RiskReward::Ratio(1.23456)), "1.23");
        assert_eq!(format_ratio(&RiskReward::Infinite), "∞");
        assert_eq!(format_ratio(&RiskReward::NotApplicable), "-");
        assert_eq!(format_fee_rate(0.0005), "0.05%");
    }

    #[test]
    fn test_format_optional() {
        assert_eq!(format_optional(None, format_currency), "-");
        assert_eq!(format_optional(Some(5.0), format_currency), "5.00");
    }

    #[test]
    fn test_report_renders_pnl() {
        let constants = Constants::default();
        let inputs = TradeInputs::new(Direction::Short, 1000.0, 10.0, 60000.0)
            .with_manual_leverage(10.0)
            .with_target_price(58000.0);
        let outcome = compute(&inputs, &constants, Some(32.0));
        let mut rate = RateState::new("TWD");
        rate.rate = Some(32.0);
        rate.status = RateStatus::Success;

        let text = Report {
            outcome: &outcome,
            constants: &constants,
            rate: Some(&rate),
            units: &ReportUnits::default(),
        }
        .render();

        assert!(text.contains("Margin:         100.00 USDT"));
        assert!(text.contains("10.0x (manual)"));
        assert!(text.contains("0.016667 BTC"));
        assert!(text.contains("+33.33 USDT"));
        assert!(text.contains("+32.35 USDT"));
        assert!(text.contains("TWD"));
    }

    #[test]
    fn test_report_renders_error() {
        let constants = Constants::default();
        let outcome = compute(&TradeInputs::default(), &constants, None);

        let text = Report {
            outcome: &outcome,
            constants: &constants,
            rate: None,
            units: &ReportUnits::default(),
        }
        .render();

        assert!(text.contains("Error:"));
        assert!(text.contains("enter valid available funds"));
        assert!(!text.contains("Margin:"));
    }

    #[test]
    fn test_report_placeholders_without_target() {
        let constants = Constants::default();
        let inputs = TradeInputs::new(Direction::Long, 1000.0, 10.0, 50000.0);
        let outcome = compute(&inputs, &constants, None);

        let text = Report {
            outcome: &outcome,
            constants: &constants,
            rate: None,
            units: &ReportUnits::default(),
        }
        .render();

        assert!(text.contains("Leverage:       -"));
        assert!(text.contains("R/R:            -"));
    }

    #[test]
    fn test_report_shows_rate_failure_without_target() {
        let constants = Constants::default();
        let inputs = TradeInputs::new(Direction::Long, 1000.0, 10.0, 50000.0).with_manual_leverage(10.0);
        let outcome = compute(&inputs, &constants, None);
        let mut rate = RateState::new("TWD");
        rate.status = RateStatus::Error("request timed out".into());

        let text = Report {
            outcome: &outcome,
            constants: &constants,
            rate: Some(&rate),
            units: &ReportUnits::default(),
        }
        .render();

        assert!(text.contains("Rate status:    request timed out"));
        assert!(text.contains("Net PnL:        -"));
    }
}
