//! Trade Metrics Calculator
//!
//! Pure pipeline: validate funds, resolve leverage, size the position, then
//! price the trade at the target. Fatal validation errors stop the pipeline;
//! a missing target price or exchange rate only leaves fields empty.

use crate::error::ValidationError;
use crate::services::leverage::{liquidation_price, resolve_leverage, DENOMINATOR_EPSILON};
use crate::services::parser::{parse_amount, parse_optional_amount, parse_percent};
use crate::types::{CalculationResult, Constants, Direction, PnlBreakdown, RiskReward, TradeInputs};
use tracing::debug;

/// Stateless calculator bound to a fixed set of constants.
#[derive(Debug, Clone, Copy, Default)]
pub struct Calculator {
    constants: Constants,
}

impl Calculator {
    pub fn new(constants: Constants) -> Self {
        Self { constants }
    }

    pub fn constants(&self) -> &Constants {
        &self.constants
    }

    /// Run the full pipeline for one set of inputs.
    pub fn compute(
        &self,
        inputs: &TradeInputs,
        exchange_rate: Option<f64>,
    ) -> Result<CalculationResult, ValidationError> {
        compute(inputs, &self.constants, exchange_rate)
    }
}

/// Run the full pipeline for one set of inputs.
pub fn compute(
    inputs: &TradeInputs,
    constants: &Constants,
    exchange_rate: Option<f64>,
) -> Result<CalculationResult, ValidationError> {
    let funds = parse_amount(&inputs.funds).ok_or(ValidationError::InvalidFunds)?;
    let percent = parse_percent(&inputs.position_percent);
    let entry = parse_amount(&inputs.entry_price);
    let preset_liquidation = parse_optional_amount(inputs.preset_liquidation_price.as_ref());
    let target = parse_optional_amount(inputs.target_price.as_ref());

    let margin = margin(Some(funds), percent);

    let leverage = resolve_leverage(
        inputs.direction,
        inputs.manual_leverage.as_ref(),
        entry,
        preset_liquidation,
        constants,
    )?
    .leverage();

    let size = position_size(margin, leverage.map(|l| l.value), entry);

    let pnl = match (leverage, entry, target) {
        (Some(lev), Some(entry), Some(target)) if size > 0.0 => Some(pnl_breakdown(
            inputs.direction,
            size,
            entry,
            target,
            lev.value,
            constants,
            exchange_rate,
        )),
        _ => None,
    };

    debug!(
        "Computed {} trade: margin={:.2} leverage={:?} size={:.6} pnl={}",
        inputs.direction,
        margin,
        leverage.map(|l| l.value),
        size,
        pnl.as_ref().map(|p| format!("{:.2}", p.net_pnl)).unwrap_or_else(|| "-".into())
    );

    Ok(CalculationResult {
        margin,
        leverage,
        position_size: size,
        pnl,
    })
}

/// `funds * percent / 100`, or zero when either is missing.
pub fn margin(funds: Option<f64>, percent: Option<f64>) -> f64 {
    match (funds, percent) {
        (Some(f), Some(p)) => f * p / 100.0,
        _ => 0.0,
    }
}

/// Units of the underlying asset bought with `margin` at `leverage`.
/// Zero unless margin is positive and both leverage and entry are known.
pub fn position_size(margin: f64, leverage: Option<f64>, entry_price: Option<f64>) -> f64 {
    match (leverage, entry_price) {
        (Some(lev), Some(entry)) if margin > 0.0 => margin * lev / entry,
        _ => 0.0,
    }
}

/// PnL, fees and risk/reward for closing `size` units at `target_price`.
pub fn pnl_breakdown(
    direction: Direction,
    size: f64,
    entry_price: f64,
    target_price: f64,
    leverage: f64,
    constants: &Constants,
    exchange_rate: Option<f64>,
) -> PnlBreakdown {
    let fee_rate = constants.fee_rate;
    let actual_liquidation_price =
        liquidation_price(direction, entry_price, leverage, constants.maintenance_margin_rate);

    let entry_value = size * entry_price;
    let exit_value = size * target_price;
    let gross_pnl = match direction {
        Direction::Long => exit_value - entry_value,
        Direction::Short => entry_value - exit_value,
    };

    let entry_fee = entry_value * fee_rate;
    let exit_fee = exit_value * fee_rate;
    let total_fee = entry_fee + exit_fee;
    let net_pnl = gross_pnl - total_fee;

    let risk_reward = match actual_liquidation_price {
        Some(liq) => {
            let risk_exit_value = size * liq;
            let potential_loss = match direction {
                Direction::Long => entry_value - risk_exit_value,
                Direction::Short => risk_exit_value - entry_value,
            };
            let total_risk = potential_loss + entry_fee + risk_exit_value * fee_rate;
            risk_reward(net_pnl, total_risk)
        }
        None => RiskReward::NotApplicable,
    };

    PnlBreakdown {
        entry_value,
        exit_value,
        gross_pnl,
        entry_fee,
        exit_fee,
        total_fee,
        net_pnl,
        net_pnl_local: exchange_rate.map(|rate| net_pnl * rate),
        risk_reward,
        actual_liquidation_price,
    }
}

/// `|net_pnl| / total_risk`, or Infinite for a gain with no measurable risk.
pub fn risk_reward(net_pnl: f64, total_risk: f64) -> RiskReward {
    if total_risk > DENOMINATOR_EPSILON {
        RiskReward::Ratio(net_pnl.abs() / total_risk)
    } else if net_pnl > 0.0 {
        RiskReward::Infinite
    } else {
        RiskReward::NotApplicable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LeverageSource;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    // =========================================================================
    // Pipeline
    // =========================================================================

    #[test]
    fn test_short_with_manual_leverage() {
        let inputs = TradeInputs::new(Direction::Short, 1000.0, 10.0, 60000.0)
            .with_manual_leverage(10.0)
            .with_target_price(58000.0);

        let result = compute(&inputs, &Constants::default(), None).unwrap();
        let pnl = result.pnl.unwrap();

        assert!(close(result.margin, 100.0, 1e-9));
        assert_eq!(result.leverage.unwrap().source, LeverageSource::Manual);
        assert!(close(result.position_size, 0.016667, 1e-6));
        assert!(close(pnl.entry_value, 1000.0, 1e-9));
        assert!(close(pnl.exit_value, 966.6667, 1e-4));
        assert!(close(pnl.gross_pnl, 33.33, 1e-2));
        assert!(close(pnl.total_fee, 0.98, 1e-2));
        assert!(close(pnl.net_pnl, 32.35, 1e-2));
        assert_eq!(pnl.net_pnl_local, None);
    }

    #[test]
    fn test_invalid_funds_short_circuits() {
        for funds in ["", "0", "-10", "abc"] {
            let mut inputs = TradeInputs::new(Direction::Long, 1.0, 10.0, 60000.0)
                .with_manual_leverage("10")
                .with_target_price("61000");
            inputs.funds = funds.into();

            assert_eq!(
                compute(&inputs, &Constants::default(), Some(31.5)),
                Err(ValidationError::InvalidFunds)
            );
        }
    }

    #[test]
    fn test_margin_only_without_leverage() {
        let inputs = TradeInputs::new(Direction::Long, 2000.0, 50.0, 60000.0);
        let result = compute(&inputs, &Constants::default(), None).unwrap();

        assert!(close(result.margin, 1000.0, 1e-9));
        assert!(result.leverage.is_none());
        assert_eq!(result.position_size, 0.0);
        assert!(result.pnl.is_none());
    }

    #[test]
    fn test_invalid_percent_zeroes_margin() {
        let mut inputs = TradeInputs::new(Direction::Long, 2000.0, 50.0, 60000.0)
            .with_manual_leverage(5.0)
            .with_target_price(61000.0);
        inputs.position_percent = "150".into();

        let result = compute(&inputs, &Constants::default(), None).unwrap();
        assert_eq!(result.margin, 0.0);
        assert_eq!(result.position_size, 0.0);
        assert!(result.pnl.is_none());
        assert!(result.leverage.is_some());
    }

    #[test]
    fn test_missing_target_skips_pnl() {
        let inputs = TradeInputs::new(Direction::Long, 1000.0, 10.0, 50000.0)
            .with_liquidation_price(45000.0);
        let result = compute(&inputs, &Constants::default(), None).unwrap();

        assert_eq!(result.leverage.unwrap().source, LeverageSource::Derived);
        assert!(result.position_size > 0.0);
        assert!(result.pnl.is_none());
    }

    #[test]
    fn test_exchange_rate_converts_net_pnl() {
        let inputs = TradeInputs::new(Direction::Long, 1000.0, 10.0, 50000.0)
            .with_manual_leverage(10.0)
            .with_target_price(51000.0);
        let pnl = compute(&inputs, &Constants::default(), Some(32.0))
            .unwrap()
            .pnl
            .unwrap();

        assert!(close(pnl.net_pnl_local.unwrap(), pnl.net_pnl * 32.0, 1e-9));
    }

    #[test]
    fn test_fee_rate_is_respected() {
        let inputs = TradeInputs::new(Direction::Long, 1000.0, 10.0, 50000.0)
            .with_manual_leverage(10.0)
            .with_target_price(50000.0);
        let pnl = compute(&inputs, &Constants::with_fee_rate(0.001), None)
            .unwrap()
            .pnl
            .unwrap();

        // 1000 notional in and out at 0.1%.
        assert!(close(pnl.total_fee, 2.0, 1e-9));
        assert!(close(pnl.net_pnl, -2.0, 1e-9));
    }

    // =========================================================================
    // Risk / reward
    // =========================================================================

    #[test]
    fn test_risk_reward_ratio() {
        let inputs = TradeInputs::new(Direction::Long, 1000.0, 10.0, 50000.0)
            .with_manual_leverage(10.0)
            .with_target_price(55000.0);
        let pnl = compute(&inputs, &Constants::default(), None)
            .unwrap()
            .pnl
            .unwrap();

        let liq = pnl.actual_liquidation_price.unwrap();
        assert!(close(liq, 50000.0 * 0.904, 1e-6));

        let size = 0.02;
        let risk_exit = size * liq;
        let total_risk = (pnl.entry_value - risk_exit) + pnl.entry_fee + risk_exit * 0.0005;
        match pnl.risk_reward {
            RiskReward::Ratio(r) => assert!(close(r, pnl.net_pnl.abs() / total_risk, 1e-9)),
            other => panic!("expected ratio, got {:?}", other),
        }
    }

    #[test]
    fn test_risk_reward_edges() {
        assert_eq!(risk_reward(10.0, 0.0), RiskReward::Infinite);
        assert_eq!(risk_reward(10.0, 1e-9), RiskReward::Infinite);
        assert_eq!(risk_reward(10.0, -5.0), RiskReward::Infinite);
        assert_eq!(risk_reward(0.0, 0.0), RiskReward::NotApplicable);
        assert_eq!(risk_reward(-3.0, -1.0), RiskReward::NotApplicable);
        assert_eq!(risk_reward(-3.0, 2.0), RiskReward::Ratio(1.5));
    }

    #[test]
    fn test_non_positive_liquidation_is_not_applicable() {
        let constants = Constants {
            min_leverage: 0.5,
            ..Constants::default()
        };
        let inputs = TradeInputs::new(Direction::Long, 1000.0, 10.0, 50000.0)
            .with_manual_leverage(0.5)
            .with_target_price(55000.0);
        let pnl = compute(&inputs, &constants, None).unwrap().pnl.unwrap();

        assert_eq!(pnl.actual_liquidation_price, None);
        assert_eq!(pnl.risk_reward, RiskReward::NotApplicable);
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    #[test]
    fn test_margin_helper() {
        assert_eq!(margin(Some(1000.0), Some(10.0)), 100.0);
        assert_eq!(margin(Some(1000.0), None), 0.0);
        assert_eq!(margin(None, Some(10.0)), 0.0);
    }

    #[test]
    fn test_position_size_helper() {
        assert!(close(position_size(100.0, Some(10.0), Some(50000.0)), 0.02, 1e-12));
        assert_eq!(position_size(0.0, Some(10.0), Some(50000.0)), 0.0);
        assert_eq!(position_size(100.0, None, Some(50000.0)), 0.0);
        assert_eq!(position_size(100.0, Some(10.0), None), 0.0);
    }
}
