//! Leverage resolution and the liquidation-price formulas it inverts.
//!
//! Forward formula (isolated margin, maintenance rate `m`):
//! - long:  `liq = entry * (1 - 1/L + m)`
//! - short: `liq = entry * (1 + 1/L - m)`

use crate::error::ValidationError;
use crate::services::parser::{is_supplied, parse_valid_number};
use crate::types::{Constants, Direction, LeverageSource, NumericInput, ResolvedLeverage};
use tracing::debug;

/// Denominators at or below this are treated as unbounded leverage.
pub const DENOMINATOR_EPSILON: f64 = 1e-9;

/// Result of trying to pick a leverage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LeverageResolution {
    Resolved(ResolvedLeverage),
    /// Not enough input to decide. Not an error.
    Unresolved,
}

impl LeverageResolution {
    pub fn leverage(&self) -> Option<ResolvedLeverage> {
        match self {
            LeverageResolution::Resolved(l) => Some(*l),
            LeverageResolution::Unresolved => None,
        }
    }
}

/// Pick the leverage for a calculation.
///
/// A manual leverage that was entered wins; if it is out of range the whole
/// calculation fails. Otherwise leverage is derived from entry and preset
/// liquidation price when both are present.
pub fn resolve_leverage(
    direction: Direction,
    manual: Option<&NumericInput>,
    entry_price: Option<f64>,
    preset_liquidation_price: Option<f64>,
    constants: &Constants,
) -> Result<LeverageResolution, ValidationError> {
    if is_supplied(manual) {
        let value = manual
            .and_then(|raw| {
                parse_valid_number(raw, constants.min_leverage, constants.max_leverage, false)
            })
            .ok_or(ValidationError::LeverageOutOfRange {
                min: constants.min_leverage,
                max: constants.max_leverage,
            })?;

        return Ok(LeverageResolution::Resolved(ResolvedLeverage {
            value,
            source: LeverageSource::Manual,
        }));
    }

    let (Some(entry), Some(liquidation)) = (entry_price, preset_liquidation_price) else {
        return Ok(LeverageResolution::Unresolved);
    };

    let derived = derive_leverage(direction, entry, liquidation, constants.maintenance_margin_rate)?;
    debug!(
        "Derived {:.4}x leverage for {} from entry {} / liquidation {}",
        derived, direction, entry, liquidation
    );

    if derived < constants.min_leverage || derived > constants.max_leverage {
        return Err(ValidationError::DerivedLeverageOutOfRange {
            leverage: derived,
            min: constants.min_leverage,
            max: constants.max_leverage,
        });
    }

    Ok(LeverageResolution::Resolved(ResolvedLeverage {
        value: derived,
        source: LeverageSource::Derived,
    }))
}

/// Invert the liquidation formula. No bounds check on the result.
///
/// The preset price must sit on the losing side of entry: below it for a
/// long, above it for a short. A denominator at or below
/// [`DENOMINATOR_EPSILON`], negative included, is rejected.
pub fn derive_leverage(
    direction: Direction,
    entry_price: f64,
    liquidation_price: f64,
    maintenance_margin_rate: f64,
) -> Result<f64, ValidationError> {
    let ratio = liquidation_price / entry_price;

    let denominator = match direction {
        Direction::Long => {
            if liquidation_price >= entry_price {
                return Err(ValidationError::LiquidationNotBelowEntry);
            }
            1.0 + maintenance_margin_rate - ratio
        }
        Direction::Short => {
            if liquidation_price <= entry_price {
                return Err(ValidationError::LiquidationNotAboveEntry);
            }
            ratio - 1.0 + maintenance_margin_rate
        }
    };

    if !(denominator > DENOMINATOR_EPSILON) {
        return Err(ValidationError::DegenerateDenominator);
    }

    Ok(1.0 / denominator)
}

/// Liquidation price implied by `leverage`; `None` when it would not be positive.
pub fn liquidation_price(
    direction: Direction,
    entry_price: f64,
    leverage: f64,
    maintenance_margin_rate: f64,
) -> Option<f64> {
    let initial_margin = 1.0 / leverage;

    let price = match direction {
        Direction::Long => entry_price * (1.0 - initial_margin + maintenance_margin_rate),
        Direction::Short => entry_price * (1.0 + initial_margin - maintenance_margin_rate),
    };

    (price.is_finite() && price > 0.0).then_some(price)
}
