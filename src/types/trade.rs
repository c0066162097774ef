//! Trade Types
//!
//! Inputs, constants and results for a single leveraged perpetual-futures trade.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

// =============================================================================
// Constants
// =============================================================================

/// Lowest leverage accepted anywhere in the pipeline.
pub const MIN_LEVERAGE: f64 = 1.0;
/// Highest leverage accepted anywhere in the pipeline.
pub const MAX_LEVERAGE: f64 = 125.0;
/// Maintenance margin rate (0.4%).
pub const MAINTENANCE_MARGIN_RATE: f64 = 0.004;
/// Taker fee applied on both entry and exit (0.05%).
pub const DEFAULT_FEE_RATE: f64 = 0.0005;
/// Position percent used when nothing else is known.
pub const DEFAULT_POSITION_PERCENT: f64 = 10.0;

/// Fixed parameters of a calculation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constants {
    pub min_leverage: f64,
    pub max_leverage: f64,
    pub maintenance_margin_rate: f64,
    pub fee_rate: f64,
}

impl Constants {
    /// Default constants with a custom fee rate.
    pub fn with_fee_rate(fee_rate: f64) -> Self {
        Self {
            fee_rate,
            ..Self::default()
        }
    }
}

impl Default for Constants {
    fn default() -> Self {
        Self {
            min_leverage: MIN_LEVERAGE,
            max_leverage: MAX_LEVERAGE,
            maintenance_margin_rate: MAINTENANCE_MARGIN_RATE,
            fee_rate: DEFAULT_FEE_RATE,
        }
    }
}

// =============================================================================
// Inputs
// =============================================================================

/// Position direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Long,
    #[default]
    Short,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Long => write!(f, "long"),
            Direction::Short => write!(f, "short"),
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "long" => Ok(Direction::Long),
            "short" => Ok(Direction::Short),
            other => Err(format!("unknown direction '{}', expected long or short", other)),
        }
    }
}

/// A numeric field as the user typed it or as it was persisted.
///
/// Nothing downstream reads the value without going through
/// [`parse_valid_number`](crate::services::parse_valid_number).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumericInput {
    Number(f64),
    Text(String),
}

impl NumericInput {
    /// True for an empty or whitespace-only text value.
    pub fn is_blank(&self) -> bool {
        match self {
            NumericInput::Number(_) => false,
            NumericInput::Text(s) => s.trim().is_empty(),
        }
    }

    /// The finite number this value reads as, ignoring any range rules.
    pub fn as_finite(&self) -> Option<f64> {
        let value = match self {
            NumericInput::Number(n) => *n,
            NumericInput::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

impl Default for NumericInput {
    fn default() -> Self {
        NumericInput::Text(String::new())
    }
}

impl From<f64> for NumericInput {
    fn from(value: f64) -> Self {
        NumericInput::Number(value)
    }
}

impl From<&str> for NumericInput {
    fn from(value: &str) -> Self {
        NumericInput::Text(value.to_string())
    }
}

impl From<String> for NumericInput {
    fn from(value: String) -> Self {
        NumericInput::Text(value)
    }
}

impl std::fmt::Display for NumericInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NumericInput::Number(n) => write!(f, "{}", n),
            NumericInput::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Everything the user enters for one calculation.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeInputs {
    pub direction: Direction,
    /// Available funds in quote (stable token) units.
    pub funds: NumericInput,
    /// Share of funds committed as margin, 1-100.
    pub position_percent: NumericInput,
    pub entry_price: NumericInput,
    /// Takes precedence over the preset liquidation price when supplied.
    pub manual_leverage: Option<NumericInput>,
    /// Used to derive leverage when no manual leverage is given.
    pub preset_liquidation_price: Option<NumericInput>,
    pub target_price: Option<NumericInput>,
}

impl TradeInputs {
    /// Builder-style helper used by callers that already hold numbers.
    pub fn new(direction: Direction, funds: f64, position_percent: f64, entry_price: f64) -> Self {
        Self {
            direction,
            funds: funds.into(),
            position_percent: position_percent.into(),
            entry_price: entry_price.into(),
            ..Self::default()
        }
    }

    pub fn with_manual_leverage(mut self, leverage: impl Into<NumericInput>) -> Self {
        self.manual_leverage = Some(leverage.into());
        self
    }

    pub fn with_liquidation_price(mut self, price: impl Into<NumericInput>) -> Self {
        self.preset_liquidation_price = Some(price.into());
        self
    }

    pub fn with_target_price(mut self, price: impl Into<NumericInput>) -> Self {
        self.target_price = Some(price.into());
        self
    }
}

impl Default for TradeInputs {
    fn default() -> Self {
        Self {
            direction: Direction::default(),
            funds: NumericInput::default(),
            position_percent: NumericInput::Number(DEFAULT_POSITION_PERCENT),
            entry_price: NumericInput::default(),
            manual_leverage: None,
            preset_liquidation_price: None,
            target_price: None,
        }
    }
}

// =============================================================================
// Results
// =============================================================================

/// Where the leverage used in a calculation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeverageSource {
    /// Entered directly by the user.
    Manual,
    /// Inverted from the preset liquidation price.
    Derived,
}

impl std::fmt::Display for LeverageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LeverageSource::Manual => write!(f, "manual"),
            LeverageSource::Derived => write!(f, "derived"),
        }
    }
}

/// A leverage value that passed the bounds check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedLeverage {
    pub value: f64,
    pub source: LeverageSource,
}

/// Reward relative to the loss taken if the position is liquidated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RiskReward {
    Ratio(f64),
    /// Positive reward with no quantifiable risk.
    Infinite,
    NotApplicable,
}

/// How a risk/reward value reads at a glance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatioGrade {
    Favorable,
    Unfavorable,
    Infinite,
    NotApplicable,
}

impl RiskReward {
    pub fn grade(&self) -> RatioGrade {
        match self {
            RiskReward::Ratio(r) if *r >= 1.0 => RatioGrade::Favorable,
            RiskReward::Ratio(_) => RatioGrade::Unfavorable,
            RiskReward::Infinite => RatioGrade::Infinite,
            RiskReward::NotApplicable => RatioGrade::NotApplicable,
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            RiskReward::Ratio(r) => Some(*r),
            _ => None,
        }
    }
}

impl std::fmt::Display for RatioGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RatioGrade::Favorable => write!(f, "favorable"),
            RatioGrade::Unfavorable => write!(f, "unfavorable"),
            RatioGrade::Infinite => write!(f, "no risk"),
            RatioGrade::NotApplicable => write!(f, "n/a"),
        }
    }
}

/// Profit, fee and risk figures for a trade closed at the target price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PnlBreakdown {
    pub entry_value: f64,
    pub exit_value: f64,
    pub gross_pnl: f64,
    pub entry_fee: f64,
    pub exit_fee: f64,
    pub total_fee: f64,
    pub net_pnl: f64,
    /// Net PnL converted with the exchange rate, when one is known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_pnl_local: Option<f64>,
    pub risk_reward: RiskReward,
    /// Liquidation price implied by the leverage in use; absent when non-positive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_liquidation_price: Option<f64>,
}

/// Output of one successful calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResult {
    pub margin: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leverage: Option<ResolvedLeverage>,
    /// Position size in units of the underlying asset.
    pub position_size: f64,
    /// Present only when a target price was given and a position could be sized.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pnl: Option<PnlBreakdown>,
}
