use thiserror::Error;

/// Application error types.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Settings storage error: {0}")]
    Storage(String),

    #[error("External API error: {0}")]
    ExternalApi(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

/// Reasons a calculation is rejected.
///
/// The pipeline stops at the first of these; the `Display` text is what the
/// user sees.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("enter valid available funds (> 0)")]
    InvalidFunds,

    #[error("leverage must be between {min}~{max}")]
    LeverageOutOfRange { min: f64, max: f64 },

    #[error("preset liquidation price must be below entry price for long")]
    LiquidationNotBelowEntry,

    #[error("preset liquidation price must be above entry price for short")]
    LiquidationNotAboveEntry,

    #[error("cannot derive leverage from the entered prices")]
    DegenerateDenominator,

    #[error("derived leverage ({leverage:.2}x) is out of range ({min}~{max})")]
    DerivedLeverageOutOfRange { leverage: f64, min: f64, max: f64 },
}

impl ValidationError {
    /// The out-of-range derived leverage, if this error carries one.
    pub fn derived_leverage(&self) -> Option<f64> {
        match self {
            ValidationError::DerivedLeverageOutOfRange { leverage, .. } => Some(*leverage),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_messages() {
        assert_eq!(
            ValidationError::LiquidationNotBelowEntry.to_string(),
            "preset liquidation price must be below entry price for long"
        );
        assert_eq!(
            ValidationError::LeverageOutOfRange { min: 1.0, max: 125.0 }.to_string(),
            "leverage must be between 1~125"
        );
        assert_eq!(
            ValidationError::DerivedLeverageOutOfRange {
                leverage: 250.0,
                min: 1.0,
                max: 125.0
            }
            .to_string(),
            "derived leverage (250.00x) is out of range (1~125)"
        );
    }

    #[test]
    fn test_derived_leverage_accessor() {
        let err = ValidationError::DerivedLeverageOutOfRange {
            leverage: 0.5,
            min: 1.0,
            max: 125.0,
        };
        assert_eq!(err.derived_leverage(), Some(0.5));
        assert_eq!(ValidationError::InvalidFunds.derived_leverage(), None);
    }

    #[test]
    fn test_validation_converts_to_app_error() {
        let err: AppError = ValidationError::InvalidFunds.into();
        assert!(matches!(err, AppError::Validation(ValidationError::InvalidFunds)));
    }
}
