pub mod calculator;
pub mod display;
pub mod leverage;
pub mod parser;
pub mod rate_monitor;
pub mod settings;
pub mod settings_store;

pub use calculator::{compute, margin, pnl_breakdown, position_size, risk_reward, Calculator};
pub use display::{Report, ReportUnits, PLACEHOLDER};
pub use leverage::{
    derive_leverage, liquidation_price, resolve_leverage, LeverageResolution, DENOMINATOR_EPSILON,
};
pub use parser::{parse_valid_number, MIN_AMOUNT};
pub use rate_monitor::ExchangeRateMonitor;
pub use settings::{SettingsService, DEFAULT_SETTINGS_KEY};
pub use settings_store::{FileSettingsStore, MemorySettingsStore, SettingsStore};
