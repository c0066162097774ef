//! perpcalc CLI
//!
//! Commands:
//! - `calc`  compute margin, leverage, size, PnL and R/R for the current inputs
//! - `save`  persist inputs for later runs
//! - `show`  print the saved inputs
//! - `reset` forget the saved inputs
//! - `rate`  fetch the USD to local-currency rate once
//! - `watch` recompute on every exchange-rate refresh until Ctrl-C

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use perpcalc::config::Config;
use perpcalc::services::{
    Calculator, ExchangeRateMonitor, FileSettingsStore, Report, ReportUnits, SettingsService,
};
use perpcalc::sources::{ExchangeRateApiClient, RateSource};
use perpcalc::types::{Direction, NumericInput, RateState, RateStatus, TradeInputs};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "perpcalc",
    about = "Perpetual futures calculator: leverage, margin, PnL, fees and risk/reward"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the trade metrics. Flags override the saved inputs.
    Calc {
        #[command(flatten)]
        fields: FieldArgs,

        /// Use this exchange rate instead of fetching one.
        #[arg(long)]
        rate: Option<f64>,

        /// Skip the exchange-rate fetch.
        #[arg(long, default_value_t = false)]
        offline: bool,

        /// Save the merged inputs after computing.
        #[arg(long, default_value_t = false)]
        save: bool,

        /// Print the result as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Save inputs. Flags override the currently saved values.
    Save {
        #[command(flatten)]
        fields: FieldArgs,
    },
    /// Print the saved inputs.
    Show,
    /// Remove the saved inputs.
    Reset,
    /// Fetch the current exchange rate.
    Rate,
    /// Keep the exchange rate fresh and recompute on every refresh.
    Watch {
        #[command(flatten)]
        fields: FieldArgs,
    },
}

/// Input fields. An empty string clears an optional field.
#[derive(Args)]
struct FieldArgs {
    /// long or short.
    #[arg(long)]
    direction: Option<Direction>,

    /// Available funds.
    #[arg(long)]
    funds: Option<String>,

    /// Position size as a percent of funds (1-100).
    #[arg(long)]
    percent: Option<String>,

    /// Entry price.
    #[arg(long)]
    entry: Option<String>,

    /// Manual leverage (1-125). Takes precedence over --liq.
    #[arg(long)]
    leverage: Option<String>,

    /// Preset liquidation price, used to derive leverage.
    #[arg(long)]
    liq: Option<String>,

    /// Target (exit) price.
    #[arg(long)]
    target: Option<String>,
}

impl FieldArgs {
    fn apply_to(&self, inputs: &mut TradeInputs) {
        if let Some(direction) = self.direction {
            inputs.direction = direction;
        }
        if let Some(ref v) = self.funds {
            inputs.funds = NumericInput::from(v.as_str());
        }
        if let Some(ref v) = self.percent {
            inputs.position_percent = NumericInput::from(v.as_str());
        }
        if let Some(ref v) = self.entry {
            inputs.entry_price = NumericInput::from(v.as_str());
        }
        apply_optional(&mut inputs.manual_leverage, self.leverage.as_deref());
        apply_optional(&mut inputs.preset_liquidation_price, self.liq.as_deref());
        apply_optional(&mut inputs.target_price, self.target.as_deref());
    }
}

fn apply_optional(field: &mut Option<NumericInput>, value: Option<&str>) {
    match value {
        Some(v) if v.trim().is_empty() => *field = None,
        Some(v) => *field = Some(NumericInput::from(v)),
        None => {}
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing on stderr so reports stay clean on stdout
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "perpcalc=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config::from_env();
    config.validate()?;

    let store = FileSettingsStore::new(&config.settings_dir).with_context(|| {
        format!("opening settings directory {}", config.settings_dir.display())
    })?;
    let settings = SettingsService::new(Arc::new(store), config.settings_key.clone());

    match cli.command {
        Commands::Calc {
            fields,
            rate,
            offline,
            save,
            json,
        } => cmd_calc(&config, &settings, &fields, rate, offline, save, json).await,
        Commands::Save { fields } => cmd_save(&settings, &fields),
        Commands::Show => cmd_show(&settings),
        Commands::Reset => cmd_reset(&settings),
        Commands::Rate => cmd_rate(&config).await,
        Commands::Watch { fields } => cmd_watch(&config, &settings, &fields).await,
    }
}

fn merged_inputs(settings: &SettingsService, fields: &FieldArgs) -> TradeInputs {
    let mut inputs = settings.load();
    fields.apply_to(&mut inputs);
    inputs
}

fn rate_source(config: &Config) -> Arc<dyn RateSource> {
    Arc::new(ExchangeRateApiClient::new(
        config.exchange_rate_url.clone(),
        config.local_currency.clone(),
        config.rate_timeout(),
    ))
}

fn print_report(calculator: &Calculator, inputs: &TradeInputs, rate: &RateState, units: &ReportUnits) {
    let outcome = calculator.compute(inputs, rate.rate);
    let report = Report {
        outcome: &outcome,
        constants: calculator.constants(),
        rate: Some(rate),
        units,
    };
    print!("{}", report.render());
}

async fn cmd_calc(
    config: &Config,
    settings: &SettingsService,
    fields: &FieldArgs,
    rate_override: Option<f64>,
    offline: bool,
    save: bool,
    json: bool,
) -> Result<()> {
    let inputs = merged_inputs(settings, fields);
    let calculator = Calculator::new(config.constants());

    let rate = match rate_override {
        Some(rate) if rate.is_finite() && rate > 0.0 => RateState {
            currency: config.local_currency.clone(),
            rate: Some(rate),
            status: RateStatus::Success,
            updated_at: Some(chrono::Utc::now()),
        },
        Some(rate) => RateState {
            status: RateStatus::Error(format!("invalid --rate {}", rate)),
            ..RateState::new(config.local_currency.clone())
        },
        None if offline => RateState {
            status: RateStatus::Error("offline".into()),
            ..RateState::new(config.local_currency.clone())
        },
        None => {
            let monitor = ExchangeRateMonitor::new(rate_source(config), config.refresh_interval());
            monitor.refresh().await
        }
    };

    if json {
        let outcome = calculator.compute(&inputs, rate.rate);
        let body = match outcome {
            Ok(result) => json!({ "result": result, "rate": rate }),
            Err(e) => json!({ "error": e.to_string(), "rate": rate }),
        };
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        print_report(&calculator, &inputs, &rate, &config.report_units());
    }

    if save {
        save_with_status(settings, &inputs);
    }
    Ok(())
}

fn save_with_status(settings: &SettingsService, inputs: &TradeInputs) {
    match settings.save(inputs) {
        Ok(()) => println!("Settings saved"),
        Err(e) => {
            warn!("Failed to save settings: {}", e);
            println!("Save failed: {}", e);
        }
    }
}

fn cmd_save(settings: &SettingsService, fields: &FieldArgs) -> Result<()> {
    let inputs = merged_inputs(settings, fields);
    save_with_status(settings, &inputs);
    Ok(())
}

fn cmd_show(settings: &SettingsService) -> Result<()> {
    if !settings.has_saved() {
        println!("No saved settings; showing defaults");
    }
    let inputs = settings.load();
    println!("{}", serde_json::to_string_pretty(&inputs.to_snapshot())?);
    Ok(())
}

fn cmd_reset(settings: &SettingsService) -> Result<()> {
    settings.reset()?;
    println!("All settings reset");
    Ok(())
}

async fn cmd_rate(config: &Config) -> Result<()> {
    let monitor = ExchangeRateMonitor::new(rate_source(config), config.refresh_interval());
    let state = monitor.refresh().await;
    match (&state.rate, &state.status) {
        (Some(rate), _) => println!("1 USD = {} {}", rate, state.currency),
        (None, RateStatus::Error(msg)) => println!("{} rate unavailable: {}", state.currency, msg),
        (None, _) => println!("{} rate unavailable", state.currency),
    }
    Ok(())
}

async fn cmd_watch(config: &Config, settings: &SettingsService, fields: &FieldArgs) -> Result<()> {
    let inputs = merged_inputs(settings, fields);
    let calculator = Calculator::new(config.constants());
    let units = config.report_units();

    let monitor = ExchangeRateMonitor::new(rate_source(config), config.refresh_interval());
    let mut updates = monitor.subscribe();
    let handle = monitor.spawn();
    info!("Watching; press Ctrl-C to stop");

    loop {
        tokio::select! {
            update = updates.recv() => {
                match update {
                    Ok(state) => {
                        println!("--- {} ---", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));
                        print_report(&calculator, &inputs, &state, &units);
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        warn!("Skipped {} rate updates", n);
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl-C received, stopping");
                break;
            }
        }
    }

    monitor.stop();
    handle.await?;
    Ok(())
}
