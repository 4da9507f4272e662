//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config_validation::{
    DataConfig, ReplayConfig, build_strategy, data_config, replay_config,
};
use crate::domain::error::TrendsignalError;
use crate::domain::replay::{SignalEvent, replay};
use crate::domain::strategy::{Strategy, StrategyKind};
use crate::logging::init_logging;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

#[derive(Parser, Debug)]
#[command(name = "trendsignal", about = "Trend strategy signal generator")]
pub struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the configured strategy's description and warm-up length
    Describe {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Validate a configuration file without loading data
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Replay the strategy over CSV bars and print its signals as CSV
    Signals {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        exchange: Option<String>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// List instruments with CSV data for an exchange
    ListSymbols {
        #[arg(long)]
        exchange: String,
        #[arg(long)]
        data_dir: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    init_logging(cli.verbose);

    let result = match cli.command {
        Command::Describe { config } => run_describe(&config),
        Command::Validate { config } => run_validate(&config),
        Command::Signals {
            config,
            code,
            exchange,
            data_dir,
        } => run_signals(&config, code.as_deref(), exchange.as_deref(), data_dir.as_ref()),
        Command::ListSymbols { exchange, data_dir } => run_list_symbols(&exchange, data_dir),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, TrendsignalError> {
    tracing::info!("loading config from {}", path.display());
    FileConfigAdapter::from_file(path).map_err(|e| TrendsignalError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn run_describe(config_path: &PathBuf) -> Result<(), TrendsignalError> {
    let adapter = load_config(config_path)?;
    let strategy = build_strategy(&adapter)?;
    let mut out = io::stdout().lock();
    writeln!(out, "{}", strategy.describe())?;
    writeln!(out, "required data length: {}", strategy.required_data_length())?;
    Ok(())
}

fn run_validate(config_path: &PathBuf) -> Result<(), TrendsignalError> {
    let adapter = load_config(config_path)?;
    let strategy = build_strategy(&adapter)?;
    replay_config(&adapter, strategy.required_data_length())?;
    if adapter.has_section("data") {
        data_config(&adapter, None, None, None)?;
    }
    tracing::info!(
        required_data_length = strategy.required_data_length(),
        "configuration is valid"
    );
    Ok(())
}

fn run_signals(
    config_path: &PathBuf,
    code: Option<&str>,
    exchange: Option<&str>,
    data_dir: Option<&PathBuf>,
) -> Result<(), TrendsignalError> {
    let adapter = load_config(config_path)?;
    let strategy = build_strategy(&adapter)?;
    let data = data_config(&adapter, code, exchange, data_dir)?;
    let replay_settings = replay_config(&adapter, strategy.required_data_length())?;

    let port = CsvAdapter::new(data.path.clone());
    let events = generate_signals(&port, &strategy, &data, &replay_settings)?;
    write_signals(&events, io::stdout().lock())
}

/// Load bars through `port` and replay `strategy` over them.
pub fn generate_signals(
    port: &dyn DataPort,
    strategy: &StrategyKind,
    data: &DataConfig,
    replay_settings: &ReplayConfig,
) -> Result<Vec<SignalEvent>, TrendsignalError> {
    let bars = port.fetch_ohlcv(&data.code, &data.exchange, data.start_date, data.end_date)?;
    if bars.is_empty() {
        return Err(TrendsignalError::NoData {
            code: data.code.clone(),
            exchange: data.exchange.clone(),
        });
    }

    let required = strategy.required_data_length();
    if bars.len() < required {
        tracing::warn!(
            code = %data.code,
            bars = bars.len(),
            required,
            "not enough history to evaluate any bar"
        );
    }

    let events = replay(
        strategy,
        &bars,
        replay_settings.portfolio_value,
        replay_settings.window,
    )?;
    tracing::info!(
        code = %data.code,
        exchange = %data.exchange,
        bars = bars.len(),
        signals = events.len(),
        "replay finished"
    );
    Ok(events)
}

/// Write events as CSV with a header row.
pub fn write_signals<W: Write>(events: &[SignalEvent], writer: W) -> Result<(), TrendsignalError> {
    let to_io = |e: csv::Error| TrendsignalError::Io(e.into());
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["date", "signal", "side", "close", "size", "drawdown"])
        .map_err(to_io)?;
    for event in events {
        wtr.write_record([
            event.date.format("%Y-%m-%d").to_string(),
            event.signal.to_string(),
            event.side.to_string(),
            event.close.to_string(),
            event.size.map(|s| format!("{:.4}", s)).unwrap_or_default(),
            event.drawdown.map(|d| format!("{:.4}", d)).unwrap_or_default(),
        ])
        .map_err(to_io)?;
    }
    wtr.flush()?;
    Ok(())
}

fn run_list_symbols(exchange: &str, data_dir: PathBuf) -> Result<(), TrendsignalError> {
    let port = CsvAdapter::new(data_dir);
    let symbols = port.list_symbols(exchange)?;
    if symbols.is_empty() {
        tracing::warn!(exchange, "no symbols found");
    }
    let mut out = io::stdout().lock();
    for symbol in symbols {
        writeln!(out, "{}", symbol)?;
    }
    Ok(())
}
