//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use log::info;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::calendar_adapter::WeekdayCalendar;
use crate::adapters::csv_chain_adapter::CsvChainAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::paper_broker::PaperBroker;
use crate::domain::config_validation::{
    has_window, parse_date, parse_roots, validate_engine_config, validate_selection_config,
    window_section,
};
use crate::domain::error::ChainrollError;
use crate::domain::filter::{DEFAULT_MAX_EXPIRY_DAYS, DEFAULT_MIN_HORIZON_DAYS, ExpiryWindow, FilterConfig};
use crate::domain::position::{Action, PositionState};
use crate::domain::replay::{self, EngineConfig, ReplayResult};
use crate::domain::selector::{AggregationPolicy, RolloverSelector, SelectorConfig};
use crate::ports::chain_port::ChainPort;
use crate::ports::config_port::ConfigPort;
use crate::ports::market_port::MarketHours;
use crate::ports::order_port::OrderPort;

#[derive(Parser, Debug)]
#[command(name = "chainroll", about = "Futures front-contract selection and rollover")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay the selector day by day over the configured date range
    Run {
        #[arg(short, long)]
        config: PathBuf,
        /// Contract listing CSV, overriding [data] contracts
        #[arg(long)]
        contracts: Option<PathBuf>,
        /// Where to write the order log CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Show the decision for a single date
    Decide {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        date: String,
        /// Symbol currently held, if any
        #[arg(long)]
        holding: Option<String>,
        #[arg(long)]
        contracts: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Dispatches a parsed command, leaving exit-status mapping to [`run`].
pub fn execute(cli: Cli) -> Result<(), ChainrollError> {
    match cli.command {
        Command::Run {
            config,
            contracts,
            output,
            dry_run,
        } => {
            if dry_run {
                run_validate(&config)
            } else {
                run_replay_command(&config, contracts.as_deref(), output.as_deref())
            }
        }
        Command::Decide {
            config,
            date,
            holding,
            contracts,
        } => run_decide(&config, &date, holding, contracts.as_deref()),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ChainrollError> {
    eprintln!("Loading config from {}", path.display());
    FileConfigAdapter::from_file(path)
}

pub fn build_engine_config(config: &dyn ConfigPort) -> Result<EngineConfig, ChainrollError> {
    let start_date = parse_date(
        config.get_string("engine", "start_date").as_deref(),
        "engine",
        "start_date",
    )?;
    let end_date = parse_date(
        config.get_string("engine", "end_date").as_deref(),
        "engine",
        "end_date",
    )?;
    let roots = config
        .get_string("selection", "futures")
        .ok_or_else(|| ChainrollError::missing("selection", "futures"))?;

    Ok(EngineConfig {
        start_date,
        end_date,
        cash: config.get_double("engine", "cash", 100_000.0)?,
        roots: parse_roots(&roots)?,
    })
}

pub fn build_selector_config(config: &dyn ConfigPort) -> Result<SelectorConfig, ChainrollError> {
    let mut filter = FilterConfig::new(config.get_int(
        "selection",
        "min_horizon_days",
        DEFAULT_MIN_HORIZON_DAYS,
    )?)?;

    let roots = config.get_string("selection", "futures").unwrap_or_default();
    for root in parse_roots(&roots)? {
        if !has_window(config, &root) {
            continue;
        }
        let section = window_section(&root);
        let window = ExpiryWindow::new(
            config.get_int(&section, "min_expiry_days", 0)?,
            config.get_int(&section, "max_expiry_days", DEFAULT_MAX_EXPIRY_DAYS)?,
        )?;
        filter = filter.with_window(root, window);
    }

    let aggregation = match config.get_string("selection", "aggregation") {
        Some(s) => s.parse()?,
        None => AggregationPolicy::default(),
    };

    Ok(SelectorConfig {
        filter,
        quantity: config.get_int("selection", "quantity", 1)?,
        aggregation,
    })
}

/// The listing path from the command line, else from `[data] contracts`
/// resolved relative to the config file.
pub fn resolve_contracts_path(
    cli_override: Option<&Path>,
    config: &dyn ConfigPort,
    config_path: &Path,
) -> Result<PathBuf, ChainrollError> {
    if let Some(p) = cli_override {
        return Ok(p.to_path_buf());
    }
    let configured = config
        .get_string("data", "contracts")
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ChainrollError::missing("data", "contracts"))?;
    let path = PathBuf::from(configured.trim());
    if path.is_absolute() {
        return Ok(path);
    }
    Ok(config_path
        .parent()
        .map(|dir| dir.join(&path))
        .unwrap_or(path))
}

fn validated(config_path: &Path) -> Result<FileConfigAdapter, ChainrollError> {
    let adapter = load_config(config_path)?;
    validate_engine_config(&adapter)?;
    validate_selection_config(&adapter)?;
    Ok(adapter)
}

fn run_replay_command(
    config_path: &Path,
    contracts_override: Option<&Path>,
    output: Option<&Path>,
) -> Result<(), ChainrollError> {
    let adapter = validated(config_path)?;
    let engine_config = build_engine_config(&adapter)?;
    let selector = RolloverSelector::new(build_selector_config(&adapter)?)?;
    let market = WeekdayCalendar::from_config(&adapter)?;
    info!("{} holidays configured", market.holiday_count());

    let contracts_path = resolve_contracts_path(contracts_override, &adapter, config_path)?;
    eprintln!("Loading contracts from {}", contracts_path.display());
    let chains = CsvChainAdapter::from_file(&contracts_path)?;
    info!("{} contracts listed", chains.contract_count());

    let mut broker = PaperBroker::new();
    let result = run_replay_pipeline(&chains, &market, &mut broker, &selector, &engine_config)?;

    print_summary(&result, &engine_config);

    match output {
        Some(path) => {
            let file = File::create(path)?;
            broker.write_csv(BufWriter::new(file))?;
            eprintln!("\nOrder log written to: {}", path.display());
        }
        None => broker.write_csv(std::io::stdout().lock())?,
    }
    Ok(())
}

pub fn run_replay_pipeline(
    chains: &dyn ChainPort,
    market: &dyn MarketHours,
    broker: &mut dyn OrderPort,
    selector: &RolloverSelector,
    engine_config: &EngineConfig,
) -> Result<ReplayResult, ChainrollError> {
    let listed = chains.underlyings()?;
    for root in &engine_config.roots {
        if !listed.contains(root) {
            eprintln!("warning: no contracts listed for {}", root);
        }
    }
    replay::run_replay(chains, market, broker, selector, engine_config)
}

fn print_summary(result: &ReplayResult, engine_config: &EngineConfig) {
    eprintln!("\n=== Replay Summary ===");
    eprintln!(
        "Period:        {} to {}",
        engine_config.start_date, engine_config.end_date
    );
    eprintln!("Futures:       {}", engine_config.roots.join(", "));
    eprintln!("Cash:          {:.2}", engine_config.cash);
    eprintln!("Steps:         {}", result.step_count());
    eprintln!("Entries:       {}", result.entries());
    eprintln!("Liquidations:  {}", result.liquidations());
    eprintln!("No-ops:        {}", result.no_ops());
    match result.final_position.held_symbol() {
        Some(symbol) => eprintln!("Final:         holding {}", symbol),
        None => eprintln!("Final:         flat"),
    }
}

fn run_decide(
    config_path: &Path,
    date: &str,
    holding: Option<String>,
    contracts_override: Option<&Path>,
) -> Result<(), ChainrollError> {
    let action = decide_at(config_path, date, holding, contracts_override)?;
    println!("{}", action);
    Ok(())
}

/// Loads the configured listing and returns the selector's action for the
/// trading day `date`, given the symbol currently held (if any).
pub fn decide_at(
    config_path: &Path,
    date: &str,
    holding: Option<String>,
    contracts_override: Option<&Path>,
) -> Result<Action, ChainrollError> {
    let adapter = validated(config_path)?;
    let engine_config = build_engine_config(&adapter)?;
    let selector = RolloverSelector::new(build_selector_config(&adapter)?)?;
    let market = WeekdayCalendar::from_config(&adapter)?;
    let contracts_path = resolve_contracts_path(contracts_override, &adapter, config_path)?;
    let chains = CsvChainAdapter::from_file(&contracts_path)?;

    let day = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").map_err(|_| {
        ChainrollError::invalid("cli", "date", "invalid date format, expected YYYY-MM-DD")
    })?;
    let now = day.and_time(chrono::NaiveTime::MIN);
    let snapshot = replay::build_snapshot(&chains, &engine_config.roots, now)?;
    let position = match holding {
        Some(symbol) => PositionState::Holding(symbol),
        None => PositionState::Flat,
    };

    eprintln!("\nCandidates at {}:", now);
    for candidate in selector.candidates(now, &snapshot) {
        match candidate.front {
            Some(c) => eprintln!("  {}: {} (expires {})", candidate.underlying, c.symbol, c.expiry),
            None => eprintln!("  {}: none eligible", candidate.underlying),
        }
    }

    Ok(selector.decide(now, &snapshot, &position, &market))
}

fn run_validate(config_path: &Path) -> Result<(), ChainrollError> {
    let adapter = validated(config_path)?;
    let engine_config = build_engine_config(&adapter)?;
    let selector_config = build_selector_config(&adapter)?;

    eprintln!("\nEngine:");
    eprintln!(
        "  period: {} to {}",
        engine_config.start_date, engine_config.end_date
    );
    eprintln!("  cash:   {:.2}", engine_config.cash);

    eprintln!("\nSelection:");
    eprintln!(
        "  min horizon: {} days",
        selector_config.filter.min_horizon().num_days()
    );
    eprintln!("  quantity:    {}", selector_config.quantity);
    eprintln!("  aggregation: {:?}", selector_config.aggregation);
    for root in &engine_config.roots {
        match selector_config.filter.window(root) {
            Some(w) => eprintln!("  {}: expiry window {}..={} days", root, w.min_days, w.max_days),
            None => eprintln!("  {}: no expiry window", root),
        }
    }

    eprintln!("\nConfiguration is valid.");
    Ok(())
}
