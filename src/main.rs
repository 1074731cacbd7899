//! TIDE - Autonomous buyback and liquidity engine for Solana
//!
//! Binary entry point: parses the CLI, wires adapters into the engine and
//! drives it from the scheduler.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{fmt, EnvFilter};

use tide_engine::adapters::cli::{CliApp, Command, OutputFormat, QuoteCmd, RunCmd, StatusCmd};
use tide_engine::adapters::dexscreener::{DexScreenerClient, DexScreenerConfig};
use tide_engine::adapters::jupiter::{JupiterClient, JupiterConfig, JupiterSwapGateway};
use tide_engine::adapters::simulation::SimulatedSwapGateway;
use tide_engine::adapters::solana::{SolanaClient, WalletManager};
use tide_engine::application::{BuybackEngine, EngineSettings, EventFeed, Scheduler};
use tide_engine::config::{load_config, Config, ExecutionMode};
use tide_engine::domain::{sol_to_lamports, EngineRuntimeState, EngineStatus, PriceImpactBreaker};
use tide_engine::ports::{QuoteRequest, SwapGateway};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (secrets go here, not in the TOML file)
    dotenvy::dotenv().ok();

    let app = CliApp::parse();
    init_logging(app.verbose, app.debug)?;

    match app.command {
        Command::Run(cmd) => run_command(cmd).await,
        Command::Status(cmd) => status_command(cmd).await,
        Command::Quote(cmd) => quote_command(cmd).await,
    }
}

fn init_logging(verbose: bool, debug: bool) -> Result<()> {
    let default = if debug {
        "info,tide_engine=trace"
    } else if verbose {
        "info,tide_engine=debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))
}

/// Adapters shared by every command
struct Components {
    config: Config,
    wallet: WalletManager,
    solana: SolanaClient,
    dexscreener: DexScreenerClient,
    gateway: JupiterSwapGateway,
}

fn build_components(config_path: Option<&Path>) -> Result<Components> {
    let config = load_config(config_path).context("Failed to load configuration")?;
    components_from(config)
}

fn components_from(config: Config) -> Result<Components> {
    let wallet = WalletManager::from_credential(&config.credential)
        .context("Failed to load signing credential")?;

    let solana = SolanaClient::new(
        config.rpc_url.clone(),
        Duration::from_secs(config.call_timeout_secs),
    );
    let jupiter = JupiterClient::with_config(JupiterConfig::from(&config))
        .context("Failed to create Jupiter client")?;
    let dexscreener = DexScreenerClient::with_config(DexScreenerConfig::from(&config))
        .context("Failed to create DexScreener client")?;
    let gateway = JupiterSwapGateway::new(jupiter, solana.clone(), wallet.clone())
        .with_priority_fee(config.priority_fee_lamports);

    Ok(Components {
        config,
        wallet,
        solana,
        dexscreener,
        gateway,
    })
}

fn build_engine(components: Components) -> Result<(Config, Arc<BuybackEngine>)> {
    let Components {
        config,
        wallet,
        solana,
        dexscreener,
        gateway,
    } = components;

    let settings = EngineSettings::from_config(&config, &wallet.public_key())?;
    let gateway: Arc<dyn SwapGateway> = match config.mode {
        ExecutionMode::Simulate => Arc::new(SimulatedSwapGateway::new(gateway)),
        ExecutionMode::Live => Arc::new(gateway),
    };

    let engine = BuybackEngine::new(settings, Arc::new(solana), Arc::new(dexscreener), gateway);
    Ok((config, Arc::new(engine)))
}

async fn run_command(cmd: RunCmd) -> Result<()> {
    let mut config = load_config(cmd.config.as_deref()).context("Failed to load configuration")?;

    if cmd.simulate {
        config.mode = ExecutionMode::Simulate;
    } else if cmd.live {
        config.mode = ExecutionMode::Live;
    }

    if config.mode.is_live() && !cmd.i_accept_losses {
        bail!(
            "Live mode submits real swaps from the engine wallet.\n\
             Re-run with --i-accept-losses to confirm, or use ENGINE_MODE=simulate."
        );
    }

    let (config, engine) = build_engine(components_from(config)?)?;

    let mut feed = EventFeed::new();
    if let Some(path) = &config.events_file {
        feed = feed
            .with_events_file(path)
            .with_context(|| format!("Failed to open events file {}", path.display()))?;
    }
    if let Some(path) = &config.status_file {
        feed = feed.with_status_file(path);
    }

    log_banner(&config, engine.settings());

    let (balance, market) = engine.probe().await;
    match balance {
        Ok(balance) => tracing::info!("Accumulator balance: {:.4} SOL", balance),
        Err(e) => tracing::warn!("Startup balance read failed: {}", e),
    }
    match market {
        Ok(status) if status.graduated => {
            tracing::info!("Token graduated (mcap ${:.0})", status.market_cap)
        }
        Ok(status) => tracing::info!(
            "Token on bonding curve: {:.1}% (mcap ${:.0})",
            status.bonding_curve_progress,
            status.market_cap
        ),
        Err(e) => tracing::warn!("Startup market status read failed: {}", e),
    }

    let scheduler = Scheduler::new(
        engine,
        Arc::new(feed),
        Duration::from_millis(config.poll_interval_ms),
    );

    // Setup Ctrl+C handler
    let sched = scheduler.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("Shutdown signal received");
        sched.stop().await;
    });

    if !config.mode.is_live() {
        tracing::warn!("SIMULATION MODE - swaps are not submitted");
    }

    scheduler.run().await;

    let status = scheduler.status().await;
    tracing::info!(
        "TIDE engine stopped after {} cycles (buyback {:.4} SOL, liquidity {:.4} SOL)",
        status.cycle_count,
        status.total_buybacks,
        status.total_liquidity_added
    );
    Ok(())
}

fn log_banner(config: &Config, settings: &EngineSettings) {
    tracing::info!("==============================================");
    tracing::info!("  TIDE buyback & liquidity engine");
    tracing::info!("==============================================");
    tracing::info!("  Mode:        {}", settings.mode.as_str().to_uppercase());
    tracing::info!("  Token:       {}", settings.token_mint);
    tracing::info!(
        "  LP pair:     {}",
        settings.lp_pair.as_deref().unwrap_or("(discover at graduation)")
    );
    tracing::info!("  Accumulator: {}", settings.accumulator_wallet);
    tracing::info!("  Threshold:   {} SOL", settings.trigger_threshold_sol);
    tracing::info!(
        "  Allocation:  {}% buyback / {}% liquidity",
        settings.buyback_pct,
        settings.lp_add_pct
    );
    tracing::info!(
        "  Slippage:    {} bps ({:.2}%)",
        settings.max_slippage_bps,
        settings.max_slippage_bps as f64 / 100.0
    );
    tracing::info!("  Cooldown:    {}s", settings.cooldown_seconds);
    tracing::info!("  Poll:        {}ms", config.poll_interval_ms);
    tracing::info!(
        "  Timeouts:    {}s calls / {}s swaps",
        config.call_timeout_secs,
        config.execution_timeout_secs
    );
    tracing::info!("  RPC:         {}", config.rpc_url);
    tracing::info!("==============================================");
}

async fn status_command(cmd: StatusCmd) -> Result<()> {
    let mut config = load_config(cmd.config.as_deref()).context("Failed to load configuration")?;
    let configured_mode = config.mode;
    // Status never executes, keep the engine off the live gateway
    config.mode = ExecutionMode::Simulate;

    let (_, engine) = build_engine(components_from(config)?)?;
    let (balance, market) = engine.probe().await;
    if let Err(e) = &balance {
        tracing::warn!("Balance read failed: {}", e);
    }
    if let Err(e) = &market {
        tracing::warn!("Market status read failed: {}", e);
    }

    let mut status = engine.status(&EngineRuntimeState::new(), Utc::now(), 0).await;
    status.mode = configured_mode.as_str().to_string();

    match cmd.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&status)?),
        OutputFormat::Text => print_status(&status, engine.settings()),
    }
    Ok(())
}

fn print_status(status: &EngineStatus, settings: &EngineSettings) {
    println!("TIDE engine status ({})", status.mode);
    println!("  Accumulator:   {}", settings.accumulator_wallet);
    println!(
        "  Balance:       {:.4} / {:.4} SOL ({:.1}%)",
        status.accumulator_balance, status.trigger_threshold, status.fill_percentage
    );
    if status.graduated {
        println!("  Market:        graduated");
    } else {
        println!(
            "  Market:        bonding curve {:.1}%",
            status.bonding_curve_progress
        );
    }
    println!("  Max slippage:  {} bps", status.max_slippage_bps);
}

async fn quote_command(cmd: QuoteCmd) -> Result<()> {
    if !(cmd.amount > 0.0) {
        bail!("Amount must be positive, got {}", cmd.amount);
    }

    let components = build_components(cmd.config.as_deref())?;
    let slippage_bps = cmd.slippage.unwrap_or(components.config.max_slippage_bps);
    let breaker = PriceImpactBreaker::new(components.config.max_slippage_bps);

    let request = QuoteRequest::buy(
        &components.config.token_mint,
        sol_to_lamports(cmd.amount),
        slippage_bps,
    );
    let quote = components
        .gateway
        .get_quote(request)
        .await
        .context("Failed to get quote")?;

    println!("Quote: {} SOL -> {}", cmd.amount, quote.output_mint);
    println!("  Input:         {} lamports", quote.in_amount);
    println!("  Output:        {} (min {})", quote.out_amount, quote.min_out_amount);
    println!("  Price impact:  {:.4}%", quote.price_impact_pct);
    println!("  Route:         {}", quote.route);
    println!("  Slippage:      {} bps", slippage_bps);
    match breaker.check(quote.price_impact_pct) {
        Ok(()) => println!("  Breaker:       pass"),
        Err(trip) => println!("  Breaker:       {}", trip),
    }
    Ok(())
}
