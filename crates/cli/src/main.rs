//! Command line interface for the grid liquidity manager.
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use dotenv::dotenv;
use grid_lp_domain::config::GridConfig;
use grid_lp_domain::entities::Principal;
use grid_lp_domain::enums::{DistributionKind, GridType, StraddlePolicy};
use grid_lp_domain::math::distribution::distribution_weights;
use grid_lp_domain::math::price_tick::{price_to_tick, tick_to_price};
use grid_lp_domain::math::tick_grid::calculate_grid_ticks;
use grid_lp_domain::value_objects::CellSide;
use grid_lp_execution::keeper::{Keeper, KeeperConfig};
use grid_lp_execution::manager::{DistributionParams, GridPositionManager};
use grid_lp_protocols::memory::MemoryVenue;
use grid_lp_simulation::backtest::{BacktestConfig, GridBacktest};
use grid_lp_simulation::price_path::{GeometricBrownianMotion, PricePathGenerator};
use grid_lp_simulation::volume::ConstantVolume;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "grid-lp")]
#[command(about = "Grid liquidity manager for concentrated-liquidity venues", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the grid boundaries and weights around a tick
    Grid {
        /// Reference tick
        #[arg(long, allow_hyphen_values = true)]
        tick: i32,

        #[command(flatten)]
        grid: GridArgs,
    },
    /// Backtest a grid over a simulated price path
    Simulate {
        #[command(flatten)]
        grid: GridArgs,

        #[command(flatten)]
        market: MarketArgs,

        /// Number of steps
        #[arg(long, default_value_t = 168)]
        steps: usize,

        /// Seconds per step
        #[arg(long, default_value_t = 3600)]
        step_secs: u64,

        /// Swap volume per step, in raw token units
        #[arg(long, default_value = "1000000000")]
        volume: Decimal,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run the keeper against a simulated venue for a bounded number of rounds
    Keeper {
        #[command(flatten)]
        grid: GridArgs,

        #[command(flatten)]
        market: MarketArgs,

        /// Rounds to run
        #[arg(long, default_value_t = 10)]
        rounds: u64,

        /// Milliseconds between keeper rounds
        #[arg(long, default_value_t = 500)]
        interval_ms: u64,

        /// Largest tick move per market update
        #[arg(long, default_value_t = 30)]
        max_move: i32,

        /// Swap fees credited per market update
        #[arg(long, default_value_t = 50_000)]
        fees: u128,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum GridTypeArg {
    Neutral,
    Buy,
    Sell,
}

impl From<GridTypeArg> for GridType {
    fn from(value: GridTypeArg) -> Self {
        match value {
            GridTypeArg::Neutral => GridType::Neutral,
            GridTypeArg::Buy => GridType::Buy,
            GridTypeArg::Sell => GridType::Sell,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum DistributionArg {
    Flat,
    Linear,
    ReverseLinear,
    Fibonacci,
    Sigmoid,
    Logarithmic,
}

impl From<DistributionArg> for DistributionKind {
    fn from(value: DistributionArg) -> Self {
        match value {
            DistributionArg::Flat => DistributionKind::Flat,
            DistributionArg::Linear => DistributionKind::Linear,
            DistributionArg::ReverseLinear => DistributionKind::ReverseLinear,
            DistributionArg::Fibonacci => DistributionKind::Fibonacci,
            DistributionArg::Sigmoid => DistributionKind::Sigmoid,
            DistributionArg::Logarithmic => DistributionKind::Logarithmic,
        }
    }
}

/// Grid shape shared by every command.
#[derive(Args)]
struct GridArgs {
    /// JSON file holding a grid configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Grid quantity, overrides the configuration file
    #[arg(long)]
    quantity: Option<u32>,

    /// Grid step, overrides the configuration file
    #[arg(long)]
    step: Option<u32>,

    /// Keep the cell containing the reference tick in the grid
    #[arg(long)]
    keep_straddling: bool,

    #[arg(long, value_enum, default_value = "neutral")]
    grid_type: GridTypeArg,

    #[arg(long, value_enum, default_value = "flat")]
    distribution: DistributionArg,

    /// Venue tick spacing
    #[arg(long, default_value_t = 10)]
    spacing: i32,

    /// Slippage tolerance in basis points
    #[arg(long, default_value_t = 100)]
    slippage_bps: u32,
}

impl GridArgs {
    fn load_config(&self) -> Result<GridConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                serde_json::from_str::<GridConfig>(&raw)
                    .with_context(|| format!("parsing {}", path.display()))?
            }
            None => GridConfig::default(),
        };
        if let Some(quantity) = self.quantity {
            config.grid_quantity = quantity;
        }
        if let Some(step) = self.step {
            config.grid_step = step;
        }
        if self.keep_straddling {
            config.straddle_policy = StraddlePolicy::Keep;
        }
        config.validate()?;
        Ok(config)
    }

    fn params(&self) -> DistributionParams {
        DistributionParams::new(
            self.slippage_bps,
            self.grid_type.into(),
            self.distribution.into(),
        )
    }
}

/// Starting market and capital for simulated runs.
#[derive(Args)]
struct MarketArgs {
    /// Initial price of token0 in token1
    #[arg(long, default_value = "1.1")]
    price: Decimal,

    /// Annualized drift
    #[arg(long, default_value_t = 0.0)]
    drift: f64,

    /// Annualized volatility
    #[arg(long, default_value_t = 0.6)]
    volatility: f64,

    /// Random seed for reproducible paths
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, default_value_t = 1_000_000_000)]
    amount0: u128,

    #[arg(long, default_value_t = 1_000_000_000)]
    amount1: u128,

    /// Venue fee tier in hundredths of a bip
    #[arg(long, default_value_t = 3000)]
    fee_tier: u32,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Grid { tick, grid } => print_grid(*tick, grid)?,
        Commands::Simulate {
            grid,
            market,
            steps,
            step_secs,
            volume,
            json,
        } => simulate(grid, market, *steps, *step_secs, *volume, *json)?,
        Commands::Keeper {
            grid,
            market,
            rounds,
            interval_ms,
            max_move,
            fees,
        } => run_keeper(grid, market, *rounds, *interval_ms, *max_move, *fees).await?,
    }

    Ok(())
}

fn print_grid(tick: i32, args: &GridArgs) -> Result<()> {
    let config = args.load_config()?;
    let params = args.params();
    let grid = calculate_grid_ticks(
        tick,
        params.grid_type,
        config.grid_quantity,
        config.grid_step,
        args.spacing,
    )?;
    let cells = grid.cells(tick, config.straddle_policy);
    let weights = distribution_weights(cells.len(), params.distribution)?;

    println!("Grid {} around tick {}", config.describe(params.grid_type), tick);
    println!(
        "Boundaries: {} ({} .. {}, spacing {})",
        grid.boundaries().len(),
        grid.lower(),
        grid.upper(),
        grid.effective_spacing()
    );
    println!(
        "{:<10} | {:<10} | {:<12} | {:<12} | {:<10} | {:<8}",
        "Lower", "Upper", "Price lo", "Price hi", "Side", "Weight"
    );
    println!("{}", "-".repeat(76));
    for ((lower, upper), weight) in cells.iter().zip(weights) {
        let side = CellSide::classify(*lower, *upper, tick);
        println!(
            "{:<10} | {:<10} | {:<12.6} | {:<12.6} | {:<10} | {:<8}",
            lower,
            upper,
            tick_to_price(*lower).unwrap_or_default(),
            tick_to_price(*upper).unwrap_or_default(),
            format!("{side:?}"),
            weight
        );
    }
    Ok(())
}

fn price_path(market: &MarketArgs, steps: usize, step_secs: u64) -> Vec<Decimal> {
    let dt = step_secs as f64 / (365.0 * 24.0 * 3600.0);
    let mut gbm = GeometricBrownianMotion::new(market.price, market.drift, market.volatility, dt);
    if let Some(seed) = market.seed {
        gbm = gbm.with_seed(seed);
    }
    gbm.generate(steps)
}

fn simulate(
    args: &GridArgs,
    market: &MarketArgs,
    steps: usize,
    step_secs: u64,
    volume: Decimal,
    json: bool,
) -> Result<()> {
    let mut config = BacktestConfig::new(
        args.load_config()?,
        args.params(),
        market.amount0,
        market.amount1,
    );
    config.tick_spacing = args.spacing;
    config.fee_tier = market.fee_tier;
    config.step_secs = step_secs;

    let prices = price_path(market, steps, step_secs);
    let backtest = GridBacktest::new(config)?;
    let mut volume = ConstantVolume::new(volume);

    println!("Running grid backtest over {} steps...", prices.len());
    let result = backtest.run_prices(&prices, &mut volume)?;
    let summary = &result.summary;

    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    println!("\nBacktest Results");
    println!("════════════════════════════════════");
    println!("Steps:            {}", summary.steps);
    println!("Final tick:       {}", summary.final_tick);
    println!("Compounds:        {}", summary.compounds);
    println!("Sweeps:           {}", summary.sweeps);
    println!("Skipped rounds:   {}", summary.skipped_rounds);
    println!("Failures:         {}", summary.failures);
    println!(
        "Fees earned:      {} token0 / {} token1",
        summary.total_fees0, summary.total_fees1
    );
    println!(
        "Time in range:    {:.1}%",
        summary.time_in_range * Decimal::from(100)
    );
    println!("Positions minted: {}", summary.final_position_count);
    println!(
        "Withdrawn:        {} token0 / {} token1",
        summary.payout.token0, summary.payout.token1
    );
    println!("════════════════════════════════════");
    Ok(())
}

async fn run_keeper(
    args: &GridArgs,
    market: &MarketArgs,
    rounds: u64,
    interval_ms: u64,
    max_move: i32,
    fees: u128,
) -> Result<()> {
    let config = args.load_config()?;
    let params = args.params();
    let owner = Principal::new("cli-owner");
    let keeper_id = Principal::new("cli-keeper");

    let start_tick = price_to_tick(market.price)
        .map_err(anyhow::Error::msg)?;
    let twap_window = u64::from(config.twap_window_secs);
    let venue = MemoryVenue::new(start_tick, args.spacing, market.fee_tier, 1_700_000_000);
    let mut manager = GridPositionManager::new(owner.clone(), venue);
    manager.initialize(&owner, config)?;
    manager.deposit(&owner, market.amount0, market.amount1, params)?;
    manager.set_keeper(&owner, Some(keeper_id.clone()))?;
    // Let the oracle cover a full window before the first sweep.
    manager.venue_mut().advance_time(twap_window);

    let manager = Arc::new(Mutex::new(manager));
    let market_running = Arc::new(AtomicBool::new(true));
    let market_task = {
        let manager = Arc::clone(&manager);
        let running = Arc::clone(&market_running);
        let mut rng = match market.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        let max_move = max_move.max(1);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms.max(1) / 2 + 1));
            while running.load(Ordering::SeqCst) {
                ticker.tick().await;
                let mut manager = manager.lock().await;
                let venue = manager.venue_mut();
                let tick = venue.tick() + rng.random_range(-max_move..=max_move);
                venue.set_tick(tick);
                venue.advance_time(twap_window);
                venue.accrue_fees(fees / 2, fees - fees / 2);
            }
        })
    };

    let keeper = Keeper::new(
        Arc::clone(&manager),
        keeper_id,
        KeeperConfig {
            interval: Duration::from_millis(interval_ms.max(1)),
            max_rounds: Some(rounds),
            params,
        },
    );
    let stats = keeper.run().await;
    market_running.store(false, Ordering::SeqCst);
    market_task.await?;

    let manager = manager.lock().await;
    let (deployed0, deployed1) = manager.total_liquidity_in_token_units()?;
    let balances = manager.balances();
    info!(
        tick = manager.venue().tick(),
        active = manager.active_position_ids().len(),
        "Keeper session finished"
    );

    println!("\nKeeper Results");
    println!("════════════════════════════════════");
    println!("Rounds:           {}", stats.rounds);
    println!("Compounds:        {}", stats.compounds);
    println!("Sweeps:           {}", stats.sweeps);
    println!("Idle rounds:      {}", stats.idle_rounds);
    println!("Failures:         {}", stats.failures);
    println!("Active positions: {}", manager.active_position_ids().len());
    println!("Deployed:         {deployed0} token0 / {deployed1} token1");
    println!(
        "Idle:             {} token0 / {} token1",
        balances.token0, balances.token1
    );
    println!("════════════════════════════════════");
    Ok(())
}
