//! Dynamic vtree minimization.
//!
//! Builds a function that is large under a right-linear vtree and minimizes
//! it with a chosen strategy.
//!
//! Run with:
//! ```bash
//! cargo run --example minimize -- --pairs 6 --strategy window
//! ```

use std::time::Duration;

use clap::{Parser, ValueEnum};
use log::info;
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

use sdd_rs::handler::{ComputationHandler, EventLimitHandler, NopHandler, TimeoutHandler, UnboundedSearch};
use sdd_rs::minimize::MinimizationConfig;
use sdd_rs::sdd::Sdd;
use sdd_rs::strategy::{BottomUpStrategy, DecreasingThresholdStrategy, SddMinimizationStrategy, WindowStrategy};
use sdd_rs::types::Var;
use sdd_rs::vtree::VtreeStore;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Strategy {
    BottomUp,
    Threshold,
    Window,
}

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Number of variable pairs `x{i} ↔ x{i+n}`.
    #[clap(long, value_name = "INT", default_value = "5")]
    pairs: u32,

    #[clap(long, value_enum, default_value = "bottom-up")]
    strategy: Strategy,

    /// Upper bound on the number of passes.
    #[clap(long, value_name = "INT", default_value = "64")]
    passes: usize,

    /// Overall time limit, in seconds.
    #[clap(long, value_name = "SECONDS")]
    timeout: Option<u64>,

    /// Number of fragment states every local search may measure.
    #[clap(long, value_name = "INT")]
    search_steps: Option<usize>,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    TermLogger::init(LevelFilter::Info, Config::default(), TerminalMode::Mixed, ColorChoice::Auto)?;

    let time_total = std::time::Instant::now();

    let args = Cli::parse();
    println!("args = {:?}", args);

    let n = args.pairs;
    let vars: Vec<Var> = (1..=2 * n).map(Var::new).collect();
    let mut store = VtreeStore::new();
    let root = store.right_linear(&vars);
    let sdd = Sdd::from_vtree(store, root);

    let f = sdd.and_all((1..=n).map(|i| sdd.equiv(sdd.variable(i), sdd.variable(i + n))));
    println!("vtree = {}", sdd.vtree());
    println!("size = {}, models = {}", sdd.size_of(f), sdd.model_count(f));

    let mut strategy: Box<dyn SddMinimizationStrategy> = match args.strategy {
        Strategy::BottomUp => Box::new(BottomUpStrategy),
        Strategy::Threshold => Box::new(DecreasingThresholdStrategy::default()),
        Strategy::Window => Box::new(WindowStrategy::default()),
    };
    let config = MinimizationConfig {
        max_passes: args.passes,
    };
    let mut handler: Box<dyn ComputationHandler> = match args.timeout {
        Some(seconds) => Box::new(TimeoutHandler::new(Duration::from_secs(seconds))),
        None => Box::new(NopHandler),
    };

    let time_minimize = std::time::Instant::now();
    let outcome = match args.search_steps {
        Some(steps) => {
            let search = move || Box::new(EventLimitHandler::minimization_steps(steps)) as Box<dyn ComputationHandler>;
            sdd.minimize_with(&[f], strategy.as_mut(), &config, &search, handler.as_mut())
        }
        None => sdd.minimize_with(&[f], strategy.as_mut(), &config, &UnboundedSearch, handler.as_mut()),
    };
    info!("Minimization done in {:.3} s", time_minimize.elapsed().as_secs_f64());

    if !outcome.is_done() {
        println!("minimization stopped early");
    }
    match outcome.result() {
        Some((result, stats)) => {
            let g = result.translate(f);
            println!("vtree = {}", sdd.vtree());
            println!("size = {} (was {}), models = {}", sdd.size_of(g), stats.initial_size, sdd.model_count(g));
            println!(
                "passes = {}, fragments = {}, states = {}",
                stats.passes, stats.fragments_searched, stats.states_measured
            );
        }
        None => println!("no result"),
    }

    println!("\nAll done in {:.3} s", time_total.elapsed().as_secs_f64());
    Ok(())
}
