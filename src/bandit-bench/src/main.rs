//! Bandit Bench: runs every strategy on the same synthetic problem and
//! prints a regret comparison.

use bandit_core::config::{BanditConfig, StateBackend};
use bandit_core::{ExperimentConfig, ParamBag};
use bandit_engine::{BanditStrategy, ExperimentRegistry, StrategyFactory, StrategyKind};
use bandit_sim::{convergence_round, run_simulation, BernoulliEnvironment};
use bandit_state::open_store;
use clap::{Parser, ValueEnum};
use std::sync::Arc;
use tracing::{info, warn};

const DEFAULT_ARM_RATES: [(&str, f64); 4] = [("A", 0.10), ("B", 0.13), ("C", 0.18), ("D", 0.05)];
const TAIL_WINDOW: usize = 200;
const CONVERGENCE_WINDOW: usize = 100;
const CONVERGENCE_THRESHOLD: f64 = 0.80;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Backend {
    Memory,
    Redis,
}

#[derive(Parser, Debug)]
#[command(name = "bandit-bench")]
#[command(about = "Compare bandit strategies on a synthetic Bernoulli problem")]
#[command(version)]
struct Cli {
    /// Number of rounds per strategy
    #[arg(short = 'n', long, default_value_t = 5_000)]
    rounds: usize,

    /// Seed shared by the environment and every strategy
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Exploration rate for epsilon-greedy
    #[arg(long, default_value_t = 0.1)]
    epsilon: f64,

    /// Exploration weight for UCB1
    #[arg(long, default_value_t = 1.0)]
    exploration_weight: f64,

    /// State backend (overrides config)
    #[arg(long, value_enum, env = "BANDIT__STATE__BACKEND")]
    backend: Option<Backend>,
}

struct Row {
    strategy: StrategyKind,
    is_default: bool,
    final_regret: f64,
    final_reward: f64,
    tail_share: f64,
    convergence: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bandit=info".into()),
        )
        .json()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = BanditConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        BanditConfig::default()
    });
    if let Some(backend) = cli.backend {
        config.state.backend = match backend {
            Backend::Memory => StateBackend::Memory,
            Backend::Redis => StateBackend::Redis,
        };
    }

    info!(
        rounds = cli.rounds,
        seed = cli.seed,
        backend = ?config.state.backend,
        "Bandit bench starting"
    );

    let mut params = ParamBag::new();
    params.insert("seed".to_string(), cli.seed.into());
    params.insert("epsilon".to_string(), cli.epsilon.into());
    params.insert("exploration_weight".to_string(), cli.exploration_weight.into());

    let arm_ids: Vec<String> = DEFAULT_ARM_RATES
        .iter()
        .map(|(arm_id, _)| arm_id.to_string())
        .collect();
    let registry = Arc::new(ExperimentRegistry::new());

    let mut rows = Vec::with_capacity(StrategyKind::ALL.len());
    for kind in StrategyKind::ALL {
        let store = open_store(&config.state, &config.redis)?;
        let factory = StrategyFactory::from_config(&config, Arc::clone(&store), registry.clone())?;
        let is_default = kind == factory.default_strategy();

        let experiment_id = format!("bench_{kind}");
        registry.create_experiment(
            ExperimentConfig::new(experiment_id.clone(), arm_ids.clone())
                .with_strategy(kind.as_str(), params.clone()),
        )?;
        store.reset_experiment(&experiment_id)?;

        let strategy = factory.build_for_experiment(&experiment_id)?;
        // Same seed per strategy so each one faces an identical reward stream.
        let mut env = BernoulliEnvironment::new(DEFAULT_ARM_RATES, Some(cli.seed))?;
        let best_arm = env.best_arm().to_string();

        let outcome = run_simulation(&strategy, &mut env, &experiment_id, cli.rounds)?;
        info!(
            strategy = strategy.name(),
            regret = outcome.final_regret(),
            "Strategy finished"
        );

        rows.push(Row {
            strategy: kind,
            is_default,
            final_regret: outcome.final_regret(),
            final_reward: outcome.final_reward(),
            tail_share: outcome.tail_share(&best_arm, TAIL_WINDOW),
            convergence: convergence_round(
                &outcome.choices,
                &best_arm,
                CONVERGENCE_WINDOW,
                CONVERGENCE_THRESHOLD,
            ),
        });
    }

    print_report(&rows);
    Ok(())
}

fn print_report(rows: &[Row]) {
    println!(
        "\n{:<16} {:>14} {:>14} {:>12} {:>12}",
        "Strategy", "Final Regret", "Final Reward", "Tail Best", "Converged"
    );
    println!("{}", "-".repeat(72));
    for row in rows {
        let convergence = row
            .convergence
            .map(|round| round.to_string())
            .unwrap_or_else(|| "n/a".to_string());
        let label = if row.is_default {
            format!("{} *", row.strategy)
        } else {
            row.strategy.to_string()
        };
        println!(
            "{:<16} {:>14.2} {:>14.0} {:>11.1}% {:>12}",
            label,
            row.final_regret,
            row.final_reward,
            row.tail_share * 100.0,
            convergence
        );
    }
    println!("* configured default strategy");
}
