//! Pairwise group classification runner.
//!
//! Fits and scores the mood-signature classifier for every pair of clinical
//! groups, prints the accuracy and AUC tables, saves JSON results and
//! per-pair weights, and exits with code 1 if any pair failed.
//!
//! Usage:
//!   cargo run --bin pairwise-eval
//!   cargo run --bin pairwise-eval -- --data-dir data --output-dir results
//!   cargo run --bin pairwise-eval -- --window 20 --order 2 --seed 83042

use clap::Parser;
use moodsig_evaluation::runner::{run_pairwise, EvalConfig};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pairwise-eval", about = "Mood-signature pairwise group classification")]
struct Cli {
    /// Directory containing cohort.json.
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Directory to write JSON results and trained weights.
    #[arg(long, default_value = "results")]
    output_dir: PathBuf,

    /// Observations per window.
    #[arg(long, default_value_t = 20)]
    window: usize,

    /// Truncation order of the signature transform.
    #[arg(long, default_value_t = 2)]
    order: usize,

    /// Fraction of windows used for training.
    #[arg(long, default_value_t = 0.7)]
    training_fraction: f64,

    /// Seed for shuffled splits and mini-batch order.
    #[arg(long, default_value_t = 83042)]
    seed: u64,

    /// Upper bound on training epochs.
    #[arg(long, default_value_t = 200)]
    max_epochs: usize,

    /// Drop the normalised time coordinate from each observation.
    #[arg(long)]
    no_time_channel: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = EvalConfig {
        data_dir: cli.data_dir,
        output_dir: cli.output_dir,
        window_len: cli.window,
        order: cli.order,
        training_fraction: cli.training_fraction,
        seed: cli.seed,
        max_epochs: cli.max_epochs,
        with_time_channel: !cli.no_time_channel,
    };

    let report = match run_pairwise(&config) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Evaluation failed: {e}");
            std::process::exit(1);
        }
    };

    println!("###########");
    println!("  Results  ");
    println!("###########");
    println!("Accuracy:");
    println!("{}", report.accuracy_table.render());
    println!("AUC:");
    println!("{}", report.auc_table.render());

    let json_path = config.output_dir.join("pairwise_results.json");
    match report.save_json(&json_path) {
        Ok(()) => println!("\nResults saved to {}", json_path.display()),
        Err(e) => {
            eprintln!("Failed to save results: {e}");
            std::process::exit(1);
        }
    }

    if !report.failures.is_empty() {
        eprintln!("\n{} pair(s) failed:", report.failures.len());
        for failure in &report.failures {
            eprintln!("  {}/{}: {}", failure.group_a, failure.group_b, failure.error);
        }
        std::process::exit(1);
    }
}
