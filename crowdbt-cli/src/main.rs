mod config;
mod corpus;
mod output;
mod simulate;

use clap::Parser;
use crowdbt_core::constants::DEFAULT_FINITE_DIFFERENCE_STEP;
use crowdbt_core::{
    AnnotatorAccuracy, AnnotatorGraph, EstimateOptions, GradientMode, run_estimation,
};
use rand::Rng;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use crate::config::CrowdbtConfig;
use crate::simulate::SimulationConfig;

pub fn bail(msg: impl std::fmt::Display) -> ! {
    eprintln!("Error: {msg}");
    std::process::exit(1);
}

#[derive(Parser)]
#[command(name = "crowdbt", version, about = "Rank objects from crowdsourced pairwise preferences")]
struct Cli {
    /// Log solver progress to stderr (CROWDBT_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Estimate scores and ranks from a comparison corpus
    Rank(RankArgs),
    /// Simulate a noisy crowd and measure how well the ranking is recovered
    Simulate(SimulateArgs),
    /// Create a default config file at ~/.config/crowdbt/config.toml
    Init,
}

/// Estimation knobs shared by `rank` and `simulate`.
#[derive(clap::Args)]
struct EstimateArgs {
    /// Probability an annotator's stated preference is correct
    #[arg(long)]
    accuracy: Option<f64>,

    /// Per-annotator accuracy, in annotator order (repeatable).
    /// Overrides --accuracy when given.
    #[arg(long = "annotator-accuracy")]
    annotator_accuracy: Vec<f64>,

    /// Regularization strength toward the virtual anchor object
    #[arg(long)]
    regularization: Option<f64>,

    /// BFGS iteration cap
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Z-score the output scores
    #[arg(long, overrides_with = "no_standardize")]
    standardize: bool,

    /// Print raw scores even when the config file enables standardizing
    #[arg(long, overrides_with = "standardize")]
    no_standardize: bool,

    /// Use finite-difference gradients instead of the closed form
    #[arg(long)]
    finite_difference: bool,

    /// Path to config file (default: ~/.config/crowdbt/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Parser)]
struct RankArgs {
    /// Corpus file: JSON `[[[loser, winner], ...], ...]` or lines of
    /// `annotator loser winner`. Reads stdin when omitted.
    #[arg(long)]
    corpus: Option<PathBuf>,

    /// Labels for the objects, one per line or a JSON array
    #[arg(long)]
    labels: Option<PathBuf>,

    /// Output JSON instead of table
    #[arg(long)]
    json: bool,

    /// Include solver diagnostics in the output
    #[arg(long)]
    diagnostics: bool,

    #[command(flatten)]
    estimate: EstimateArgs,
}

#[derive(Parser)]
struct SimulateArgs {
    /// Number of objects with hidden true scores
    #[arg(long, default_value_t = 20)]
    objects: usize,

    /// Number of annotators
    #[arg(long, default_value_t = 10)]
    annotators: usize,

    /// How many of the annotators answer at random
    #[arg(long, default_value_t = 0)]
    spammers: usize,

    /// Comparisons drawn per annotator
    #[arg(long, default_value_t = 50)]
    comparisons: usize,

    /// True accuracy of the honest annotators
    #[arg(long, default_value_t = 0.9)]
    true_accuracy: f64,

    /// Estimate with each annotator's true accuracy
    #[arg(long)]
    oracle: bool,

    /// RNG seed. A random seed is drawn and reported when omitted.
    #[arg(long)]
    seed: Option<u64>,

    /// Output JSON instead of a summary
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    estimate: EstimateArgs,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("CROWDBT_LOG").unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Rank(args) => run_rank(args),
        Commands::Simulate(args) => run_simulate(args),
        Commands::Init => {
            let path = config::config_path();
            config::create_default_config(&path);
            println!("Created config at {}", path.display());
            println!("Edit it to set your default accuracy, regularization, etc.");
        }
    }
}

/// Merge CLI flags, config file and library defaults (in that order).
fn resolve_options(args: &EstimateArgs, cfg: &CrowdbtConfig) -> EstimateOptions {
    let defaults = EstimateOptions::default();

    let preference_accuracy = if !args.annotator_accuracy.is_empty() {
        if args.accuracy.is_some() {
            warn!("--accuracy is ignored when --annotator-accuracy is given");
        }
        AnnotatorAccuracy::PerAnnotator(args.annotator_accuracy.clone())
    } else {
        args.accuracy
            .or(cfg.accuracy)
            .map(AnnotatorAccuracy::Uniform)
            .unwrap_or(defaults.preference_accuracy)
    };

    let standardize = match (args.standardize, args.no_standardize) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    };

    let gradient = if args.finite_difference {
        GradientMode::FiniteDifference { step: DEFAULT_FINITE_DIFFERENCE_STEP }
    } else {
        GradientMode::Analytic
    };

    EstimateOptions {
        preference_accuracy,
        regularization_strength: args
            .regularization
            .or(cfg.regularization)
            .unwrap_or(defaults.regularization_strength),
        standardize: standardize.or(cfg.standardize).unwrap_or(defaults.standardize),
        max_iterations: args.max_iterations.or(cfg.max_iterations).unwrap_or(defaults.max_iterations),
        gradient,
        gradient_tolerance: defaults.gradient_tolerance,
    }
}

fn load_options(args: &EstimateArgs) -> EstimateOptions {
    let config_path = args.config.clone().unwrap_or_else(config::config_path);
    let cfg = config::load_config(&config_path);
    let options = resolve_options(args, &cfg);
    debug!(?options, config = %config_path.display(), "resolved estimate options");
    options
}

/// Read the corpus from --corpus or stdin.
fn load_corpus(args: &RankArgs) -> Vec<AnnotatorGraph> {
    let content = match args.corpus {
        Some(ref path) => std::fs::read_to_string(path)
            .unwrap_or_else(|e| bail(format!("Failed to read corpus file {}: {e}", path.display()))),
        None => {
            let mut stdin = io::stdin();
            if stdin.is_terminal() {
                bail("No corpus provided. Use --corpus <file> or pipe a corpus via stdin.");
            }
            let mut content = String::new();
            stdin
                .read_to_string(&mut content)
                .unwrap_or_else(|e| bail(format!("Failed to read from stdin: {e}")));
            content
        }
    };

    corpus::parse_corpus(&content).unwrap_or_else(|e| bail(e))
}

fn load_labels(args: &RankArgs) -> Vec<String> {
    let Some(ref path) = args.labels else {
        return Vec::new();
    };
    let content = std::fs::read_to_string(path)
        .unwrap_or_else(|e| bail(format!("Failed to read labels file {}: {e}", path.display())));
    corpus::parse_labels(&content).unwrap_or_else(|e| bail(e))
}

fn run_rank(args: RankArgs) {
    let options = load_options(&args.estimate);
    let corpus = load_corpus(&args);
    let labels = load_labels(&args);

    let estimate = run_estimation(&corpus, &options).unwrap_or_else(|e| bail(e));

    if !labels.is_empty() && labels.len() != estimate.scores.len() {
        warn!(
            labels = labels.len(),
            objects = estimate.scores.len(),
            "label count does not match object count"
        );
    }
    if !estimate.diagnostics.converged {
        warn!(
            iterations = estimate.diagnostics.iterations,
            "solver stopped before converging, using best iterate"
        );
    }

    if args.json {
        output::print_json(&estimate, &labels, args.diagnostics);
    } else {
        output::print_table(&estimate, &labels, args.diagnostics);
    }
}

fn run_simulate(args: SimulateArgs) {
    if args.objects < 2 {
        bail(format!("Need at least 2 objects to simulate, got {}", args.objects));
    }
    if args.annotators == 0 {
        bail("Need at least 1 annotator");
    }
    if args.spammers > args.annotators {
        bail(format!(
            "--spammers ({}) cannot exceed --annotators ({})",
            args.spammers, args.annotators
        ));
    }
    if !(0.0..=1.0).contains(&args.true_accuracy) {
        bail(format!("--true-accuracy must be between 0.0 and 1.0, got {}", args.true_accuracy));
    }

    let options = load_options(&args.estimate);
    let seed = args.seed.unwrap_or_else(|| rand::rng().random());

    let config = SimulationConfig {
        objects: args.objects,
        annotators: args.annotators,
        spammers: args.spammers,
        comparisons_per_annotator: args.comparisons,
        annotator_accuracy: args.true_accuracy,
        seed,
        oracle_accuracies: args.oracle,
    };

    let report = simulate::run_simulation(&config, &options).unwrap_or_else(|e| bail(e));
    output::print_simulation(&report, args.json);
}
