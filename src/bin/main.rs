//! gksvm command line interface
//!
//! Trains a gapped k-mer SVM on labelled sequence corpora and predicts the
//! held-out test block, with optional session persistence between the two
//! steps.

use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use log::{error, info};
use gksvm::api::Gksvm;
use gksvm::core::Result;
use gksvm::persistence::SerializableSession;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "gksvm")]
#[command(about = "Gapped k-mer string-kernel SVM for sequence classification")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the kernel matrix and train a model
    Fit(FitArgs),
    /// Predict the test block of a saved session
    Predict(PredictArgs),
}

#[derive(Args)]
struct FitArgs {
    /// Training corpus (FASTA-like, '>label' headers)
    #[arg(long)]
    train: PathBuf,

    /// Test corpus; required for the linear and rbf kernel types
    #[arg(long)]
    test: Option<PathBuf>,

    /// Dictionary file; defaults to the training corpus alphabet
    #[arg(long)]
    dict: Option<PathBuf>,

    /// Window length of each g-mer
    #[arg(short)]
    g: usize,

    /// Number of don't-care positions per window
    #[arg(short)]
    m: usize,

    /// Regularization parameter C
    #[arg(short = 'C', long, default_value = "1.0")]
    c: f64,

    /// nu parameter
    #[arg(long, default_value = "0.5")]
    nu: f64,

    /// Solver tolerance
    #[arg(long, default_value = "0.001")]
    eps: f64,

    /// Kernel type: linear, gakco, or rbf
    #[arg(short, long, default_value = "linear")]
    kernel: String,

    /// Worker threads for kernel accumulation (0 = all cores)
    #[arg(long, default_value = "0")]
    threads: usize,

    /// Lock shards over the triangular index space
    #[arg(long, default_value = "128")]
    shards: usize,

    /// Disable the solver's shrinking heuristic
    #[arg(long)]
    no_shrinking: bool,

    /// Skip sigmoid probability calibration
    #[arg(long)]
    no_probability: bool,

    /// Suppress diagnostic output
    #[arg(short, long)]
    quiet: bool,

    /// Write the kernel matrix in sparse-row notation
    #[arg(long)]
    kernel_dump: Option<PathBuf>,

    /// Save the fitted session for a later predict invocation
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Predict immediately, writing one label per line here
    #[arg(short, long)]
    predictions: Option<PathBuf>,
}

#[derive(Args)]
struct PredictArgs {
    /// Saved session file
    #[arg(short, long)]
    model: PathBuf,

    /// Predictions output file, one integer label per line
    #[arg(short, long)]
    output: PathBuf,

    /// Suppress diagnostic output
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    let result = match cli.command {
        Commands::Fit(args) => fit_command(args),
        Commands::Predict(args) => predict_command(args),
    };

    if let Err(e) = result {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn fit_command(args: FitArgs) -> Result<()> {
    info!(
        "fitting g = {}, m = {}, kernel = {} on {:?}",
        args.g, args.m, args.kernel, args.train
    );

    let mut svm = Gksvm::new(args.g, args.m)?
        .with_kernel_name(&args.kernel)?
        .with_c(args.c)
        .with_nu(args.nu)
        .with_eps(args.eps)
        .with_threads(args.threads)
        .with_shards(args.shards)
        .with_shrinking(!args.no_shrinking)
        .with_probability(!args.no_probability)
        .with_quiet(args.quiet);

    svm.fit(
        &args.train,
        args.test.as_ref(),
        args.dict.as_ref(),
        args.kernel_dump.as_ref(),
    )?;

    if let Some(model) = svm.model() {
        info!(
            "model trained: {} support vectors",
            model.n_support_vectors()
        );
    }

    if let Some(output) = &args.output {
        SerializableSession::from_session(&svm)?.save_to_file(output)?;
        info!("session saved to {output:?}");
    }

    if let Some(predictions) = &args.predictions {
        let report = svm.predict(predictions)?;
        if !args.quiet {
            println!("accuracy: {:.6}", report.accuracy);
            println!("auc: {:.6}", report.auc);
        }
    }

    Ok(())
}

fn predict_command(args: PredictArgs) -> Result<()> {
    info!("loading session from {:?}", args.model);
    let session = SerializableSession::load_from_file(&args.model)?
        .into_session()?
        .with_quiet(args.quiet);

    let report = session.predict(&args.output)?;
    if !args.quiet {
        println!("accuracy: {:.6}", report.accuracy);
        println!("auc: {:.6}", report.auc);
        println!(
            "false positives: {}  false negatives: {}",
            report.false_positives, report.false_negatives
        );
    }
    info!("predictions written to {:?}", args.output);

    Ok(())
}
