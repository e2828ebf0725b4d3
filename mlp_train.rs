// Feed-forward network trainer over CSV sample files.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use mlp_trainer::architecture::{load_architecture, parse_layer_sizes, ArchitectureConfig};
use mlp_trainer::config::{load_config, TrainParameters};
use mlp_trainer::io::{read_checkpoint, write_checkpoint, CsvReader, SampleSource};
use mlp_trainer::trainer::Trainer;
use mlp_trainer::utils::{Activation, SimpleRng};
use mlp_trainer::NeuralNetwork;

const DEFAULT_LOG_DIRECTIVE: &str = "mlp_trainer=info";

#[derive(Debug, Parser)]
#[command(name = "mlp_train", version, about = "Train and evaluate a feed-forward neural network")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Train a new or existing network, writing a checkpoint after every epoch
    Train(TrainArgs),
    /// Measure accuracy and cost of a saved network
    Evaluate(EvaluateArgs),
}

#[derive(Debug, Args)]
struct TrainArgs {
    /// CSV file with a header row and `label,x1,...,xn` records
    #[arg(long)]
    train_data: PathBuf,

    /// CSV file evaluated after every epoch
    #[arg(long)]
    test_data: Option<PathBuf>,

    /// Resume from this checkpoint instead of a random network
    #[arg(long)]
    in_checkpoint: Option<PathBuf>,

    #[arg(long)]
    out_checkpoint: PathBuf,

    /// JSON training parameters
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON network shape
    #[arg(long)]
    architecture: Option<PathBuf>,

    #[arg(long)]
    learn_rate: Option<f64>,

    #[arg(long)]
    momentum: Option<f64>,

    #[arg(long)]
    regularization: Option<f64>,

    #[arg(long)]
    threads: Option<usize>,

    #[arg(long)]
    epochs: Option<usize>,

    #[arg(long)]
    train_batch_size: Option<usize>,

    #[arg(long)]
    test_batch_size: Option<usize>,

    /// Comma separated widths, e.g. `784,200,10`
    #[arg(long)]
    layer_sizes: Option<String>,

    #[arg(long)]
    intermediate_activation: Option<Activation>,

    #[arg(long)]
    output_activation: Option<Activation>,

    /// Seed for weight initialization; time based when omitted
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Debug, Args)]
struct EvaluateArgs {
    #[arg(long)]
    checkpoint: PathBuf,

    #[arg(long)]
    test_data: PathBuf,

    #[arg(long)]
    threads: Option<usize>,

    #[arg(long)]
    test_batch_size: Option<usize>,
}

fn init_tracing() -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(DEFAULT_LOG_DIRECTIVE)
            .context("invalid default log directive")?,
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

/// Config file (or defaults) with command line overrides applied.
fn train_parameters(args: &TrainArgs) -> Result<TrainParameters> {
    let mut params = match &args.config {
        Some(path) => load_config(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => TrainParameters::default(),
    };
    if let Some(v) = args.learn_rate {
        params.learn_rate = v;
    }
    if let Some(v) = args.momentum {
        params.momentum = v;
    }
    if let Some(v) = args.regularization {
        params.regularization = v;
    }
    if let Some(v) = args.threads {
        params.num_threads = v;
    }
    if let Some(v) = args.epochs {
        params.num_epochs = v;
    }
    if let Some(v) = args.train_batch_size {
        params.train_batch_size = v;
    }
    if let Some(v) = args.test_batch_size {
        params.test_batch_size = v;
    }
    params.validate().context("invalid training parameters")?;
    Ok(params)
}

fn architecture(args: &TrainArgs) -> Result<ArchitectureConfig> {
    let mut arch = match &args.architecture {
        Some(path) => load_architecture(path)
            .with_context(|| format!("failed to load architecture {}", path.display()))?,
        None => ArchitectureConfig::default(),
    };
    if let Some(text) = &args.layer_sizes {
        arch.layer_sizes = parse_layer_sizes(text).context("invalid --layer-sizes")?;
    }
    if let Some(a) = args.intermediate_activation {
        arch.intermediate_activation = a;
    }
    if let Some(a) = args.output_activation {
        arch.output_activation = a;
    }
    arch.validate().context("invalid architecture")?;
    Ok(arch)
}

fn load_network(path: &Path) -> Result<NeuralNetwork> {
    let checkpoint = read_checkpoint(path)
        .with_context(|| format!("failed to read checkpoint {}", path.display()))?;
    NeuralNetwork::from_checkpoint(&checkpoint)
        .with_context(|| format!("checkpoint {} does not describe a network", path.display()))
}

fn initial_network(args: &TrainArgs) -> Result<NeuralNetwork> {
    if let Some(path) = &args.in_checkpoint {
        let network = load_network(path)?;
        if args.architecture.is_some()
            || args.layer_sizes.is_some()
            || args.intermediate_activation.is_some()
            || args.output_activation.is_some()
        {
            let arch = architecture(args)?;
            if !arch.matches(&network) {
                bail!(
                    "checkpoint {} does not match the requested architecture",
                    path.display()
                );
            }
        }
        tracing::info!(path = %path.display(), layers = network.layer_count(), "resuming from checkpoint");
        return Ok(network);
    }

    let arch = architecture(args)?;
    let mut rng = match args.seed {
        Some(seed) => SimpleRng::new(seed),
        None => SimpleRng::from_time(),
    };
    let network = arch.build_network(&mut rng)?;
    tracing::info!(layer_sizes = ?arch.layer_sizes, "initialized random network");
    Ok(network)
}

fn open_data(path: &Path) -> Result<CsvReader> {
    CsvReader::open(path).with_context(|| format!("failed to open data file {}", path.display()))
}

fn run_train(args: TrainArgs) -> Result<()> {
    let params = train_parameters(&args)?;
    let network = initial_network(&args)?;

    let mut train_source = open_data(&args.train_data)?;
    let mut test_source = match &args.test_data {
        Some(path) => Some(open_data(path)?),
        None => None,
    };

    let trainer = Trainer::new(params).context("failed to start trainer")?;
    let out_path = args.out_checkpoint.clone();
    let start = Instant::now();

    trainer.train(
        network,
        &mut train_source,
        test_source.as_mut().map(|s| s as &mut dyn SampleSource),
        |report, network| {
            println!(
                "Epoch {} train {} ({:.2}s)",
                report.epoch,
                report.train,
                start.elapsed().as_secs_f64()
            );
            if let Some(test) = &report.test {
                println!("Epoch {} test  {}", report.epoch, test);
            }
            write_checkpoint(&out_path, &network.to_checkpoint())?;
            tracing::info!(path = %out_path.display(), epoch = report.epoch, "checkpoint written");
            Ok(())
        },
    )?;

    println!("Total training time: {:.2} seconds", start.elapsed().as_secs_f64());
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    let mut params = TrainParameters::default();
    if let Some(v) = args.threads {
        params.num_threads = v;
    }
    if let Some(v) = args.test_batch_size {
        params.test_batch_size = v;
    }

    let network = Arc::new(load_network(&args.checkpoint)?);
    let mut source = open_data(&args.test_data)?;
    let trainer = Trainer::new(params).context("failed to start trainer")?;

    let start = Instant::now();
    let stats = trainer.test(&network, &mut source)?;
    println!("Test {}", stats);
    println!("Testing time: {:.2} seconds", start.elapsed().as_secs_f64());
    Ok(())
}

fn main() -> Result<()> {
    init_tracing()?;
    match Cli::parse().command {
        Command::Train(args) => run_train(args),
        Command::Evaluate(args) => run_evaluate(args),
    }
}
