use clap::{Parser, Subcommand};

mod cli;

use cli::config::{cmd_config, ConfigArgs};
use cli::decompose::{cmd_decompose, DecomposeArgs};
use cli::elementwise::{cmd_elementwise, ElementwiseArgs};

#[derive(Parser)]
#[command(
    name = "ckw",
    version,
    about = "Compute kernel writer: tile and tensor operations to OpenCL C"
)]
struct Cli {
    /// Log writer activity at debug level
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Emit a fused elementwise kernel: binary op, activation, store
    Elementwise(ElementwiseArgs),
    /// Split a width into supported vector widths
    Decompose(DecomposeArgs),
    /// Print the resolved writer config as TOML
    Config(ConfigArgs),
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Elementwise(args) => cmd_elementwise(args),
        Command::Decompose(args) => cmd_decompose(args),
        Command::Config(args) => cmd_config(args),
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::EnvFilter;

    // -v wins over RUST_LOG.
    let filter = if verbose {
        EnvFilter::new("ckw=debug,warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
