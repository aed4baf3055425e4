use std::path::PathBuf;

use clap::Args;

use super::load_config;

#[derive(Args)]
pub struct ConfigArgs {
    /// Writer config file (default: ckw.toml if present)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

pub fn cmd_config(args: ConfigArgs) {
    let config = load_config(args.config.as_deref());
    print!("{}", config.to_toml());
}
