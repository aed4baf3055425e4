pub mod config;
pub mod decompose;
pub mod elementwise;

use std::path::{Path, PathBuf};
use std::process;

use ckw::WriterConfig;

/// Resolve the writer config or exit with the loader's message.
pub fn load_config(path: Option<&Path>) -> WriterConfig {
    match WriterConfig::resolve(path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    }
}

/// Write `text` to `output`, or to stdout when no path is given.
pub fn write_output(output: Option<&PathBuf>, text: &str) {
    match output {
        Some(path) => {
            if let Err(e) = std::fs::write(path, text) {
                eprintln!("error: cannot write '{}': {}", path.display(), e);
                process::exit(1);
            }
            eprintln!("Wrote {}", path.display());
        }
        None => print!("{}", text),
    }
}
