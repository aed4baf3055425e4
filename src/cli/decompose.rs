use std::process;

use clap::Args;

use ckw::cl::helpers::decompose_vector_width;

#[derive(Args)]
pub struct DecomposeArgs {
    /// Width to split
    pub n: i32,
}

pub fn cmd_decompose(args: DecomposeArgs) {
    if args.n < 0 {
        eprintln!("error: width must not be negative, got {}", args.n);
        process::exit(1);
    }
    let parts = decompose_vector_width(args.n);
    println!("{:?}", parts);
}
