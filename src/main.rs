use clap::Parser;

use pardo::cli::{Cli, output};

fn main() {
    let cli = Cli::parse();
    if let Err(error) = cli.run() {
        output::fatal(&error);
        std::process::exit(1);
    }
}
