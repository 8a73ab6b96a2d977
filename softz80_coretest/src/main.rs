use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::Parser;
use softz80_coretest::Coretest;
use softz80_lib::Z80;

/// FUSE test-vector runner for Z80 cores.
/// This program replays each test case of a FUSE-format vector file against
/// the bundled core and prints the final register and memory state for
/// comparison against golden output.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct CommandLineArguments {
    /// Test vector file location ("-" to read from standard input)
    #[arg(short, long)]
    filepath: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let parameters = CommandLineArguments::parse();

    let input: Box<dyn BufRead> = if parameters.filepath.as_os_str() == "-" {
        Box::new(BufReader::new(io::stdin()))
    } else {
        let file = File::open(&parameters.filepath).with_context(|| {
            format!(
                "Could not open the test file {}",
                parameters.filepath.display()
            )
        })?;
        Box::new(BufReader::new(file))
    };

    let mut runner = Coretest::new(Z80::new());
    runner.run(input, io::stdout().lock())?;

    Ok(())
}
