use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::filter::LevelFilter;

mod commands;

#[derive(Parser)]
#[command(name = "curvelet-cmd")]
#[command(about = "Command-line utility for curvelet transforms")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the band shapes and sampling coordinates of a transform as JSON
    Params(commands::TransformArgs),

    /// Transform random data forward and back and report the reconstruction error
    Roundtrip(commands::roundtrip::RoundtripArgs),

    /// Print the energy of every wedge of the transform of random data
    Energy(commands::energy::EnergyArgs),
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Params(args) => commands::params::run(args),
        Commands::Roundtrip(args) => commands::roundtrip::run(args),
        Commands::Energy(args) => commands::energy::run(args),
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_roundtrip() {
        let cli = Cli::try_parse_from([
            "curvelet-cmd",
            "-vv",
            "roundtrip",
            "--dims",
            "4,64,48",
            "--dirs",
            "-2,-1",
            "--nbscales",
            "3",
            "--boundary",
            "wavelets",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Commands::Roundtrip(args) = cli.command else {
            panic!("expected roundtrip");
        };
        assert_eq!(args.transform.dims, vec![4, 64, 48]);
        assert_eq!(args.dirs, vec![-2, -1]);
        assert_eq!(args.transform.nbscales, Some(3));
    }
}
