use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod core;
mod narrative;
mod parsing;
mod profiling;
mod screening;
mod utils;
mod vocabulary;
mod web;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    // Initialize logging based on verbosity flag
    let filter = if cli.verbose {
        EnvFilter::new("sc_screen=debug,info")
    } else {
        EnvFilter::new("sc_screen=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    match cli.command {
        cli::Commands::Screen(args) => {
            cli::screen::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Profile(args) => {
            cli::profile::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Vocab(args) => {
            cli::vocab::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Serve(args) => {
            web::server::run(args)?;
        }
    }

    Ok(())
}
