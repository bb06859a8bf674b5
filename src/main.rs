use clap::Parser;
use taskdeck::cli::commands::Cli;
use taskdeck::cli::{handlers, logging};

fn main() {
    let cli = Cli::parse();

    let config = match handlers::load_settings(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    };
    logging::init(&config.log);

    if let Err(e) = handlers::dispatch(cli, config) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
