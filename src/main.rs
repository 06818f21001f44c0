//! RAX file manager - Entry Point

use clap::Parser;
use log::{error, info};

use rax_file_manager::Server;
use rax_file_manager::auth::hash_password;
use rax_file_manager::cli::{Cli, Command};
use rax_file_manager::config::ServerConfig;
use rax_file_manager::error::StartupError;
use rax_file_manager::utils::logging::setup_logging;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Some(Command::HashPassword { password }) = cli.command {
        match hash_password(&password) {
            Ok(hash) => println!("{hash}"),
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    if let Err(e) = run(&cli).await {
        error!("Fatal: {}", e);
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: &Cli) -> Result<(), StartupError> {
    let config = ServerConfig::load(&cli.config)?;
    setup_logging(&config.logging)?;

    info!("Launching file manager with {}", cli.config.display());

    let server = Server::new(config)?;
    server.start().await
}
