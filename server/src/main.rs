use clap::Parser;
use log::{error, info};
use server::config::ServerConfig;
use server::network::{Server, ServerMessage};
use shared::DEFAULT_PORT;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Remove sessions silent for this many seconds (0 disables)
    #[arg(short, long, default_value = "0")]
    idle_timeout: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let config = ServerConfig {
        host: args.host,
        port: args.port,
        ..ServerConfig::default()
    }
    .with_idle_timeout_secs(args.idle_timeout);

    let mut server = Server::new(config).await?;
    let control = server.control();

    let server_handle = tokio::spawn(async move { server.run().await });

    tokio::select! {
        result = server_handle => {
            match result {
                Ok(Err(e)) => error!("Server stopped: {}", e),
                Err(e) => error!("Server task panicked: {}", e),
                Ok(Ok(())) => {}
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down gracefully...");
            let _ = control.send(ServerMessage::Shutdown);
        }
    }

    Ok(())
}
