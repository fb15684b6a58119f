use clap::Parser;
use client::network::Client;
use log::info;
use shared::DEFAULT_PORT;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1")]
    server: String,

    /// Server port
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Nickname to register with; prompted for when omitted
    #[arg(short, long)]
    nick: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();
    let address = format!("{}:{}", args.server, args.port);

    info!("Starting client...");
    info!("Connecting to: {}", address);

    let mut client = Client::new(&address, args.nick).await?;
    client.run().await?;

    Ok(())
}
