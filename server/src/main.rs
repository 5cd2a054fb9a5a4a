use clap::Parser;
use log::info;
use server::network::Server;
use shared::config::{GameConfig, NetworkConfig};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Grid width in cells
    #[arg(long, default_value = "60")]
    grid_width: i32,

    /// Grid height in cells
    #[arg(long, default_value = "40")]
    grid_height: i32,

    /// Simulation tick interval in milliseconds
    #[arg(short, long, default_value = "50")]
    tick_ms: u64,

    /// Snapshot broadcast interval in milliseconds
    #[arg(short, long, default_value = "50")]
    broadcast_ms: u64,

    /// Send a full snapshot every N broadcasts
    #[arg(short = 'f', long, default_value = "10")]
    full_sync_every: u32,

    /// Match length in seconds (0 = no limit)
    #[arg(short, long, default_value = "180")]
    match_secs: u64,

    /// Maximum number of connected clients
    #[arg(short = 'c', long, default_value = "64")]
    max_clients: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();

    let game_config = GameConfig {
        grid_width: args.grid_width,
        grid_height: args.grid_height,
        tick_interval_ms: args.tick_ms,
        match_duration_ms: args.match_secs * 1000,
        ..GameConfig::default()
    };
    let network_config = NetworkConfig {
        broadcast_interval_ms: args.broadcast_ms,
        full_sync_every: args.full_sync_every,
        client_timeout: Duration::from_secs(5),
        max_clients: args.max_clients,
    };

    info!(
        "Grid {}x{}, tick {}ms, broadcast {}ms, full sync every {}",
        game_config.grid_width,
        game_config.grid_height,
        game_config.tick_interval_ms,
        network_config.broadcast_interval_ms,
        network_config.full_sync_every
    );

    let address = format!("{}:{}", args.host, args.port);
    let mut server = Server::new(&address, game_config, network_config).await?;

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => info!("Received Ctrl+C, shutting down"),
    }

    Ok(())
}
