use clap::Parser;
use client::input::{InputAction, InputManager};
use client::network::{Connection, Session};
use client::rendering::{HudInfo, Renderer};
use log::{error, info};
use macroquad::prelude::*;
use shared::{get_timestamp, Packet};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: String,

    /// Display name (2-12 characters)
    #[arg(short, long, default_value = "player")]
    name: String,

    /// Room code to join; empty joins the lobby
    #[arg(short, long, default_value = "")]
    room: String,

    /// Simulate network latency in milliseconds
    #[arg(short = 'l', long, default_value = "0")]
    fake_ping: u64,

    /// Server tick interval in milliseconds, used to pace interpolation
    #[arg(short, long, default_value = "50")]
    tick_ms: u64,

    /// Grid width in cells
    #[arg(long, default_value = "60")]
    grid_width: i32,

    /// Grid height in cells
    #[arg(long, default_value = "40")]
    grid_height: i32,

    /// Window width
    #[arg(short = 'w', long, default_value = "960")]
    width: i32,

    /// Window height (no short flag to avoid conflict with --help)
    #[arg(long, default_value = "730")]
    height: i32,
}

fn window_conf() -> Conf {
    let args = Args::parse();
    Conf {
        window_title: "Snake Arena".to_owned(),
        window_width: args.width,
        window_height: args.height,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    info!("Connecting to: {}", args.server);
    if args.fake_ping > 0 {
        info!("Simulating {}ms latency", args.fake_ping);
    }
    info!("Controls: arrows/WASD to steer, P to pause, Enter to start, I to toggle interpolation");

    let connection = match Connection::open(&args.server, args.fake_ping) {
        Ok(connection) => connection,
        Err(e) => {
            error!("Could not open connection: {}", e);
            return;
        }
    };
    connection.send(Packet::Join {
        name: args.name.clone(),
        room: args.room.clone(),
    });

    let mut session = Session::new(args.tick_ms);
    let mut input = InputManager::new();
    let renderer = Renderer::new(args.grid_width, args.grid_height);

    loop {
        if is_key_pressed(KeyCode::Escape) {
            break;
        }

        let now = get_time();
        for packet in connection.poll() {
            session.handle_packet(packet, now, get_timestamp());
        }

        for action in input.update(session.local_direction()) {
            match action {
                InputAction::Turn(direction) if session.in_game => connection.send(Packet::Input {
                    direction,
                    timestamp: get_timestamp(),
                }),
                InputAction::TogglePause if session.in_game => {
                    connection.send(Packet::TogglePause)
                }
                InputAction::StartGame if session.is_host && !session.in_game => {
                    connection.send(Packet::StartGame)
                }
                InputAction::ToggleInterpolation => session.toggle_interpolation(),
                _ => {}
            }
        }

        let render_state = session
            .game
            .render_state(now, session.interpolation_enabled);
        let hud = HudInfo {
            player_id: session.player_id,
            room: session.room.as_deref(),
            is_host: session.is_host,
            in_game: session.in_game,
            ping_ms: session.ping_ms,
            fake_ping_ms: args.fake_ping,
            interpolation_enabled: session.interpolation_enabled,
            results: session.results.as_deref(),
            rejection: session.rejection.as_deref(),
            last_ack: session.last_ack,
        };
        renderer.render(render_state.as_ref(), &hud);

        next_frame().await;
    }

    info!("Leaving");
    connection.close();
}
