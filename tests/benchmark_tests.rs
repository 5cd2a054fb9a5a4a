//! Performance benchmarks for critical game systems

use client::game::ClientGameState;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use server::game::{Participant, Simulation};
use shared::compression::{compress_game_state, decompress_game_state};
use shared::config::GameConfig;
use shared::{decode_packet, encode_packet, player_color, Direction, Packet};
use std::time::Instant;

fn full_room(seed: u64) -> Simulation {
    let players: Vec<Participant> = (1..=8)
        .map(|id| Participant::new(id, format!("p{}", id), player_color(id as usize)))
        .collect();
    let config = GameConfig {
        match_duration_ms: 0,
        ..GameConfig::default()
    };
    Simulation::new(config, &players, 0, StdRng::seed_from_u64(seed))
}

/// Benchmarks simulation ticks for a full room
#[test]
fn benchmark_simulation_ticks() {
    let mut sim = full_room(1);
    let mut rng = StdRng::seed_from_u64(2);

    let iterations = 10_000u64;
    let start = Instant::now();

    for step in 1..=iterations {
        let id = rng.gen_range(1..=8);
        let _ = sim.queue_input(id, Direction::ALL[rng.gen_range(0..4)]);
        sim.tick(step * 50);
    }

    let duration = start.elapsed();
    println!(
        "Simulation: {} ticks in {:?} ({:.2} μs/tick)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    // A 50ms tick budget leaves plenty of headroom
    assert!(duration.as_secs() < 10);
}

/// Compressed snapshots must be smaller than full ones once snakes have grown
#[test]
fn benchmark_snapshot_sizes() {
    let mut sim = full_room(3);
    for step in 1..=400u64 {
        sim.tick(step * 50);
    }

    let full = encode_packet(&Packet::FullState {
        state: sim.state().clone(),
        timestamp: 0,
    })
    .unwrap();
    let compressed = encode_packet(&Packet::CompressedState {
        compressed: compress_game_state(sim.state(), 0),
        timestamp: 0,
    })
    .unwrap();

    println!(
        "Snapshot sizes: full {} bytes, compressed {} bytes",
        full.len(),
        compressed.len()
    );
    assert!(compressed.len() < full.len());
}

/// Benchmarks encode, decode and reconstruction of compressed snapshots
#[test]
fn benchmark_compressed_pipeline() {
    let mut sim = full_room(4);
    let mut previous = sim.state().clone();

    let iterations = 2_000u64;
    let start = Instant::now();

    for step in 1..=iterations {
        sim.tick(step * 50);
        let packet = Packet::CompressedState {
            compressed: compress_game_state(sim.state(), step * 50),
            timestamp: step * 50,
        };
        let datagram = encode_packet(&packet).unwrap();
        if let Ok(Packet::CompressedState { compressed, .. }) = decode_packet(&datagram) {
            previous = decompress_game_state(&compressed, Some(&previous));
        }
    }

    let duration = start.elapsed();
    println!(
        "Compressed pipeline: {} snapshots in {:?} ({:.2} μs/snapshot)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert_eq!(previous.tick, sim.state().tick);
    assert!(duration.as_secs() < 10);
}

/// Benchmarks building an interpolated frame on the client
#[test]
fn benchmark_render_state() {
    let mut sim = full_room(5);
    let mut client = ClientGameState::new(50);
    for step in 1..=50u64 {
        sim.tick(step * 50);
        client.apply_full(sim.state().clone(), step as f64 * 0.05);
    }

    let iterations = 10_000;
    let start = Instant::now();

    for i in 0..iterations {
        let now = 2.5 + (i % 50) as f64 * 0.001;
        let frame = client.render_state(now, true);
        assert!(frame.is_some());
    }

    let duration = start.elapsed();
    println!(
        "Render state: {} frames in {:?} ({:.2} μs/frame)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert!(duration.as_secs() < 5);
}
