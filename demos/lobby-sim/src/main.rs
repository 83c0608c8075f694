//! Two simulated devices walking through a full lobby:
//! Alice hosts, Bob discovers and joins, both pick troupes, the game
//! starts, and a health edit propagates. Run with
//! `RUST_LOG=debug cargo run -p lobby-sim` to watch the protocol.

use std::sync::Arc;
use std::time::Duration;

use muster::{
    bundled_characters, encode_share_code, AppState, CharacterCatalog, Faction, MemoryHub,
    MemoryStore, Phase, PlayUpdate, SessionHandle, SessionService, SlotKey, Troupe,
};

fn device(hub: &MemoryHub, name: &str) -> SessionHandle {
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    let driver = hub.attach(tx);
    SessionService::spawn(name, driver, rx, Arc::new(MemoryStore::new()))
}

async fn wait_for(
    handle: &SessionHandle,
    what: &str,
    predicate: impl Fn(&AppState) -> bool,
) -> AppState {
    for _ in 0..400 {
        let state = handle.snapshot().await.expect("service alive");
        if predicate(&state) {
            return state;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("timed out waiting for: {what}");
}

fn faction_troupe(name: &str, faction: Faction) -> Troupe {
    let characters = bundled_characters()
        .into_iter()
        .filter(|c| c.faction == faction)
        .map(|c| c.id)
        .take(3)
        .collect();
    Troupe::new(name, faction, characters)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let hub = MemoryHub::new();
    let alice = device(&hub, "Alice");
    let bob = device(&hub, "Bob");

    // -- Match setup -------------------------------------------------------
    alice.start_hosting().await.unwrap();
    bob.start_discovery().await.unwrap();

    let state = wait_for(&bob, "discovery", |s| !s.discovered.is_empty()).await;
    let (endpoint, name) = state.discovered[0].clone();
    println!("Bob discovered \"{name}\" at {endpoint}");

    bob.request_join(endpoint).await.unwrap();
    let state = wait_for(&bob, "join", |s| {
        s.phase == Phase::ClientActive
            && s.session.as_ref().is_some_and(|v| v.players.len() == 2)
    })
    .await;
    let view = state.session.unwrap();
    println!(
        "session {} seats: {}",
        view.id,
        view.players
            .iter()
            .map(|p| p.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    // -- Troupe selection --------------------------------------------------
    let vanguard = faction_troupe("Vanguard", Faction::Concord);
    let raiders = faction_troupe("Raiders", Faction::Dominion);
    let catalog = CharacterCatalog::new(bundled_characters());
    println!(
        "Raiders share code: {}",
        encode_share_code(&raiders, &catalog).unwrap()
    );

    alice.select_troupe(vanguard).await.unwrap();
    bob.select_troupe(raiders).await.unwrap();
    wait_for(&alice, "troupes", |s| {
        s.session
            .as_ref()
            .is_some_and(|v| v.players.iter().all(|p| p.troupe.is_some()))
    })
    .await;
    println!("both seats locked in");

    // -- Game --------------------------------------------------------------
    alice.start_game().await.unwrap();
    wait_for(&bob, "game start", |s| s.play.is_some()).await;

    alice
        .apply_play_update(0, 0, PlayUpdate::Health { value: 4 })
        .await
        .unwrap();
    let state = wait_for(&bob, "health edit", |s| {
        s.play
            .as_ref()
            .and_then(|p| p.get(SlotKey { seat: 0, slot: 0 }))
            .is_some_and(|c| c.health == 4)
    })
    .await;
    let play = state.play.unwrap();
    println!(
        "turn {}: seat 0 slot 0 now at {} health on Bob's device",
        play.turn,
        play.get(SlotKey { seat: 0, slot: 0 }).unwrap().health
    );

    alice.leave().await.unwrap();
    bob.leave().await.unwrap();
    println!("done");
}
