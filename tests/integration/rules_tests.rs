//! Etat derivation and command gating over the sample bench topology,
//! driven straight through the register engine (no service-level cache
//! invalidation).

use crate::mock_bench::{MockBus, sample_config};

use testbench::gpio;
use testbench::rules::etats::{DEBOUNCE_MS, NO_MATCH};
use testbench::rules::{Condition, Etat, StateEngine, commands};
use testbench::topology::Topology;

fn bench_a() -> (Topology, StateEngine, Vec<testbench::rules::Commande>) {
    let config = sample_config();
    let bench = config.bench(None).unwrap();
    let mut topology = config.topology(bench);
    gpio::initialise_pins(&mut topology, &mut MockBus::new()).unwrap();
    (
        topology,
        StateEngine::new(bench.etats.clone()),
        bench.commandes.clone(),
    )
}

#[test]
fn debounce_window_is_a_hard_one_second() {
    let (mut topology, mut engine, _) = bench_a();
    let mut bus = MockBus::new();

    assert_eq!(engine.current_code(&topology, "door", 10_000).unwrap(), 0);
    gpio::write_card_pin(&mut topology, &mut bus, "J1", "K1", true).unwrap();

    // Within the window: stale.
    assert_eq!(engine.current_code(&topology, "door", 10_500).unwrap(), 0);
    assert_eq!(
        engine.current_code(&topology, "door", 10_000 + DEBOUNCE_MS - 1).unwrap(),
        0
    );
    // At the window edge: re-evaluated.
    assert_eq!(
        engine.current_code(&topology, "door", 10_000 + DEBOUNCE_MS).unwrap(),
        1
    );
}

#[test]
fn no_match_clears_current_state() {
    let (mut topology, mut engine, _) = bench_a();
    let mut bus = MockBus::new();
    // K2 high alone matches neither "closed" nor "open".
    gpio::write_card_pin(&mut topology, &mut bus, "J1", "K2", true).unwrap();
    engine.refresh(&topology, 0).unwrap();
    let door = engine.etat("door").unwrap();
    assert_eq!(door.actual_code, NO_MATCH);
    assert!(door.actual_state.is_none());
}

#[test]
fn first_match_wins_on_overlap() {
    let (mut topology, _, _) = bench_a();
    let mut etats = sample_config().bench(None).unwrap().etats.clone();
    let mut ajar = etats[0].states[1].clone();
    ajar.name = "ajar".into();
    ajar.code = 2;
    etats[0].states.push(ajar);
    let mut engine = StateEngine::new(etats);

    gpio::write_card_pin(&mut topology, &mut MockBus::new(), "J1", "K1", true).unwrap();
    engine.refresh(&topology, 0).unwrap();
    assert_eq!(engine.code_of("door").unwrap(), 1);
    assert_eq!(engine.etat("door").unwrap().actual_state.as_deref(), Some("open"));
}

#[test]
fn negative_condition_holds_on_no_match() {
    let (mut topology, mut engine, _) = bench_a();
    let mut bus = MockBus::new();
    gpio::write_card_pin(&mut topology, &mut bus, "J1", "K2", true).unwrap();
    engine.refresh(&topology, 0).unwrap();

    let not_open = Condition {
        etat: "door".into(),
        code: -1,
    };
    assert_eq!(engine.code_of("door").unwrap(), NO_MATCH);
    assert!(not_open.holds(&engine).unwrap());
}

#[test]
fn resolve_distinguishes_forbidden_from_missing() {
    let (topology, mut engine, commandes) = bench_a();
    engine.refresh(&topology, 0).unwrap();

    assert!(matches!(
        commands::resolve(&commandes, &engine, "close", false),
        Err(testbench::BenchError::CommandForbidden(_))
    ));
    assert!(commands::resolve(&commandes, &engine, "close", true).is_ok());
    assert!(matches!(
        commands::resolve(&commandes, &engine, "nope", true),
        Err(testbench::BenchError::CommandNotFound(_))
    ));
}

#[test]
fn multi_card_constraint_needs_every_card() {
    let (mut topology, _, _) = bench_a();
    let latch: Etat = serde_json::from_str(
        r#"{"name": "latch", "states": [
            {"name": "both low", "code": 0, "outputs": [
                {"cards": ["J1", "J2"], "NumberOnCard": "K1", "state": false}]},
            {"name": "J1 low", "code": 2, "outputs": [
                {"cards": ["J1"], "NumberOnCard": "K1", "state": false}]}
        ]}"#,
    )
    .unwrap();
    let mut engine = StateEngine::new(vec![latch.clone()]);
    assert_eq!(engine.current_code(&topology, "latch", 0).unwrap(), 0);

    // J1 still matches, J2 no longer does.
    gpio::write_card_pin(&mut topology, &mut MockBus::new(), "J2", "K1", true).unwrap();
    engine.invalidate();
    assert_eq!(engine.current_code(&topology, "latch", 0).unwrap(), 2);
    assert_eq!(engine.etat("latch").unwrap().actual_state.as_deref(), Some("J1 low"));

    let mut only_both = latch;
    only_both.states.truncate(1);
    let mut engine = StateEngine::new(vec![only_both]);
    assert_eq!(engine.current_code(&topology, "latch", 0).unwrap(), NO_MATCH);
}
