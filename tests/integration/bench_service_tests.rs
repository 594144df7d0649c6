//! Integration tests for the BenchService → register engine → bus pipeline.

use crate::mock_bench::{MockBus, ManualClock, RecordingSink, sample_config, started_bench, started_bench_with};

use testbench::app::events::BenchEvent;
use testbench::app::service::BenchService;
use testbench::error::BenchError;
use testbench::gpio::WriteOutcome;
use testbench::rules::{Commande, PinTarget};
use testbench::telnet::InputStateReading;

// ── Bring-up ──────────────────────────────────────────────────

#[test]
fn start_configures_directions_then_initial_levels() {
    let clock = ManualClock::new();
    let mut service = BenchService::new(sample_config(), None, clock).unwrap();
    let mut bus = MockBus::new();
    let mut sink = RecordingSink::new();
    service.start(&mut bus, &mut sink).unwrap();

    assert_eq!(
        bus.writes,
        vec![
            (0x20, 0x00, 0x00),
            (0x20, 0x01, 0x00),
            (0x21, 0x00, 0x00),
            (0x21, 0x01, 0x00),
            // J1/K3 is declared high; everything else already matches the low default.
            (0x20, 0x13, 0b0000_0001),
        ]
    );
    assert_eq!(
        sink.events,
        vec![BenchEvent::Started {
            bench: "bench-a".into(),
            pins_written: 1
        }]
    );
    assert!(service.cards().iter().all(|c| c.pins.iter().all(|p| p.state.is_some())));
}

#[test]
fn update_registers_reapplies_setup_without_pin_writes() {
    let mut b = started_bench();
    b.service.update_registers(&mut b.bus, &mut b.sink).unwrap();
    assert_eq!(b.bus.writes.len(), 4, "direction registers only");
    assert_eq!(
        b.sink.events,
        vec![BenchEvent::RegistersRefreshed { pins_written: 0 }]
    );
}

// ── Writes ────────────────────────────────────────────────────

#[test]
fn card_write_is_idempotent() {
    let mut b = started_bench();
    let first = b
        .service
        .write_to_card("J1", "K2", true, &mut b.bus, &mut b.sink)
        .unwrap();
    let second = b
        .service
        .write_to_card("J1", "K2", true, &mut b.bus, &mut b.sink)
        .unwrap();
    assert_eq!(
        first,
        WriteOutcome::Written {
            address: 0x20,
            register: 0x12,
            value: 0b10
        }
    );
    assert_eq!(second, WriteOutcome::Unchanged);
    assert_eq!(b.bus.writes, vec![(0x20, 0x12, 0b10)]);
    assert_eq!(b.sink.count(|e| matches!(e, BenchEvent::RegisterWritten { .. })), 1);
}

#[test]
fn module_write_updates_the_wired_card_pin() {
    let mut b = started_bench();
    b.service
        .write_to_module(2, 1, true, &mut b.bus, &mut b.sink)
        .unwrap();
    assert!(b.service.pin("J2", "K2").unwrap().level());
    assert!(!b.service.pin("J1", "K2").unwrap().level());
    assert_eq!(b.bus.writes, vec![(0x21, 0x12, 0b10)]);
}

#[test]
fn module_write_resolution_errors_are_404() {
    let mut b = started_bench();
    let err = b
        .service
        .write_to_module(9, 0, true, &mut b.bus, &mut b.sink)
        .unwrap_err();
    assert_eq!((err.kind(), err.code()), ("MODULE_GPIO_NOT_FOUND", 404));

    let err = b
        .service
        .write_to_module(1, 99, true, &mut b.bus, &mut b.sink)
        .unwrap_err();
    assert_eq!((err.kind(), err.code()), ("PIN_NOT_FOUND", 404));
    assert!(b.bus.writes.is_empty());
}

#[test]
fn bus_fault_keeps_logical_state_and_refreshes_rules() {
    let mut b = started_bench();
    assert_eq!(b.service.current_code("door").unwrap(), 0);

    let mut dead_bus = MockBus::failing(0x20);
    let err = b
        .service
        .write_to_card("J1", "K1", true, &mut dead_bus, &mut b.sink)
        .unwrap_err();
    assert!(err.is_bus_fault());
    assert_eq!(err.code(), 500);
    assert!(b.service.pin("J1", "K1").unwrap().level());
    assert_eq!(b.service.module(1).unwrap().register(0), Some(0b1));
    // Same instant: the cache must not hide the new level.
    assert_eq!(b.service.current_code("door").unwrap(), 1);
    assert_eq!(b.sink.count(|e| matches!(e, BenchEvent::BusFault(_))), 1);
}

// ── Commands ──────────────────────────────────────────────────

#[test]
fn availability_follows_etat_codes() {
    let mut b = started_bench();
    let names: Vec<String> = b
        .service
        .available_commands()
        .unwrap()
        .iter()
        .map(|c| c.short_name.clone())
        .collect();
    assert_eq!(names, ["open", "off", "release"]);
    assert!(!b.service.is_available("close").unwrap());
}

#[test]
fn dispatch_gating_and_force() {
    let mut b = started_bench();
    assert_eq!(
        b.service
            .send_command("close", false, &mut b.bus, &mut b.sink)
            .unwrap_err(),
        BenchError::CommandForbidden("close".into())
    );
    assert_eq!(
        b.service
            .send_command("fly", true, &mut b.bus, &mut b.sink)
            .unwrap_err(),
        BenchError::CommandNotFound("fly".into())
    );
    // Forced: both outputs already low, nothing reaches the bus.
    assert_eq!(
        b.service
            .send_command("close", true, &mut b.bus, &mut b.sink)
            .unwrap(),
        0
    );
    assert!(b.bus.writes.is_empty());
}

#[test]
fn dispatch_invalidates_rules_within_the_same_instant() {
    let mut b = started_bench();
    assert_eq!(
        b.service
            .send_command("open", false, &mut b.bus, &mut b.sink)
            .unwrap(),
        1
    );
    assert_eq!(b.service.current_code("door").unwrap(), 1);
    assert!(b.service.is_available("close").unwrap());
    assert!(!b.service.is_available("open").unwrap());

    b.service
        .send_command("close", false, &mut b.bus, &mut b.sink)
        .unwrap();
    assert_eq!(b.service.current_code("door").unwrap(), 0);
    assert_eq!(b.bus.writes, vec![(0x20, 0x12, 0b1), (0x20, 0x12, 0b0)]);
}

#[test]
fn multi_card_outputs_apply_in_order() {
    let mut b = started_bench();
    b.service
        .write_to_card("J2", "K1", true, &mut b.bus, &mut b.sink)
        .unwrap();
    b.service
        .write_to_card("J1", "K2", true, &mut b.bus, &mut b.sink)
        .unwrap();
    b.service
        .write_to_card("J2", "K2", true, &mut b.bus, &mut b.sink)
        .unwrap();
    b.bus.clear();

    let writes = b
        .service
        .send_command("release", false, &mut b.bus, &mut b.sink)
        .unwrap();
    assert_eq!(writes, 3);
    assert_eq!(
        b.bus.writes,
        vec![(0x20, 0x12, 0b00), (0x21, 0x12, 0b01), (0x21, 0x12, 0b00)]
    );
}

#[test]
fn dispatch_stops_at_first_failure_without_rollback() {
    let mut config = sample_config();
    let target = |card: &str, pin: &str| PinTarget {
        cards: vec![card.into()],
        number_on_card: pin.into(),
        state: true,
    };
    config.configs[0].commandes.push(Commande {
        name: "Broken".into(),
        short_name: "broken".into(),
        conditions: vec![],
        outputs: vec![target("J1", "K2"), target("J9", "K1"), target("J1", "K1")],
    });
    let mut b = started_bench_with(config);

    let err = b
        .service
        .send_command("broken", false, &mut b.bus, &mut b.sink)
        .unwrap_err();
    assert_eq!(err.kind(), "CARD_NOT_FOUND");
    assert!(b.service.pin("J1", "K2").unwrap().level(), "earlier write stays");
    assert!(!b.service.pin("J1", "K1").unwrap().level(), "later write skipped");
    assert_eq!(
        b.sink.count(|e| matches!(e, BenchEvent::CommandDispatched { .. })),
        0
    );
}

// ── Configuration switching ───────────────────────────────────

#[test]
fn change_configuration_rebuilds_the_bench() {
    let mut b = started_bench();
    b.service
        .write_to_card("J1", "K1", true, &mut b.bus, &mut b.sink)
        .unwrap();

    b.service
        .change_configuration("bench-b", &mut b.bus, &mut b.sink)
        .unwrap();
    assert_eq!(b.service.bench_name(), "bench-b");
    assert_eq!(b.service.cards().len(), 1);
    assert_eq!(b.service.module(1).unwrap().register(0), Some(0));
    assert!(b.service.etats().unwrap().is_empty());

    let err = b
        .service
        .change_configuration("bench-z", &mut b.bus, &mut b.sink)
        .unwrap_err();
    assert_eq!((err.kind(), err.code()), ("CONFIGURATION_NOT_FOUND", 404));
    assert_eq!(b.service.bench_name(), "bench-b");
}

// ── Telnet readings ───────────────────────────────────────────

#[test]
fn readings_are_kept_per_declared_device() {
    let mut b = started_bench();
    b.service
        .change_configuration("bench-b", &mut b.bus, &mut b.sink)
        .unwrap();

    let reading = |device: &str, line: &str| InputStateReading {
        device: device.into(),
        lines: [line.into(), "1 1".into()],
    };
    assert!(b.service.store_reading(reading("mesd-1", "0 0"), &mut b.sink));
    assert!(b.service.store_reading(reading("mesd-1", "0 1"), &mut b.sink));
    assert!(!b.service.store_reading(reading("ghost", "0 0"), &mut b.sink));

    let states = b.service.input_states();
    assert_eq!(states.len(), 1);
    assert_eq!(states[0].lines[0], "0 1");
    // Readings never touch pin state.
    assert!(!b.service.pin("P1", "1").unwrap().level());
}
