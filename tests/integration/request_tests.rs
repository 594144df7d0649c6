//! JSON request → response envelope round trips through `BenchService::handle`.

use serde_json::Value;

use crate::mock_bench::{Bench, EPOCH_ORIGIN_MS, started_bench};

use testbench::app::requests::BenchRequest;

fn send(b: &mut Bench, json: &str) -> Value {
    let request: BenchRequest = serde_json::from_str(json).unwrap();
    let envelope = b.service.handle(request, &mut b.bus, &mut b.sink);
    serde_json::to_value(&envelope).unwrap()
}

#[test]
fn read_requests_wrap_data() {
    let mut b = started_bench();
    b.clock.advance(42);
    let resp = send(&mut b, r#"{"command": "allCards"}"#);
    assert_eq!(resp["status"]["code"], 200);
    assert_eq!(resp["dataName"], "allCards");
    assert_eq!(resp["date"], EPOCH_ORIGIN_MS + 42);
    assert_eq!(resp["data"].as_array().unwrap().len(), 2);
    assert_eq!(resp["data"][0]["cardName"], "J1");

    let resp = send(&mut b, r#"{"command": "bancPinout"}"#);
    assert_eq!(resp["data"][1]["gpio_register"], "0x13");
}

#[test]
fn string_typed_module_write_then_pin_read() {
    let mut b = started_bench();
    let resp = send(
        &mut b,
        r#"{"command": "writeToModule", "options": {"module": "1", "pin": "1", "state": "true"}}"#,
    );
    assert_eq!(resp["status"]["code"], 200);
    assert!(resp.get("data").is_none());

    let resp = send(
        &mut b,
        r#"{"command": "pin", "options": {"cardName": "J1", "numberOnCard": "K2"}}"#,
    );
    assert_eq!(resp["data"]["state"], true);
    assert_eq!(resp["data"]["GPIO"]["Pin"], 1);
}

#[test]
fn malformed_module_write_is_400() {
    let mut b = started_bench();
    let resp = send(
        &mut b,
        r#"{"command": "writeToModule", "options": {"module": "one", "pin": 1, "state": true}}"#,
    );
    assert_eq!(resp["status"]["code"], 400);
    assert_eq!(resp["status"]["kind"], "INVALID_REQUEST");
    assert!(b.bus.writes.is_empty());
}

#[test]
fn error_kinds_and_codes() {
    let mut b = started_bench();
    let resp = send(
        &mut b,
        r#"{"command": "sendCommand", "options": {"commandName": "close"}}"#,
    );
    assert_eq!(resp["status"]["code"], 406);
    assert_eq!(resp["status"]["kind"], "COMMAND_FORBIDDEN");

    let resp = send(&mut b, r#"{"command": "card", "options": {"cardName": "J9"}}"#);
    assert_eq!(resp["status"]["code"], 404);
    assert_eq!(resp["status"]["kind"], "CARD_NOT_FOUND");

    let resp = send(&mut b, r#"{"command": "etat", "options": {"name": "window"}}"#);
    assert_eq!(resp["status"]["kind"], "ETAT_NOT_FOUND");
}

#[test]
fn etats_report_codes_and_current_state() {
    let mut b = started_bench();
    let resp = send(&mut b, r#"{"command": "allEtats"}"#);
    let etats = resp["data"].as_array().unwrap();
    assert_eq!(etats[0]["name"], "door");
    assert_eq!(etats[0]["actualCode"], 0);
    assert_eq!(etats[0]["actualState"], "closed");
    assert_eq!(etats[1]["actualCode"], 1);
}

#[test]
fn forced_command_and_current_config() {
    let mut b = started_bench();
    let resp = send(
        &mut b,
        r#"{"command": "sendCommand", "options": {"commandName": "off", "force": true}}"#,
    );
    assert_eq!(resp["status"]["code"], 200);

    let resp = send(&mut b, r#"{"command": "currentConfig"}"#);
    assert_eq!(resp["data"]["Name"], "bench-a");
    assert_eq!(resp["data"]["Etats"][1]["actualState"], "off");
    assert_eq!(resp["data"]["Cards"][0]["pins"][2]["state"], false);
}

#[test]
fn change_configuration_returns_the_new_bench() {
    let mut b = started_bench();
    let resp = send(
        &mut b,
        r#"{"command": "changeConfiguration", "options": {"configurationName": "bench-b"}}"#,
    );
    assert_eq!(resp["status"]["code"], 200);
    assert_eq!(resp["data"]["Telnet"][0]["name"], "mesd-1");

    let resp = send(&mut b, r#"{"command": "allConfigs"}"#);
    assert_eq!(resp["data"].as_array().unwrap().len(), 2);
}
