//! Fuzz target: register engine write path
//!
//! Interprets the input as a sequence of `(module, pin, level)` writes
//! against the sample bench and checks after each one that every card pin
//! state matches its register bit.
//!
//! cargo fuzz run fuzz_register_writes

#![no_main]

use libfuzzer_sys::fuzz_target;
use testbench::app::ports::BusPort;
use testbench::config::ConfigFile;
use testbench::error::BusError;
use testbench::gpio;

struct NullBus;

impl BusPort for NullBus {
    fn write_register(&mut self, _address: u8, _register: u8, _value: u8) -> Result<(), BusError> {
        Ok(())
    }
}

const SAMPLE: &str = include_str!("../../config/bench.example.json");

fuzz_target!(|data: &[u8]| {
    let config = ConfigFile::from_json(SAMPLE).expect("sample configuration");
    let bench = config.bench(None).expect("default bench");
    let mut topology = config.topology(bench);
    let mut bus = NullBus;
    gpio::initialise_pins(&mut topology, &mut bus).expect("initialisation");

    for op in data.chunks_exact(3) {
        let (module, pin, level) = (op[0] % 4, op[1] % 20, op[2] & 1 == 1);
        // Unknown modules and pins are ordinary errors.
        let _ = gpio::write_module_pin(&mut topology, &mut bus, module, pin, level);

        for card in topology.cards() {
            for card_pin in &card.pins {
                let Some(state) = card_pin.state else { continue };
                let loc = topology.locate(card_pin.gpio.pin, true).expect("card pins are mapped");
                let byte = topology
                    .module(card_pin.gpio.module)
                    .expect("card modules exist")
                    .register(loc.register)
                    .expect("register exists");
                assert_eq!(state, byte & loc.selector() != 0);
            }
        }
    }
});
