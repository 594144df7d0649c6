//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter       | Implements  | Connects to                     |
//! |---------------|-------------|---------------------------------|
//! | `i2c_bus`     | BusPort     | any `embedded-hal` I2C master   |
//! | `sim_bus`     | BusPort     | in-memory register file         |
//! | `json_config` | ConfigPort  | JSON configuration file         |
//! | `log_sink`    | EventSink   | `log` facade                    |
//! | `time`        | ClockPort   | `std::time`                     |

pub mod i2c_bus;
pub mod json_config;
pub mod log_sink;
pub mod sim_bus;
pub mod time;
