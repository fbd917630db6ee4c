//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements       | Connects to                 |
//! |------------|------------------|-----------------------------|
//! | `hardware` | SensorPort       | ESP32 ADC1, flow pulse GPIO |
//! |            | TickTimer        | GPTimer (or `SimTimer`)     |
//! |            | Command/Output   | the listener link           |
//! | `log_sink` | EventSink        | Console log output          |
//! | `uart`     | CommandChannel   | UART to the listener        |
//! |            | OutputChannel    |                             |

pub mod hardware;
pub mod log_sink;
pub mod uart;
