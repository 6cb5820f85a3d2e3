//! Sony IMX586 image sensor driver
//!
//! Control-plane driver for the IMX586 CMOS sensor over I2C: mode selection
//! and media bus format negotiation, line/frame timing, exposure and analog
//! gain mapping, and the standby/streaming state machine. `no_std`,
//! built on `embedded-hal` 1.0, with optional `defmt` logging.
//!
//! ```ignore
//! use imx586_rs::{Config, Imx586};
//!
//! let mut sensor = Imx586::probe(i2c, delay, Config::color())?;
//! sensor.set_exposure(1000)?;
//! sensor.start()?;
//! ```

#![no_std]

// Must come first so the logging macros are visible to the other modules.
mod fmt;

pub mod controls;
pub mod data_types;
pub mod driver;
pub mod error;
pub mod format;
pub mod gain;
pub mod modes;
pub mod registers;
pub mod timing;

pub use data_types::Config;
pub use driver::Imx586;
pub use error::Error;
pub use registers::DEFAULT_I2C_ADDRESS;
