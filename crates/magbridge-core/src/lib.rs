//! # magbridge-core
//!
//! Core magnetometer telemetry model.
//!
//! This crate provides:
//! - Reading and sample types (field strength, unit direction, heading)
//! - Compass heading classification
//! - Command vocabulary and pure dispatch
//! - Hard-iron calibration and send cadence
//! - Sensor and indicator seams with host simulations
//! - Bridge configuration
//!
//! This crate is intentionally runtime-agnostic and contains no async code,
//! making it usable on both Linux (tokio) and embedded targets.

pub mod cadence;
pub mod calibration;
pub mod command;
pub mod config;
pub mod heading;
pub mod model;
pub mod sensor;

pub use cadence::SendCadence;
pub use calibration::{CalibrationStatus, HardIronCalibrator};
pub use command::{dispatch_token, Command, CommandAction};
pub use config::{
    BridgeConfig, ClientConfig, ConfigError, NetworkConfig, RetryPolicy, ServerConfig,
    SimulatorConfig, StartupConfig,
};
pub use heading::{Heading, HeadingReference};
pub use model::{MagReading, Sample};
pub use sensor::{Indicator, Magnetometer, SensorError, SharedIndicator, SimulatedMagnetometer};
