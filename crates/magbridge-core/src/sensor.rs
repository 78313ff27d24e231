//! Hardware seams: the magnetometer driver and the indicator output.
//!
//! Both traits are synchronous so they can be implemented directly on top
//! of blocking I2C/GPIO drivers. Host builds use the simulated
//! implementations in this module.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;

use crate::model::MagReading;

/// Errors reported by a magnetometer driver.
#[derive(Debug, Error)]
pub enum SensorError {
    /// The device did not answer during initialization.
    #[error("Magnetometer not detected, check wiring")]
    NotDetected,

    /// `read` was called before a successful `init`.
    #[error("Magnetometer not initialized")]
    NotInitialized,

    /// A bus transaction failed.
    #[error("Magnetometer read failed: {0}")]
    ReadFailed(String),
}

/// A 3-axis magnetometer.
pub trait Magnetometer: Send {
    /// Probe and configure the device.
    fn init(&mut self) -> Result<(), SensorError>;

    /// Read one sample in µT.
    fn read(&mut self) -> Result<MagReading, SensorError>;
}

/// An on/off indicator output (e.g. a status LED).
pub trait Indicator: Send {
    fn set(&mut self, on: bool);

    fn is_on(&self) -> bool;
}

// ============================================================================
// Host implementations
// ============================================================================

/// Deterministic magnetometer that sweeps a constant field around the
/// vertical axis, as if the device were turning slowly on a level table.
#[derive(Debug, Clone)]
pub struct SimulatedMagnetometer {
    /// Total field strength in µT.
    strength: f32,
    /// Current compass bearing of the horizontal component, degrees.
    bearing_deg: f32,
    /// Bearing advance per read, degrees.
    step_deg: f32,
    present: bool,
    initialized: bool,
}

impl SimulatedMagnetometer {
    /// Dip angle below the horizontal plane, degrees.
    const INCLINATION_DEG: f32 = 65.0;

    pub fn new(strength: f32, start_bearing_deg: f32, step_deg: f32) -> Self {
        Self {
            strength,
            bearing_deg: start_bearing_deg,
            step_deg,
            present: true,
            initialized: false,
        }
    }

    /// A magnetometer that never answers `init`.
    pub fn absent() -> Self {
        Self {
            present: false,
            ..Self::default()
        }
    }
}

impl Default for SimulatedMagnetometer {
    fn default() -> Self {
        Self::new(48.0, 0.0, 8.0)
    }
}

impl Magnetometer for SimulatedMagnetometer {
    fn init(&mut self) -> Result<(), SensorError> {
        if !self.present {
            return Err(SensorError::NotDetected);
        }
        self.initialized = true;
        Ok(())
    }

    fn read(&mut self) -> Result<MagReading, SensorError> {
        if !self.initialized {
            return Err(SensorError::NotInitialized);
        }

        let incl = Self::INCLINATION_DEG.to_radians();
        let bearing = self.bearing_deg.to_radians();
        let horizontal = self.strength * incl.cos();

        let reading = MagReading::new(
            horizontal * bearing.sin(),
            horizontal * bearing.cos(),
            -self.strength * incl.sin(),
        );

        self.bearing_deg = (self.bearing_deg + self.step_deg).rem_euclid(360.0);
        Ok(reading)
    }
}

/// Indicator backed by a shared flag. Clones observe the same level.
#[derive(Debug, Clone, Default)]
pub struct SharedIndicator {
    level: Arc<AtomicBool>,
}

impl SharedIndicator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Indicator for SharedIndicator {
    fn set(&mut self, on: bool) {
        self.level.store(on, Ordering::SeqCst);
    }

    fn is_on(&self) -> bool {
        self.level.load(Ordering::SeqCst)
    }
}
