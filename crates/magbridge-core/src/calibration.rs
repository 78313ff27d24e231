//! Hard-iron calibration.
//!
//! A capture collects a fixed number of raw readings while the device is
//! rotated and tracks per-axis extremes. When the capture completes, the
//! offset for each axis is the midpoint of its extremes; the offset is
//! subtracted from every later reading.
//!
//! Offsets live in memory only and are lost on restart.

use crate::model::MagReading;

/// Progress of the calibrator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CalibrationStatus {
    /// No capture running.
    Idle,
    /// Capture in progress.
    Capturing { collected: usize, target: usize },
}

#[derive(Debug, Clone, Copy)]
struct Capture {
    collected: usize,
    min: MagReading,
    max: MagReading,
}

/// Collects readings and derives hard-iron offsets.
#[derive(Debug, Clone)]
pub struct HardIronCalibrator {
    target: usize,
    capture: Option<Capture>,
    offset: MagReading,
}

impl HardIronCalibrator {
    /// Create a calibrator that captures `target` readings per run.
    ///
    /// A target of zero disables capturing.
    pub fn new(target: usize) -> Self {
        Self {
            target,
            capture: None,
            offset: MagReading::default(),
        }
    }

    /// Begin (or restart) a capture. Returns `false` when capturing is disabled.
    pub fn start(&mut self) -> bool {
        if self.target == 0 {
            return false;
        }
        self.capture = Some(Capture {
            collected: 0,
            min: MagReading::new(f32::INFINITY, f32::INFINITY, f32::INFINITY),
            max: MagReading::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
        });
        true
    }

    /// Feed one raw reading. Returns the new offset when the capture completes.
    pub fn observe(&mut self, raw: MagReading) -> Option<MagReading> {
        let capture = self.capture.as_mut()?;

        if raw.x.is_finite() && raw.y.is_finite() && raw.z.is_finite() {
            capture.min = MagReading::new(
                capture.min.x.min(raw.x),
                capture.min.y.min(raw.y),
                capture.min.z.min(raw.z),
            );
            capture.max = MagReading::new(
                capture.max.x.max(raw.x),
                capture.max.y.max(raw.y),
                capture.max.z.max(raw.z),
            );
            capture.collected += 1;
        }

        if capture.collected < self.target {
            return None;
        }

        let offset = MagReading::new(
            (capture.max.x + capture.min.x) / 2.0,
            (capture.max.y + capture.min.y) / 2.0,
            (capture.max.z + capture.min.z) / 2.0,
        );
        self.offset = offset;
        self.capture = None;
        Some(offset)
    }

    /// Remove the current offset from a raw reading.
    pub fn apply(&self, raw: MagReading) -> MagReading {
        raw.offset_by(&self.offset)
    }

    pub fn offset(&self) -> MagReading {
        self.offset
    }

    pub fn status(&self) -> CalibrationStatus {
        match &self.capture {
            Some(capture) => CalibrationStatus::Capturing {
                collected: capture.collected,
                target: self.target,
            },
            None => CalibrationStatus::Idle,
        }
    }
}
