//! Magnetometer data model types.
//!
//! These types describe one pass through the sampling loop:
//! - Raw readings as delivered by a sensor driver
//! - Derived samples (strength, unit direction, heading label)
//!
//! Samples are transient. They are built, encoded and dropped within a
//! single loop iteration.

use serde::{Deserialize, Serialize};

use crate::heading::{Heading, HeadingReference};

/// Field magnitudes below this are treated as zero.
pub const MIN_FIELD_STRENGTH: f32 = 1e-6;

/// A raw 3-axis magnetometer reading in microtesla (µT).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MagReading {
    /// X-axis magnetic field in µT
    pub x: f32,
    /// Y-axis magnetic field in µT
    pub y: f32,
    /// Z-axis magnetic field in µT
    pub z: f32,
}

impl MagReading {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Euclidean norm of the field vector in µT.
    #[must_use]
    pub fn magnitude(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Unit vector along the field.
    ///
    /// A zero or non-finite magnitude yields `[0, 0, 0]`.
    #[must_use]
    pub fn unit_vector(&self) -> [f32; 3] {
        let mag = self.magnitude();
        if !mag.is_finite() || mag < MIN_FIELD_STRENGTH {
            [0.0, 0.0, 0.0]
        } else {
            [self.x / mag, self.y / mag, self.z / mag]
        }
    }

    /// Component-wise subtraction, used to remove hard-iron offsets.
    #[must_use]
    pub fn offset_by(&self, offset: &MagReading) -> MagReading {
        MagReading {
            x: self.x - offset.x,
            y: self.y - offset.y,
            z: self.z - offset.z,
        }
    }
}

/// A derived sample ready for encoding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub magnetic_x: f32,
    pub magnetic_y: f32,
    pub magnetic_z: f32,

    /// Magnitude of the field vector (µT).
    pub field_strength: f32,

    /// Field components normalized by `field_strength`.
    pub direction_vector: [f32; 3],

    /// Compass label for the horizontal components.
    pub heading: Heading,
}

impl Sample {
    /// Build a sample from a reading.
    ///
    /// When the field strength is zero the direction vector is `[0, 0, 0]`
    /// and the heading is [`Heading::Unknown`].
    pub fn from_reading(reading: MagReading, reference: HeadingReference) -> Self {
        let field_strength = reading.magnitude();
        let zero_field = !field_strength.is_finite() || field_strength < MIN_FIELD_STRENGTH;

        let heading = if zero_field {
            Heading::Unknown
        } else {
            Heading::from_components(reading.x, reading.y, reference)
        };

        Self {
            magnetic_x: reading.x,
            magnetic_y: reading.y,
            magnetic_z: reading.z,
            field_strength: if zero_field { 0.0 } else { field_strength },
            direction_vector: reading.unit_vector(),
            heading,
        }
    }
}
