//! Compass heading classification.
//!
//! A bearing in degrees is folded into `[0, 360)` and mapped onto eight
//! 45°-wide sectors, with North centered on 0°:
//!
//! | Sector            | Label     |
//! |-------------------|-----------|
//! | [337.5, 22.5)     | North     |
//! | [22.5, 67.5)      | Northeast |
//! | [67.5, 112.5)     | East      |
//! | [112.5, 157.5)    | Southeast |
//! | [157.5, 202.5)    | South     |
//! | [202.5, 247.5)    | Southwest |
//! | [247.5, 292.5)    | West      |
//! | [292.5, 337.5)    | Northwest |

use std::fmt;

use serde::{Deserialize, Serialize};

/// Width of one compass sector in degrees.
pub const SECTOR_WIDTH_DEG: f64 = 45.0;

/// One of the eight compass labels, or `Unknown` for a zero field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Heading {
    North,
    Northeast,
    East,
    Southeast,
    South,
    Southwest,
    West,
    Northwest,
    /// No horizontal direction can be derived (zero field strength).
    Unknown,
}

/// Sector order starting at North, clockwise.
const SECTORS: [Heading; 8] = [
    Heading::North,
    Heading::Northeast,
    Heading::East,
    Heading::Southeast,
    Heading::South,
    Heading::Southwest,
    Heading::West,
    Heading::Northwest,
];

/// Axis convention used to turn horizontal components into a bearing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadingReference {
    /// North along +y, East along +x: bearing = atan2(x, y).
    #[default]
    Compass,
    /// Angle measured from +x towards +y: bearing = atan2(y, x).
    Mathematical,
}

impl HeadingReference {
    /// Bearing in degrees, folded into `[0, 360)`.
    pub fn bearing_deg(self, x: f32, y: f32) -> f64 {
        let (x, y) = (f64::from(x), f64::from(y));
        let raw = match self {
            HeadingReference::Compass => x.atan2(y),
            HeadingReference::Mathematical => y.atan2(x),
        };
        normalize_deg(raw.to_degrees())
    }
}

/// Fold any angle into `[0, 360)`.
pub fn normalize_deg(deg: f64) -> f64 {
    let folded = deg.rem_euclid(360.0);
    // rem_euclid can round tiny negatives up to exactly 360.0
    if folded >= 360.0 {
        0.0
    } else {
        folded
    }
}

impl Heading {
    /// Classify a bearing in degrees. Any finite angle is accepted.
    pub fn from_degrees(deg: f64) -> Self {
        if !deg.is_finite() {
            return Heading::Unknown;
        }
        let shifted = normalize_deg(deg + SECTOR_WIDTH_DEG / 2.0);
        let index = (shifted / SECTOR_WIDTH_DEG) as usize;
        SECTORS[index.min(SECTORS.len() - 1)]
    }

    /// Classify horizontal field components.
    pub fn from_components(x: f32, y: f32, reference: HeadingReference) -> Self {
        Self::from_degrees(reference.bearing_deg(x, y))
    }

    /// Wire label for this heading.
    pub fn label(self) -> &'static str {
        match self {
            Heading::North => "North",
            Heading::Northeast => "Northeast",
            Heading::East => "East",
            Heading::Southeast => "Southeast",
            Heading::South => "South",
            Heading::Southwest => "Southwest",
            Heading::West => "West",
            Heading::Northwest => "Northwest",
            Heading::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Heading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cardinal_components_compass() {
        let r = HeadingReference::Compass;
        assert_eq!(Heading::from_components(1.0, 0.0, r), Heading::East);
        assert_eq!(Heading::from_components(0.0, 1.0, r), Heading::North);
        assert_eq!(Heading::from_components(-1.0, 0.0, r), Heading::West);
        assert_eq!(Heading::from_components(0.0, -1.0, r), Heading::South);
    }

    #[test]
    fn test_cardinal_components_mathematical() {
        let r = HeadingReference::Mathematical;
        assert_eq!(Heading::from_components(1.0, 0.0, r), Heading::North);
        assert_eq!(Heading::from_components(0.0, 1.0, r), Heading::East);
        assert_eq!(Heading::from_components(-1.0, 0.0, r), Heading::South);
        assert_eq!(Heading::from_components(0.0, -1.0, r), Heading::West);
    }

    #[test]
    fn test_sector_boundaries() {
        let cases = [
            (0.0, Heading::North),
            (22.5, Heading::Northeast),
            (67.5, Heading::East),
            (112.5, Heading::Southeast),
            (157.5, Heading::South),
            (202.5, Heading::Southwest),
            (247.5, Heading::West),
            (292.5, Heading::Northwest),
            (337.5, Heading::North),
        ];
        for (deg, expected) in cases {
            assert_eq!(Heading::from_degrees(deg), expected, "at {}°", deg);
        }
    }

    #[test]
    fn test_just_below_boundaries() {
        let eps = 1e-6;
        let cases = [
            (22.5 - eps, Heading::North),
            (67.5 - eps, Heading::Northeast),
            (112.5 - eps, Heading::East),
            (157.5 - eps, Heading::Southeast),
            (202.5 - eps, Heading::South),
            (247.5 - eps, Heading::Southwest),
            (292.5 - eps, Heading::West),
            (337.5 - eps, Heading::Northwest),
            (360.0 - eps, Heading::North),
        ];
        for (deg, expected) in cases {
            assert_eq!(Heading::from_degrees(deg), expected, "at {}°", deg);
        }
    }

    #[test]
    fn test_classification_is_total() {
        let mut deg = 0.0;
        while deg < 360.0 {
            assert_ne!(Heading::from_degrees(deg), Heading::Unknown, "gap at {}°", deg);
            deg += 0.25;
        }
    }

    #[test]
    fn test_wraparound() {
        assert_eq!(Heading::from_degrees(360.0), Heading::North);
        assert_eq!(Heading::from_degrees(-10.0), Heading::North);
        assert_eq!(Heading::from_degrees(-90.0), Heading::West);
        assert_eq!(Heading::from_degrees(405.0), Heading::Northeast);
        assert_eq!(Heading::from_degrees(f64::NAN), Heading::Unknown);
    }

    #[test]
    fn test_normalize_tiny_negative() {
        let folded = normalize_deg(-1e-20);
        assert!((0.0..360.0).contains(&folded));
    }

    #[test]
    fn test_labels_serialize_as_names() {
        assert_eq!(serde_json::to_string(&Heading::Southwest).unwrap(), "\"Southwest\"");
        assert_eq!(Heading::Northeast.to_string(), "Northeast");
        let r: HeadingReference = serde_json::from_str("\"mathematical\"").unwrap();
        assert_eq!(r, HeadingReference::Mathematical);
    }
}
