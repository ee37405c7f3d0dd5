//! Drawing aids and unit settings stored with each document.

use crate::snap::SnapMode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Object snap and cursor constraint settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapSettings {
    /// Master switch for object snap.
    pub enabled: bool,
    pub modes: BTreeSet<SnapMode>,
    pub grid_snap: bool,
    pub ortho: bool,
    pub polar: bool,
    /// Polar tracking step in degrees.
    pub polar_angle: f64,
    /// Snap aperture in screen pixels.
    pub aperture: f64,
}

impl Default for SnapSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            modes: [
                SnapMode::Endpoint,
                SnapMode::Midpoint,
                SnapMode::Center,
                SnapMode::Quadrant,
                SnapMode::Intersection,
            ]
            .into_iter()
            .collect(),
            grid_snap: false,
            ortho: false,
            polar: false,
            polar_angle: 45.0,
            aperture: 10.0,
        }
    }
}

impl SnapSettings {
    pub fn toggle_mode(&mut self, mode: SnapMode) {
        if !self.modes.remove(&mode) {
            self.modes.insert(mode);
        }
    }

    /// Turn ortho on, which switches polar tracking off.
    pub fn set_ortho(&mut self, on: bool) {
        self.ortho = on;
        if on {
            self.polar = false;
        }
    }

    /// Turn polar tracking on, which switches ortho off.
    pub fn set_polar(&mut self, on: bool) {
        self.polar = on;
        if on {
            self.ortho = false;
        }
    }
}

/// Background grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSettings {
    pub visible: bool,
    /// Distance between minor grid lines in world units.
    pub spacing: f64,
    /// Every n-th line is drawn as a major line.
    pub major_every: u32,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            visible: true,
            spacing: 10.0,
            major_every: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LinearUnit {
    #[default]
    Millimeters,
    Centimeters,
    Meters,
    Inches,
    Feet,
    Unitless,
}

impl LinearUnit {
    pub fn suffix(&self) -> &'static str {
        match self {
            LinearUnit::Millimeters => "mm",
            LinearUnit::Centimeters => "cm",
            LinearUnit::Meters => "m",
            LinearUnit::Inches => "in",
            LinearUnit::Feet => "ft",
            LinearUnit::Unitless => "",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AngularUnit {
    #[default]
    Degrees,
    Radians,
}

/// How measurements are displayed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitSettings {
    pub linear: LinearUnit,
    pub angular: AngularUnit,
    /// Decimal places shown for lengths and angles.
    pub precision: usize,
}

impl Default for UnitSettings {
    fn default() -> Self {
        Self {
            linear: LinearUnit::default(),
            angular: AngularUnit::default(),
            precision: 2,
        }
    }
}

impl UnitSettings {
    pub fn format_length(&self, value: f64) -> String {
        format!("{:.*}{}", self.precision, value, self.linear.suffix())
    }

    /// Format an angle given in radians.
    pub fn format_angle(&self, radians: f64) -> String {
        match self.angular {
            AngularUnit::Degrees => format!("{:.*}°", self.precision, radians.to_degrees()),
            AngularUnit::Radians => format!("{:.*}rad", self.precision, radians),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_ortho_and_polar_are_exclusive() {
        let mut snap = SnapSettings::default();
        snap.set_polar(true);
        snap.set_ortho(true);
        assert!(snap.ortho && !snap.polar);
        snap.set_polar(true);
        assert!(snap.polar && !snap.ortho);
    }

    #[test]
    fn test_toggle_mode() {
        let mut snap = SnapSettings::default();
        assert!(snap.modes.contains(&SnapMode::Endpoint));
        snap.toggle_mode(SnapMode::Endpoint);
        assert!(!snap.modes.contains(&SnapMode::Endpoint));
        snap.toggle_mode(SnapMode::Nearest);
        assert!(snap.modes.contains(&SnapMode::Nearest));
    }

    #[test]
    fn test_partial_settings_fill_defaults() {
        let grid: GridSettings = serde_json::from_str(r#"{"spacing": 2.5}"#).unwrap();
        assert_eq!(grid.spacing, 2.5);
        assert_eq!(grid.major_every, 5);
    }

    #[test]
    fn test_format_units() {
        let units = UnitSettings::default();
        assert_eq!(units.format_length(12.346), "12.35mm");
        assert_eq!(units.format_angle(FRAC_PI_2), "90.00°");
    }
}
