// Magnetic Quantization - Pulls near-grid notes onto the grid, leaves the rest alone
// Tolerant snapping that keeps deliberately syncopated hits where they were played

use serde::{Deserialize, Serialize};

use crate::config::ConvertConfig;
use crate::timeline::Tick;

/// Snap grid derived from the file's tick resolution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnapGrid {
    /// Grid spacing in ticks (resolution / 2 = eighth notes)
    pub spacing: f64,

    /// Maximum distance in ticks a note may be moved
    pub tolerance: f64,
}

impl SnapGrid {
    /// Create a grid with `division` lines per quarter note
    ///
    /// # Arguments
    /// * `resolution` - Ticks per quarter note of the source file
    /// * `division` - Grid lines per quarter note (2 = eighth notes)
    /// * `tolerance_ratio` - Snap window as a fraction of `resolution`
    pub fn new(resolution: u16, division: u16, tolerance_ratio: f64) -> Self {
        SnapGrid {
            spacing: f64::from(resolution) / f64::from(division.max(1)),
            tolerance: f64::from(resolution) * tolerance_ratio,
        }
    }

    pub fn from_config(resolution: u16, config: &ConvertConfig) -> Self {
        SnapGrid::new(resolution, config.snap_division, config.snap_tolerance)
    }

    /// Nearest grid line if `tick` lies within tolerance of it, else `tick`
    pub fn snap(&self, tick: Tick) -> Tick {
        if self.spacing <= 0.0 {
            return tick;
        }

        let raw = f64::from(tick);
        let nearest = (raw / self.spacing).round() * self.spacing;

        if (raw - nearest).abs() <= self.tolerance {
            nearest as Tick
        } else {
            tick
        }
    }
}
