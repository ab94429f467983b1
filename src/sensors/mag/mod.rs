use std::fmt;

use serde::{Deserialize, Serialize};

pub mod reader;

#[cfg(feature = "real-sensors")]
mod hmc8553l;
#[cfg(feature = "real-sensors")]
mod registry;

#[cfg(feature = "fake-sensors")]
pub use reader::FakeMagnetometer;
#[cfg(feature = "real-sensors")]
pub use reader::I2cMagnetometer;

/// Echantillon du champ magnétique sur les trois axes, en microteslas.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Heure de capture, en millisecondes depuis l'epoch Unix.
    pub timestamp: u64,
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "X: {:.2} Y: {:.2} Z: {:.2} ({})",
            self.x, self.y, self.z, self.timestamp
        )
    }
}
