use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Copy)]
pub struct Config {
    /// Période d'échantillonnage du capteur (ms)
    pub sample_interval: u64,
    /// Période de livraison par défaut des watchers (ms)
    pub watch_interval: u64,
}

impl Config {
    pub fn new() -> Self {
        Config {
            sample_interval: 100,
            watch_interval: 10,
        }
    }
}
