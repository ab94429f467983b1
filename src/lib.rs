//! Adaptateur magnétomètre : fait le pont entre le service de capteurs de la
//! plateforme et un canal de résultats asynchrone côté hôte.

pub mod bridge;
pub mod cli;
pub mod config;
pub mod plugin;
pub mod sensors;
pub mod watcher;

#[cfg(feature = "real-sensors")]
pub mod i2c;

pub use bridge::{Bridge, CallbackId, Command, Payload, PluginResult};
pub use config::Config;
pub use plugin::Magnetometer;
pub use sensors::mag::Reading;
pub use sensors::{MotionService, ReadingStream};
pub use watcher::{WatchId, Watcher};
