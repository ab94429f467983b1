//! Service de mouvement scripté pour les tests d'intégration.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc::{self, UnboundedSender};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_util::sync::CancellationToken;

use magnetometrie::{MotionService, Reading, ReadingStream};

/// Service scripté : chaque abonnement rend un flux alimenté à la main par
/// le test, comme si la plateforme produisait les échantillons.
pub struct ScriptedService {
    sessions: Mutex<Vec<UnboundedSender<anyhow::Result<Reading>>>>,
    unavailable: bool,
}

impl ScriptedService {
    pub fn new() -> Arc<Self> {
        Arc::new(ScriptedService {
            sessions: Mutex::new(Vec::new()),
            unavailable: false,
        })
    }

    /// Variante sans capteur : tout abonnement échoue.
    pub fn broken() -> Arc<Self> {
        Arc::new(ScriptedService {
            sessions: Mutex::new(Vec::new()),
            unavailable: true,
        })
    }

    /// Nombre d'abonnements reçus depuis la création.
    pub fn session_count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    /// Publie un événement sur l'abonnement le plus récent.
    pub fn send(&self, event: anyhow::Result<Reading>) {
        let sessions = self.sessions.lock().unwrap();
        let tx = sessions.last().expect("aucun abonnement actif");
        let _ = tx.send(event);
    }
}

impl MotionService for ScriptedService {
    fn magnetometer_updates(&self, _token: CancellationToken) -> anyhow::Result<ReadingStream> {
        if self.unavailable {
            anyhow::bail!("Capteur indisponible");
        }

        let (tx, rx) = mpsc::unbounded_channel();
        self.sessions.lock().unwrap().push(tx);
        Ok(Box::pin(UnboundedReceiverStream::new(rx)))
    }
}

pub fn reading(x: f64, y: f64, z: f64, timestamp: u64) -> Reading {
    Reading { x, y, z, timestamp }
}
