use std::fmt;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use uuid::Uuid;

use crate::sensors::mag::Reading;

/// Identifiant de requête opaque, fourni par l'hôte pour router les résultats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CallbackId(Uuid);

impl CallbackId {
    pub fn new() -> Self {
        CallbackId(Uuid::new_v4())
    }
}

impl fmt::Display for CallbackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Les deux commandes acceptées par le plugin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
}

/// Corps d'un résultat renvoyé à l'hôte.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    Sample(Reading),
    Error(String),
}

/// Résultat asynchrone, routé par identifiant de requête.
#[derive(Clone, Debug, PartialEq)]
pub struct PluginResult {
    pub id: CallbackId,
    pub payload: Payload,
    /// Canal maintenu ouvert pour d'autres livraisons sur le même identifiant.
    pub keep_callback: bool,
}

/// Côté émission du pont hôte.
#[derive(Clone)]
pub struct Bridge {
    tx: UnboundedSender<PluginResult>,
}

impl Bridge {
    pub fn new() -> (Self, UnboundedReceiver<PluginResult>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Bridge { tx }, rx)
    }

    /// Livraison d'un échantillon, canal maintenu ouvert.
    pub(crate) fn send_sample(&self, id: CallbackId, reading: Reading) {
        // L'hôte a pu fermer son côté du canal, auquel cas on ignore.
        let _ = self.tx.send(PluginResult {
            id,
            payload: Payload::Sample(reading),
            keep_callback: true,
        });
    }

    /// Livraison d'une erreur, fin des livraisons sur cet identifiant.
    pub(crate) fn send_error(&self, id: CallbackId, message: String) {
        let _ = self.tx.send(PluginResult {
            id,
            payload: Payload::Error(message),
            keep_callback: false,
        });
    }
}
