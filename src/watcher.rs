use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::bridge::{Bridge, CallbackId, Payload};
use crate::config::Config;
use crate::plugin::Magnetometer;
use crate::sensors::mag::Reading;
use crate::sensors::MotionService;

/// Identifiant d'un watcher périodique.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WatchId(Uuid);

impl WatchId {
    fn new() -> Self {
        WatchId(Uuid::new_v4())
    }
}

impl fmt::Display for WatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

type Waiters = Arc<Mutex<Vec<oneshot::Sender<anyhow::Result<Reading>>>>>;

/// Couche d'écoute au dessus du plugin : lectures ponctuelles, watchers
/// périodiques, démarrage et arrêt automatiques du capteur selon le nombre
/// d'auditeurs.
pub struct Watcher {
    plugin: Magnetometer,
    config: Config,
    token: CancellationToken,
    last: Arc<Mutex<Option<Reading>>>,
    waiters: Waiters,
    watches: HashMap<WatchId, CancellationToken>,
}

impl Watcher {
    pub fn new(service: Arc<dyn MotionService>, config: Config, token: CancellationToken) -> Self {
        let (bridge, mut results) = Bridge::new();
        let plugin = Magnetometer::new(service, bridge, token.child_token());

        let last: Arc<Mutex<Option<Reading>>> = Arc::new(Mutex::new(None));
        let waiters: Waiters = Arc::new(Mutex::new(Vec::new()));

        // Tâche de distribution : consomme le pont, garde le dernier
        // échantillon et sert les lectures ponctuelles en attente.
        let task_last = last.clone();
        let task_waiters = waiters.clone();
        let task_token = token.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = task_token.cancelled() => break,
                    result = results.recv() => {
                        let Some(result) = result else { break };
                        match result.payload {
                            Payload::Sample(reading) => {
                                *task_last.lock().unwrap() = Some(reading);
                                for waiter in task_waiters.lock().unwrap().drain(..) {
                                    let _ = waiter.send(Ok(reading));
                                }
                            }
                            Payload::Error(message) => {
                                for waiter in task_waiters.lock().unwrap().drain(..) {
                                    let _ = waiter.send(Err(anyhow!(message.clone())));
                                }
                            }
                        }
                    }
                }
            }
        });

        Watcher {
            plugin,
            config,
            token,
            last,
            waiters,
            watches: HashMap::new(),
        }
    }

    /// Vrai si plus personne n'écoute.
    fn idle(&self) -> bool {
        self.watches.is_empty() && self.waiters.lock().unwrap().is_empty()
    }

    pub fn is_running(&self) -> bool {
        self.plugin.is_running()
    }

    /// Une lecture unique : démarre le capteur si besoin, attend le prochain
    /// échantillon, puis arrête le capteur si plus personne n'écoute.
    pub async fn get_current_reading(&mut self) -> anyhow::Result<Reading> {
        let (tx, rx) = oneshot::channel();
        self.waiters.lock().unwrap().push(tx);

        if !self.plugin.is_running() {
            self.plugin.start(CallbackId::new());
        }

        let result = tokio::select! {
            _ = self.token.cancelled() => Err(anyhow!("Arrêt demandé")),
            outcome = rx => match outcome {
                Ok(result) => result,
                Err(_) => Err(anyhow!("Distribution interrompue")),
            },
        };

        if self.idle() {
            self.plugin.stop();
        }

        result
    }

    /// Livraison périodique du dernier échantillon connu, façon setInterval.
    pub fn watch_readings(
        &mut self,
        interval: Option<Duration>,
    ) -> (WatchId, UnboundedReceiver<Reading>) {
        let interval = interval.unwrap_or(Duration::from_millis(self.config.watch_interval));
        let id = WatchId::new();
        let token = self.token.child_token();

        let (tx, rx) = mpsc::unbounded_channel();
        let task_last = self.last.clone();
        let task_token = token.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = task_token.cancelled() => break,
                    _ = ticker.tick() => {
                        let reading = *task_last.lock().unwrap();
                        if let Some(reading) = reading {
                            if tx.send(reading).is_err() {
                                break;
                            }
                        }
                    }
                }
            }
        });

        self.watches.insert(id, token);

        if !self.plugin.is_running() {
            self.plugin.start(CallbackId::new());
        }

        (id, rx)
    }

    /// Retire un watcher ; arrête le capteur quand le dernier auditeur
    /// disparaît. Sans effet sur un identifiant inconnu.
    pub fn clear_watch(&mut self, id: WatchId) {
        if let Some(token) = self.watches.remove(&id) {
            token.cancel();
        }

        if self.idle() {
            self.plugin.stop();
        }
    }
}
