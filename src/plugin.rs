use std::sync::{Arc, Mutex};

use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::bridge::{Bridge, CallbackId, Command};
use crate::sensors::mag::Reading;
use crate::sensors::MotionService;

/// Etat partagé d'une session de streaming. Le verrou couvre le drapeau
/// d'activité et l'identifiant courant : après `close`, aucune livraison
/// ne peut plus passer.
struct Session {
    token: CancellationToken,
    inner: Mutex<SessionInner>,
}

struct SessionInner {
    active: bool,
    callback: CallbackId,
}

impl Session {
    fn new(callback: CallbackId, token: CancellationToken) -> Arc<Self> {
        Arc::new(Session {
            token,
            inner: Mutex::new(SessionInner {
                active: true,
                callback,
            }),
        })
    }

    fn is_active(&self) -> bool {
        self.inner.lock().unwrap().active
    }

    /// Ré-associe la session à un nouvel identifiant de requête.
    fn rebind(&self, callback: CallbackId) {
        self.inner.lock().unwrap().callback = callback;
    }

    /// Livre un échantillon. Retourne false si la session est close.
    fn deliver(&self, bridge: &Bridge, reading: Reading) -> bool {
        let inner = self.inner.lock().unwrap();
        if !inner.active {
            return false;
        }

        bridge.send_sample(inner.callback, reading);
        true
    }

    /// Signale une panne du service, au plus une fois, puis ferme la session.
    fn fail(&self, bridge: &Bridge, message: String) {
        let mut inner = self.inner.lock().unwrap();
        if inner.active {
            inner.active = false;
            bridge.send_error(inner.callback, message);
        }
    }

    /// Ferme la session. Plus aucune livraison après le retour.
    fn close(&self) {
        self.inner.lock().unwrap().active = false;
        self.token.cancel();
    }
}

/// Le plugin magnétomètre : un drapeau de marche, un identifiant de rappel
/// et le pont vers l'hôte. Au plus une session de streaming à la fois.
pub struct Magnetometer {
    service: Arc<dyn MotionService>,
    bridge: Bridge,
    token: CancellationToken,
    session: Option<Arc<Session>>,
}

impl Magnetometer {
    pub fn new(
        service: Arc<dyn MotionService>,
        bridge: Bridge,
        token: CancellationToken,
    ) -> Self {
        Magnetometer {
            service,
            bridge,
            token,
            session: None,
        }
    }

    /// Dispatch façon pont hôte. L'identifiant de la commande `stop` ne sert
    /// qu'à l'acquittement côté hôte, il n'est pas retenu.
    pub fn execute(&mut self, command: Command, id: CallbackId) {
        match command {
            Command::Start => self.start(id),
            Command::Stop => self.stop(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.is_active())
    }

    /// Démarre le streaming vers `id`. Si une session est déjà active, elle
    /// est ré-associée à `id` sans créer de second abonnement.
    pub fn start(&mut self, id: CallbackId) {
        if let Some(session) = &self.session {
            if session.is_active() {
                session.rebind(id);
                return;
            }
        }

        let token = self.token.child_token();
        let mut stream = match self.service.magnetometer_updates(token.clone()) {
            Ok(stream) => stream,
            Err(e) => {
                println!("[MAG] Capteur indisponible: {}", e);
                self.bridge.send_error(id, e.to_string());
                return;
            }
        };

        let session = Session::new(id, token);
        let bridge = self.bridge.clone();
        let task_session = session.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = task_session.token.cancelled() => break,
                    item = stream.next() => match item {
                        Some(Ok(reading)) => {
                            if !task_session.deliver(&bridge, reading) {
                                break;
                            }
                        }
                        Some(Err(e)) => {
                            task_session.fail(&bridge, e.to_string());
                            break;
                        }
                        None => break,
                    },
                }
            }
        });

        self.session = Some(session);
    }

    /// Arrête le streaming et oublie l'identifiant de rappel. Sans effet si
    /// déjà arrêté.
    pub fn stop(&mut self) {
        if let Some(session) = self.session.take() {
            session.close();
        }
    }
}
