use std::pin::Pin;

use futures::Stream;
use tokio_util::sync::CancellationToken;

pub mod mag;

use self::mag::Reading;

/// Flux d'échantillons d'une session. Se termine quand le jeton est annulé.
pub type ReadingStream = Pin<Box<dyn Stream<Item = anyhow::Result<Reading>> + Send>>;

/// Service de détection de mouvement de la plateforme, vu comme une boîte
/// noire : s'abonner rend un flux d'échantillons, annuler le jeton désabonne.
pub trait MotionService: Send + Sync {
    /// S'abonne aux échantillons du champ magnétique. Une erreur signifie
    /// que le capteur est indisponible.
    fn magnetometer_updates(&self, token: CancellationToken) -> anyhow::Result<ReadingStream>;
}
