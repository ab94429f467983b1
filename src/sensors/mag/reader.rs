use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Poll, Waker};
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use futures::Stream;
use tokio_util::sync::CancellationToken;

use super::Reading;
use crate::config::Config;
use crate::sensors::{MotionService, ReadingStream};

#[cfg(feature = "fake-sensors")]
use rand::Rng;

#[cfg(feature = "real-sensors")]
use super::hmc8553l::HMC8553L;
#[cfg(feature = "real-sensors")]
use rppal::i2c::I2c;

type Events = Arc<Mutex<VecDeque<anyhow::Result<Reading>>>>;
type SharedWaker = Arc<Mutex<Option<Waker>>>;

/// Heure de capture, en millisecondes depuis l'epoch Unix.
fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Flux d'échantillons alimenté par un thread de lecture.
pub(crate) struct Reader {
    events: Events,
    waker: SharedWaker,
    token: CancellationToken,
}

impl Reader {
    fn new(token: CancellationToken) -> Self {
        Reader {
            events: Arc::new(Mutex::new(VecDeque::with_capacity(16))),
            waker: Arc::new(Mutex::new(None)),
            token,
        }
    }

    /// Dépose un événement et réveille le consommateur.
    fn push(events: &Events, waker: &SharedWaker, event: anyhow::Result<Reading>) {
        events.lock().unwrap().push_back(event);
        wake(waker);
    }
}

fn wake(waker: &SharedWaker) {
    if let Some(waker) = waker.lock().unwrap().take() {
        waker.wake();
    }
}

impl Stream for Reader {
    type Item = anyhow::Result<Reading>;

    fn poll_next(
        self: Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> Poll<Option<Self::Item>> {
        if self.token.is_cancelled() {
            return Poll::Ready(None);
        }

        if let Some(event) = self.events.lock().unwrap().pop_front() {
            return Poll::Ready(Some(event));
        }

        *self.waker.lock().unwrap() = Some(cx.waker().clone());
        Poll::Pending
    }
}

/// Service magnétomètre sur bus I2C (HMC8553L).
#[cfg(feature = "real-sensors")]
pub struct I2cMagnetometer {
    config: Config,
}

#[cfg(feature = "real-sensors")]
impl I2cMagnetometer {
    pub fn new(config: Config) -> Self {
        I2cMagnetometer { config }
    }
}

#[cfg(feature = "real-sensors")]
impl MotionService for I2cMagnetometer {
    fn magnetometer_updates(&self, token: CancellationToken) -> anyhow::Result<ReadingStream> {
        // Prépare le bus et le module avant de rendre le flux : une panne
        // matérielle se signale ici, pas dans le flux.
        let mut i2c = I2c::new()?;
        let mag = HMC8553L::new(&mut i2c)?;

        let reader = Reader::new(token.clone());
        let events = reader.events.clone();
        let waker = reader.waker.clone();
        let interval = Duration::from_millis(self.config.sample_interval);

        println!("[MAG] Démarrage du thread ...");
        thread::spawn(move || {
            while !token.is_cancelled() {
                let event = mag
                    .read_microteslas(&mut i2c)
                    .map(|(x, y, z)| Reading {
                        x,
                        y,
                        z,
                        timestamp: now_millis(),
                    });

                Reader::push(&events, &waker, event);
                thread::sleep(interval);
            }

            // Dernier réveil : le consommateur verra le flux terminé.
            wake(&waker);
            println!("[MAG] Fin du thread.");
        });

        Ok(Box::pin(reader))
    }
}

/// Service magnétomètre synthétique, pour exécuter sans matériel.
#[cfg(feature = "fake-sensors")]
pub struct FakeMagnetometer {
    config: Config,
}

#[cfg(feature = "fake-sensors")]
impl FakeMagnetometer {
    pub fn new(config: Config) -> Self {
        FakeMagnetometer { config }
    }
}

#[cfg(feature = "fake-sensors")]
impl MotionService for FakeMagnetometer {
    fn magnetometer_updates(&self, token: CancellationToken) -> anyhow::Result<ReadingStream> {
        let reader = Reader::new(token.clone());
        let events = reader.events.clone();
        let waker = reader.waker.clone();
        let interval = Duration::from_millis(self.config.sample_interval);

        println!("[MAG] Démarrage du thread [FAKE] ...");
        thread::spawn(move || {
            let mut rng = rand::thread_rng();

            while !token.is_cancelled() {
                // Champ terrestre plausible (± 65 µT par axe)
                let x: f64 = rng.gen_range(-65.0..65.0);
                let y: f64 = rng.gen_range(-65.0..65.0);
                let z: f64 = rng.gen_range(-65.0..65.0);

                Reader::push(
                    &events,
                    &waker,
                    Ok(Reading {
                        x,
                        y,
                        z,
                        timestamp: now_millis(),
                    }),
                );
                thread::sleep(interval);
            }

            wake(&waker);
            println!("[MAG] Fin du thread [FAKE].");
        });

        Ok(Box::pin(reader))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn reader_yields_pushed_events_in_order() {
        let token = CancellationToken::new();
        let mut reader = Reader::new(token.clone());
        let events = reader.events.clone();
        let waker = reader.waker.clone();

        for i in 0..3 {
            Reader::push(
                &events,
                &waker,
                Ok(Reading {
                    x: i as f64,
                    y: 0.0,
                    z: 0.0,
                    timestamp: i,
                }),
            );
        }

        for i in 0..3 {
            let reading = reader.next().await.unwrap().unwrap();
            assert_eq!(reading.timestamp, i);
        }
    }

    #[tokio::test]
    async fn reader_ends_once_cancelled() {
        let token = CancellationToken::new();
        let mut reader = Reader::new(token.clone());

        token.cancel();
        assert!(reader.next().await.is_none());
    }

    #[cfg(feature = "fake-sensors")]
    #[tokio::test]
    async fn fake_service_streams_until_unsubscribed() {
        let service = FakeMagnetometer::new(Config {
            sample_interval: 1,
            ..Config::new()
        });

        let token = CancellationToken::new();
        let mut stream = service.magnetometer_updates(token.clone()).unwrap();

        let reading = stream.next().await.unwrap().unwrap();
        assert!(reading.x.abs() <= 65.0);

        token.cancel();
        while let Some(event) = stream.next().await {
            event.unwrap();
        }
    }
}
