use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;

use magnetometrie::cli::Cli;
use magnetometrie::{Bridge, CallbackId, Config, Magnetometer, MotionService, Payload, Watcher};

#[cfg(unix)]
use tokio::signal::unix::SignalKind;
use tokio::signal::{self};

#[cfg(all(feature = "fake-sensors", not(feature = "real-sensors")))]
use magnetometrie::sensors::mag::FakeMagnetometer;
#[cfg(feature = "real-sensors")]
use magnetometrie::sensors::mag::I2cMagnetometer;

#[tokio::main]
async fn main() {
    let args = Cli::parse();
    let token = CancellationToken::new();

    let mut config = Config::new();
    config.sample_interval = args.interval;

    // Service de la plateforme (réel ou synthétique selon la compilation)
    #[cfg(feature = "real-sensors")]
    let service: Arc<dyn MotionService> = Arc::new(I2cMagnetometer::new(config));

    #[cfg(all(feature = "fake-sensors", not(feature = "real-sensors")))]
    let service: Arc<dyn MotionService> = Arc::new(FakeMagnetometer::new(config));

    // Lecture unique via la couche d'écoute
    if args.once {
        let mut watcher = Watcher::new(service, config, token.clone());

        match watcher.get_current_reading().await {
            Ok(reading) => println!("[MAG] {}", reading),
            Err(e) => eprintln!("[MAG] ERREUR: {}", e),
        }

        token.cancel();
        return;
    }

    // Session de streaming
    let (bridge, mut results) = Bridge::new();
    let mut plugin = Magnetometer::new(service, bridge, token.child_token());
    plugin.start(CallbackId::new());

    {
        let token = token.child_token();
        tokio::spawn(async move {
            while !token.is_cancelled() {
                match results.recv().await {
                    Some(result) => match result.payload {
                        Payload::Sample(reading) => println!("[MAG] {}", reading),
                        Payload::Error(e) => {
                            eprintln!("[MAG] ERREUR: {}", e);
                            break;
                        }
                    },
                    None => break,
                }
            }
        });
    }

    #[cfg(unix)]
    {
        let mut test = tokio::signal::unix::signal(SignalKind::interrupt()).unwrap();
        tokio::select! {
            _ = test.recv() => {
                println!("Signal d'interruption reçu");
                token.cancel();
            },
            _ = signal::ctrl_c() => {
                println!("Signal de contrôle C reçu");
                token.cancel();
            },
        }
    }

    #[cfg(not(unix))]
    {
        tokio::select! {
            _ = signal::ctrl_c() => {
                println!("Signal de contrôle C reçu");
                token.cancel();
            },
        }
    }

    plugin.stop();
}
