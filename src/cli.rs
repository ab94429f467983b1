use clap::Parser;

#[derive(Debug, Parser, Clone)]
pub struct Cli {
    /// Période d'échantillonnage du capteur (ms)
    #[arg(long, default_value_t = 100)]
    pub interval: u64,

    /// Une seule lecture, puis quitte
    #[arg(long)]
    pub once: bool,
}
