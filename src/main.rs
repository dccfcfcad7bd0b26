use anyhow::Result;
use clap::Parser;
use spectral_viz::modes::ModeKind;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .try_init();

    let cfg = spectral_viz::config::Config::parse();
    if cfg.list_modes {
        for (i, mode) in ModeKind::all().iter().enumerate() {
            println!("{:>2}  {}", i, mode.label());
        }
        return Ok(());
    }

    spectral_viz::app::run(cfg)
}
