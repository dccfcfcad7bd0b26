use clap::Parser;
use spectral_viz::config::{Config, FeedSource, RendererMode};
use spectral_viz::{ColorScheme, Engine, ModeKind, PerformancePreset};

fn parse(args: &[&str]) -> Config {
    let mut argv = vec!["spectral-viz"];
    argv.extend_from_slice(args);
    Config::try_parse_from(argv).expect("arguments should parse")
}

#[test]
fn defaults_match_the_engine_defaults() {
    let cfg = parse(&[]);
    assert_eq!(cfg.mode, ModeKind::Bars);
    assert_eq!(cfg.preset, PerformancePreset::Medium);
    assert_eq!(cfg.scheme, ColorScheme::Spectrum);
    assert_eq!(cfg.renderer, RendererMode::HalfBlock);
    assert_eq!(cfg.source, FeedSource::Synthetic);
    assert_eq!(cfg.density, 64);
    assert_eq!(cfg.sensitivity, 1.0);
    assert!(cfg.log_mapping);
    assert!(!cfg.adaptive);
    assert_eq!(cfg.overrides(), Default::default());
}

#[test]
fn mode_flags_accept_names_and_aliases() {
    assert_eq!(parse(&["--mode", "gate-dial"]).mode, ModeKind::GateDial);
    assert_eq!(parse(&["--mode", "stargate"]).mode, ModeKind::GateDial);
    assert_eq!(parse(&["--mode", "matrix"]).mode, ModeKind::CharacterRain);
    assert_eq!(parse(&["--mode", "plasma-3d"]).mode, ModeKind::Plasma3D);
    assert_eq!(parse(&["--mode", "plasma"]).mode, ModeKind::Plasma2D);
    assert!(Config::try_parse_from(["spectral-viz", "--mode", "karaoke"]).is_err());
}

#[test]
fn renderer_and_source_aliases() {
    let cfg = parse(&["--renderer", "ascii", "--source", "none"]);
    assert_eq!(cfg.renderer, RendererMode::Ascii);
    assert_eq!(cfg.renderer.cell_pixels(), (1, 1));
    assert_eq!(cfg.source, FeedSource::Idle);
    assert_eq!(parse(&["--renderer", "hb"]).renderer.cell_pixels(), (1, 2));
}

#[test]
fn numeric_overrides_flow_into_the_engine() {
    let cfg = parse(&[
        "--preset", "low", "--fps", "48", "--bars", "96", "--memory-mb", "70", "--density", "80",
        "--log-mapping", "false",
    ]);
    let engine = Engine::new(cfg.to_engine_config(120, 80));
    assert_eq!(engine.preset(), PerformancePreset::Low);
    assert_eq!(engine.profile().target_tick_rate_hz, 48);
    assert_eq!(engine.profile().max_bars, 96);
    assert_eq!(engine.profile().memory_budget_mb(), 70);
    assert_eq!(engine.bar_count(), 80);
    assert!(!engine.processor().log_mapping());
    assert_eq!(engine.context().width, 120.0);
}
