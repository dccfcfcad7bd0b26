use std::time::{Duration, Instant};

use anyhow::Result;
use spectral_viz::canvas::PixelCanvas;
use spectral_viz::feed::demo_bands;
use spectral_viz::{Engine, EngineConfig, ModeKind, PerformancePreset, TickOutcome};
use tracing_subscriber::EnvFilter;

struct Args {
    frames: usize,
    w: usize,
    h: usize,
    preset: PerformancePreset,
    ci_smoke: bool,
    max_ms: f64,
}

fn parse_args() -> Args {
    let mut args = Args {
        frames: 180,
        w: 160,
        h: 88,
        preset: PerformancePreset::Medium,
        ci_smoke: false,
        max_ms: 20.0,
    };

    let argv = std::env::args().skip(1).collect::<Vec<_>>();
    let mut i = 0usize;
    while i < argv.len() {
        let k = argv[i].as_str();
        let v = argv.get(i + 1).map(|s| s.as_str());
        match (k, v) {
            ("--frames", Some(x)) => {
                if let Ok(n) = x.parse::<usize>() {
                    args.frames = n.max(1);
                }
                i += 2;
            }
            ("--w", Some(x)) => {
                if let Ok(n) = x.parse::<usize>() {
                    args.w = n.max(1);
                }
                i += 2;
            }
            ("--h", Some(x)) => {
                if let Ok(n) = x.parse::<usize>() {
                    args.h = n.max(1);
                }
                i += 2;
            }
            ("--preset", Some(x)) => {
                if let Ok(p) = x.parse::<PerformancePreset>() {
                    args.preset = p;
                }
                i += 2;
            }
            ("--max-ms", Some(x)) => {
                if let Ok(v) = x.parse::<f64>() {
                    args.max_ms = v.max(0.1);
                }
                i += 2;
            }
            ("--ci-smoke", _) => {
                args.ci_smoke = true;
                i += 1;
            }
            _ => i += 1,
        }
    }
    args
}

fn engine_for(args: &Args, mode: ModeKind) -> Engine {
    Engine::new(EngineConfig {
        mode,
        preset: args.preset,
        width: args.w,
        height: args.h,
        ..EngineConfig::default()
    })
}

fn bench_modes(args: &Args) -> Result<()> {
    let mut total_time = Duration::ZERO;
    let mut total_frames = 0usize;
    let mut black_modes = Vec::<&'static str>::new();
    let mut slow_modes = Vec::<(&'static str, f64)>::new();
    let mut faulty_modes = Vec::<&'static str>::new();

    println!(
        "Mode benchmark: modes={} frames/mode={} size={}x{} preset={}",
        ModeKind::COUNT,
        args.frames,
        args.w,
        args.h,
        args.preset.label()
    );

    for (idx, mode) in ModeKind::all().into_iter().enumerate() {
        let mut engine = engine_for(args, mode);
        let sender = engine.spectrum_sender();
        sender.on_playback_state_changed(true);
        let mut canvas = PixelCanvas::new(args.w, args.h);
        let dt = 1.0 / engine.profile().target_tick_rate_hz as f32;

        let mut lit = 0usize;
        let mut faults = 0usize;
        let start = Instant::now();
        for f in 0..args.frames {
            sender.on_spectrum_update(&demo_bands(f as f32 * dt, 64))?;
            match engine.tick(dt, &mut canvas) {
                TickOutcome::Diagnostic => faults += 1,
                TickOutcome::Rendered => {}
                other => anyhow::bail!("{}: unexpected tick outcome {:?}", mode.label(), other),
            }
            if canvas
                .pixels()
                .chunks_exact(4)
                .any(|px| px[0] > 24 || px[1] > 24 || px[2] > 24)
            {
                lit += 1;
            }
        }
        let elapsed = start.elapsed();
        total_time += elapsed;
        total_frames += args.frames;
        let ms = elapsed.as_secs_f64() * 1000.0 / args.frames as f64;
        println!(
            "{:>2}. {:<16} {:>8.3} ms/tick  lit={:>3}/{} faults={}",
            idx,
            mode.label(),
            ms,
            lit,
            args.frames,
            faults
        );
        if lit == 0 {
            black_modes.push(mode.label());
        }
        if faults > 0 {
            faulty_modes.push(mode.label());
        }
        if args.ci_smoke && ms > args.max_ms {
            slow_modes.push((mode.label(), ms));
        }
    }

    let avg_ms = total_time.as_secs_f64() * 1000.0 / total_frames.max(1) as f64;
    let fps = if avg_ms > 0.0 { 1000.0 / avg_ms } else { 0.0 };
    println!("Summary: {:>8.3} ms/tick avg  {:>7.2} ticks/s", avg_ms, fps);

    if args.ci_smoke {
        if !black_modes.is_empty() || !slow_modes.is_empty() || !faulty_modes.is_empty() {
            eprintln!("CI smoke: FAIL");
            if !black_modes.is_empty() {
                eprintln!("  black modes: {}", black_modes.join(", "));
            }
            if !faulty_modes.is_empty() {
                eprintln!("  faulting modes: {}", faulty_modes.join(", "));
            }
            for (name, ms) in slow_modes {
                eprintln!("  slow mode: {} ({:.3} ms/tick > {:.3})", name, ms, args.max_ms);
            }
            anyhow::bail!("ci smoke failed");
        }
        println!("CI smoke: PASS (max_ms={:.3})", args.max_ms);
    }
    Ok(())
}

fn bench_transitions(args: &Args) -> Result<()> {
    let mut engine = engine_for(args, ModeKind::Bars);
    let mut canvas = PixelCanvas::new(args.w, args.h);
    let rounds = 5usize;
    let start = Instant::now();
    for _ in 0..rounds {
        for mode in ModeKind::all() {
            engine.set_mode_kind(mode)?;
            engine.tick(1.0 / 22.0, &mut canvas);
        }
    }
    let elapsed = start.elapsed();
    let switches = engine.controller().teardowns();
    println!(
        "Transitions: {} switches in {:.1} ms ({:.3} ms/switch incl. one tick)",
        switches,
        elapsed.as_secs_f64() * 1000.0,
        elapsed.as_secs_f64() * 1000.0 / switches.max(1) as f64
    );
    Ok(())
}

fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .try_init();

    let args = parse_args();
    bench_modes(&args)?;
    bench_transitions(&args)
}
