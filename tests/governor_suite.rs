use spectral_viz::governor::{rebalance, LoadTuner, MAX_FPS, MIN_FPS};
use spectral_viz::scheduler::TickScheduler;
use spectral_viz::{EngineError, PerformancePreset, PerformanceProfile, ProfileOverrides};
use std::time::{Duration, Instant};

fn profile(preset: PerformancePreset) -> PerformanceProfile {
    PerformanceProfile::derive(preset, &ProfileOverrides::default())
}

// ── Presets ─────────────────────────────────────────────────────────────────

#[test]
fn presets_map_to_documented_budgets() {
    let low = profile(PerformancePreset::Low);
    assert_eq!(low.target_tick_rate_hz, 15);
    assert_eq!(low.max_bars, 32);
    assert_eq!(low.memory_budget_mb(), 20);
    assert_eq!(low.max_particles, 40);
    assert_eq!(low.max_stars, 160);

    let medium = PerformanceProfile::default();
    assert_eq!(medium.target_tick_rate_hz, 22);
    assert_eq!(medium.max_bars, 64);
    assert_eq!(medium.memory_budget_mb(), 40);
    assert_eq!(medium.max_particles, 80);
    assert_eq!(medium.max_stars, 320);

    let high = profile(PerformancePreset::High);
    assert_eq!((high.target_tick_rate_hz, high.max_bars), (30, 96));

    let ultra = profile(PerformancePreset::Ultra);
    assert_eq!(ultra.target_tick_rate_hz, 60);
    assert_eq!(ultra.max_bars, 128);
    assert_eq!(ultra.memory_budget_mb(), 100);
    assert_eq!(ultra.max_particles, 200);
}

#[test]
fn presets_are_ordered_by_cost() {
    let all = PerformancePreset::all();
    for pair in all.windows(2) {
        let (a, b) = (profile(pair[0]), profile(pair[1]));
        assert!(a.target_tick_rate_hz <= b.target_tick_rate_hz);
        assert!(a.max_bars <= b.max_bars);
        assert!(a.max_particles <= b.max_particles);
    }
}

#[test]
fn overrides_win_but_are_clamped() {
    let p = PerformanceProfile::derive(
        PerformancePreset::Low,
        &ProfileOverrides {
            fps: Some(45),
            bars: Some(100),
            memory_mb: Some(50),
        },
    );
    assert_eq!(p.target_tick_rate_hz, 45);
    assert_eq!(p.max_bars, 100);
    assert_eq!(p.memory_budget_mb(), 50);
    assert_eq!(p.max_particles, 100);

    let p = PerformanceProfile::derive(
        PerformancePreset::Medium,
        &ProfileOverrides {
            fps: Some(1),
            bars: Some(2),
            memory_mb: Some(1),
        },
    );
    assert_eq!(p.target_tick_rate_hz, MIN_FPS);
    assert_eq!(p.max_bars, 16);
    assert_eq!(p.memory_budget_mb(), 10);

    let p = PerformanceProfile::derive(
        PerformancePreset::Medium,
        &ProfileOverrides {
            fps: Some(500),
            bars: Some(4096),
            memory_mb: Some(4096),
        },
    );
    assert_eq!(p.target_tick_rate_hz, MAX_FPS);
    assert_eq!(p.max_bars, 128);
    assert_eq!(p.memory_budget_mb(), 100);
}

#[test]
fn preset_names_parse_case_insensitively() {
    assert_eq!("LOW".parse::<PerformancePreset>().unwrap(), PerformancePreset::Low);
    assert_eq!(" ultra ".parse::<PerformancePreset>().unwrap(), PerformancePreset::Ultra);
    assert_eq!("balanced".parse::<PerformancePreset>().unwrap(), PerformancePreset::Medium);
    let err = "turbo".parse::<PerformancePreset>().unwrap_err();
    assert!(matches!(err, EngineError::UnknownPreset(ref s) if s == "turbo"));
}

#[test]
fn preset_steps_saturate() {
    assert_eq!(PerformancePreset::Low.lower(), PerformancePreset::Low);
    assert_eq!(PerformancePreset::Ultra.higher(), PerformancePreset::Ultra);
    assert_eq!(PerformancePreset::Ultra.next(), PerformancePreset::Low);
}

// ── Entity pools ────────────────────────────────────────────────────────────

#[test]
fn rebalance_trims_and_backfills() {
    let mut items: Vec<u32> = (0..10).collect();
    rebalance(&mut items, 4, || 99);
    assert_eq!(items, vec![0, 1, 2, 3]);

    rebalance(&mut items, 7, || 99);
    assert_eq!(items, vec![0, 1, 2, 3, 99, 99, 99]);

    rebalance(&mut items, 0, || 99);
    assert!(items.is_empty());
}

// ── Load tuner ──────────────────────────────────────────────────────────────

#[test]
fn tuner_is_inert_when_not_adaptive() {
    let mut tuner = LoadTuner::new(PerformancePreset::High, false);
    for _ in 0..200 {
        assert_eq!(tuner.update(500.0, 10.0), None);
    }
    assert_eq!(tuner.preset(), PerformancePreset::High);
}

#[test]
fn tuner_steps_down_on_overrun_and_recovers_to_ceiling() {
    let mut tuner = LoadTuner::new(PerformancePreset::Medium, true);
    assert_eq!(tuner.update(50.0, 20.0), Some(PerformancePreset::Low));

    // Cooldown: nothing moves for a while even with lots of headroom.
    for _ in 0..45 {
        assert_eq!(tuner.update(1.0, 20.0), None);
    }
    assert_eq!(tuner.update(1.0, 20.0), Some(PerformancePreset::Medium));

    // Never above the chosen preset.
    for _ in 0..200 {
        assert_eq!(tuner.update(1.0, 20.0), None);
    }
    assert_eq!(tuner.preset(), PerformancePreset::Medium);
}

#[test]
fn disabling_the_tuner_restores_the_chosen_preset() {
    let mut tuner = LoadTuner::new(PerformancePreset::High, true);
    assert_eq!(tuner.update(100.0, 10.0), Some(PerformancePreset::Medium));
    tuner.set_adaptive(false);
    assert_eq!(tuner.preset(), PerformancePreset::High);
}

// ── Tick scheduler ──────────────────────────────────────────────────────────

#[test]
fn scheduler_drops_reentrant_ticks() {
    let mut s = TickScheduler::new(22);
    assert!(s.begin());
    assert!(!s.begin());
    assert!(!s.begin());
    assert_eq!(s.dropped(), 2);
    s.finish();
    assert_eq!(s.completed(), 1);
    assert!(s.begin());
    s.finish();
    assert_eq!(s.completed(), 2);
}

#[test]
fn stopped_scheduler_refuses_ticks() {
    let mut s = TickScheduler::new(22);
    s.stop();
    assert!(!s.is_running());
    assert!(!s.begin());
    assert_eq!(s.poll(Instant::now()), None);
    assert_eq!(s.dropped(), 0);
    s.start();
    assert!(s.begin());
}

#[test]
fn scheduler_paces_by_interval_and_clamps_stalls() {
    let mut s = TickScheduler::new(20);
    let t0 = Instant::now();
    let first = s.poll(t0).expect("first poll ticks");
    assert!((first - 0.05).abs() < 1e-4);
    assert_eq!(s.poll(t0 + Duration::from_millis(10)), None);

    let dt = s.poll(t0 + Duration::from_millis(60)).expect("due");
    assert!((dt - 0.06).abs() < 1e-3);

    let stalled = s.poll(t0 + Duration::from_secs(5)).expect("due");
    assert!((stalled - 0.2).abs() < 1e-4, "stall dt {stalled}");
}

#[test]
fn scheduler_rate_is_clamped() {
    assert!((TickScheduler::new(1000).rate_hz() - MAX_FPS as f32).abs() < 0.01);
    assert!((TickScheduler::new(1).rate_hz() - MIN_FPS as f32).abs() < 0.01);
}
