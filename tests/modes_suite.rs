use spectral_viz::canvas::PixelCanvas;
use spectral_viz::modes::{
    self, GatePhase, ModeState, CHEVRON_COUNT, GLYPH_COUNT, RAIN_MUTATION_CHANCE,
};
use spectral_viz::spectrum::{synthetic_frame, SpectrumProcessor};
use spectral_viz::{
    ColorScheme, DrawSurface, EngineContext, EngineError, ModeKind, PerformancePreset,
    PerformanceProfile, ProfileOverrides, SmoothedSpectrum,
};

const DT: f32 = 1.0 / 22.0;

fn flat_spectrum(bars: usize, v: f32) -> SmoothedSpectrum {
    let mut s = SmoothedSpectrum::new(bars);
    s.current.fill(v);
    s.peak.fill(v);
    s.previous.fill(v);
    s
}

fn context_for(w: usize, h: usize, spectrum: &SmoothedSpectrum) -> EngineContext {
    let mut ctx = EngineContext::new(w, h, PerformanceProfile::default(), ColorScheme::Spectrum);
    ctx.absorb(spectrum);
    ctx
}

fn step(state: &mut ModeState, spectrum: &SmoothedSpectrum, ctx: &mut EngineContext, dt: f32) {
    ctx.t += dt;
    ctx.phase += dt;
    ctx.dt = dt;
    modes::advance(state, spectrum, ctx, dt);
}

// ── Catalogue ───────────────────────────────────────────────────────────────

#[test]
fn catalogue_has_twenty_distinct_modes() {
    let all = ModeKind::all();
    assert_eq!(all.len(), ModeKind::COUNT);
    for (i, m) in all.iter().enumerate() {
        assert_eq!(m.index(), i);
        assert_eq!(ModeKind::from_index(i), Some(*m));
        assert_eq!(m.next().prev(), *m);
    }
    assert_eq!(ModeKind::from_index(ModeKind::COUNT), None);
    assert_eq!(ModeKind::Plasma2D.next(), ModeKind::Bars);
    let generative: Vec<_> = all.iter().filter(|m| m.is_generative()).collect();
    assert_eq!(generative, vec![&ModeKind::Plasma3D, &ModeKind::Plasma2D]);
}

#[test]
fn mode_names_parse_by_label_and_alias() {
    let cases = [
        ("bars", ModeKind::Bars),
        ("Wave Grid", ModeKind::WaveGrid),
        ("wave-grid", ModeKind::WaveGrid),
        ("CHARACTER_RAIN", ModeKind::CharacterRain),
        ("matrix", ModeKind::CharacterRain),
        ("Stargate", ModeKind::GateDial),
        ("orbit", ModeKind::OrbitScene),
        ("vu", ModeKind::VuMeter),
        ("Plasma 3D", ModeKind::Plasma3D),
        ("tunnel", ModeKind::Plasma3D),
        ("plasma", ModeKind::Plasma2D),
        ("spectrogram", ModeKind::Waterfall),
    ];
    for (name, want) in cases {
        assert_eq!(name.parse::<ModeKind>().unwrap(), want, "parsing {name:?}");
    }
    for label in ModeKind::all().map(|m| m.label()) {
        assert!(label.parse::<ModeKind>().is_ok(), "label {label:?} must round-trip");
    }
    assert!(matches!("disco".parse::<ModeKind>(), Err(EngineError::UnknownMode(_))));
    assert!(matches!("  ".parse::<ModeKind>(), Err(EngineError::UnknownMode(_))));
}

// ── Every mode ──────────────────────────────────────────────────────────────

#[test]
fn every_mode_draws_finite_frames() {
    let mut processor = SpectrumProcessor::new(64, 1.0, true);
    for kind in ModeKind::all() {
        let mut canvas = PixelCanvas::new(160, 100);
        let mut ctx =
            EngineContext::new(160, 100, PerformanceProfile::default(), ColorScheme::Neon);
        let mut state = modes::initialize(kind, &ctx);
        assert_eq!(state.kind(), Some(kind));
        for k in 0..60 {
            let frame = synthetic_frame(k as f32 * DT, 64);
            let spectrum = processor.ingest(&frame, 64);
            ctx.absorb(spectrum);
            ctx.t += DT;
            let list = modes::advance(&mut state, spectrum, &ctx, DT);
            assert!(!list.is_empty(), "{} drew nothing", kind.label());
            canvas
                .execute_all(&list)
                .unwrap_or_else(|e| panic!("{} tick {k}: {e}", kind.label()));
        }
    }
}

#[test]
fn every_mode_survives_silence_and_zero_dt() {
    let silent = flat_spectrum(32, 0.0);
    for kind in ModeKind::all() {
        let mut canvas = PixelCanvas::new(64, 40);
        let mut ctx = context_for(64, 40, &silent);
        let mut state = modes::initialize(kind, &ctx);
        for dt in [0.0, DT, 0.0, 1.0] {
            step(&mut state, &silent, &mut ctx, dt);
            let list = modes::advance(&mut state, &silent, &ctx, dt);
            canvas.execute_all(&list).expect("finite draw list");
        }
    }
}

#[test]
fn dormant_state_still_draws() {
    let spectrum = flat_spectrum(32, 0.2);
    let ctx = context_for(64, 40, &spectrum);
    let mut state = ModeState::Dormant;
    assert_eq!(state.kind(), None);
    let list = modes::advance(&mut state, &spectrum, &ctx, DT);
    assert!(!list.is_empty());
}

// ── Gate dial ───────────────────────────────────────────────────────────────

#[test]
fn gate_address_is_seven_distinct_glyphs() {
    let ctx = context_for(200, 200, &flat_spectrum(64, 0.0));
    let state = modes::initialize(ModeKind::GateDial, &ctx);
    let gate = state.gate_dial().expect("gate state");
    let addr = gate.address();
    assert_eq!(addr.len(), CHEVRON_COUNT as usize);
    assert!(addr.iter().all(|&g| g < GLYPH_COUNT));
    let mut sorted = addr.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(sorted.len(), addr.len());
    assert_eq!(gate.phase(), GatePhase::Dialing);
    assert_eq!(gate.locks(), 0);
}

#[test]
fn gate_dials_seven_chevrons_then_opens_wormhole() {
    let loud = flat_spectrum(64, 0.9);
    let mut ctx = context_for(200, 200, &loud);
    let mut state = modes::initialize(ModeKind::GateDial, &ctx);

    let mut locks = 0u32;
    let mut direction = state.gate_dial().expect("gate").direction();
    let mut ticks = 0;
    while !state.gate_dial().expect("gate").is_wormhole_open() {
        step(&mut state, &loud, &mut ctx, 0.05);
        ticks += 1;
        assert!(ticks < 3000, "gate never opened");
        let gate = state.gate_dial().expect("gate");
        assert!(gate.locks() == locks || gate.locks() == locks + 1);
        if gate.locks() == locks + 1 {
            assert_eq!(gate.direction(), -direction, "direction flips on each lock");
            direction = gate.direction();
            locks += 1;
        }
    }
    assert_eq!(locks, CHEVRON_COUNT);

    for _ in 0..500 {
        step(&mut state, &loud, &mut ctx, 0.05);
        let gate = state.gate_dial().expect("gate");
        assert_eq!(gate.locks(), CHEVRON_COUNT);
        assert_eq!(gate.phase(), GatePhase::WormholeActive);
    }
}

#[test]
fn gate_ring_holds_still_without_energy() {
    let silent = flat_spectrum(64, 0.0);
    let mut ctx = context_for(200, 200, &silent);
    let mut state = modes::initialize(ModeKind::GateDial, &ctx);
    let start = state.gate_dial().expect("gate").ring_deg();
    for _ in 0..200 {
        step(&mut state, &silent, &mut ctx, 0.05);
        assert_eq!(state.gate_dial().expect("gate").ring_deg(), start);
    }
    let gate = state.gate_dial().expect("gate");
    assert_eq!(gate.locks(), 0);
    assert_eq!(gate.phase(), GatePhase::Dialing);
}

#[test]
fn gate_never_locks_in_silence_whatever_the_start_angle() {
    let silent = flat_spectrum(64, 0.0);
    let mut ctx = context_for(200, 200, &silent);
    // Enough activations that some start within the lock tolerance of the
    // first address glyph.
    for _ in 0..2000 {
        let mut state = modes::initialize(ModeKind::GateDial, &ctx);
        for _ in 0..40 {
            step(&mut state, &silent, &mut ctx, 0.05);
        }
        let gate = state.gate_dial().expect("gate");
        assert_eq!(gate.phase(), GatePhase::Dialing, "ring started at {}", gate.ring_deg());
        assert_eq!(gate.locks(), 0);
    }
}

#[test]
fn reinitializing_the_gate_starts_over() {
    let loud = flat_spectrum(64, 0.9);
    let mut ctx = context_for(200, 200, &loud);
    let mut state = modes::initialize(ModeKind::GateDial, &ctx);
    for _ in 0..400 {
        step(&mut state, &loud, &mut ctx, 0.05);
    }
    assert!(state.gate_dial().expect("gate").locks() > 0);
    state = modes::initialize(ModeKind::GateDial, &ctx);
    let gate = state.gate_dial().expect("gate");
    assert_eq!(gate.locks(), 0);
    assert_eq!(gate.phase(), GatePhase::Dialing);
}

// ── Character rain ──────────────────────────────────────────────────────────

#[test]
fn rain_trail_fades_from_the_head() {
    let ctx = context_for(160, 100, &flat_spectrum(64, 0.0));
    let state = modes::initialize(ModeKind::CharacterRain, &ctx);
    let rain = state.character_rain().expect("rain state");
    assert!(!rain.columns().is_empty());
    for col in rain.columns() {
        let len = col.trail_len();
        assert!(len >= 6);
        assert_eq!(col.trail_level(0), 1.0);
        for i in 1..len {
            assert!(col.trail_level(i) < col.trail_level(i - 1));
            let want = (1.0 - i as f32 / len as f32).powf(0.6);
            assert!((col.trail_level(i) - want).abs() < 1e-6);
        }
    }
}

#[test]
fn rain_columns_fall_and_respawn_above() {
    let spectrum = flat_spectrum(64, 0.3);
    let mut ctx = context_for(160, 100, &spectrum);
    let mut state = modes::initialize(ModeKind::CharacterRain, &ctx);
    let rows = state.character_rain().expect("rain").rows() as f32;
    for _ in 0..300 {
        let before = state.character_rain().expect("rain").columns().to_vec();
        step(&mut state, &spectrum, &mut ctx, DT);
        let after = state.character_rain().expect("rain").columns();
        assert_eq!(before.len(), after.len());
        for (old, new) in before.iter().zip(after) {
            if new.head_y < old.head_y {
                // One tick moves a head by less than two cells here.
                assert!(old.head_y + 2.0 - old.trail_len() as f32 > rows, "respawned early");
                assert!(new.head_y <= 0.0, "respawn must start above the screen");
            }
        }
    }
}

#[test]
fn rain_glyphs_mutate_at_a_low_rate() {
    let spectrum = flat_spectrum(64, 0.0);
    let mut ctx = context_for(320, 200, &spectrum);
    let mut state = modes::initialize(ModeKind::CharacterRain, &ctx);
    let (mut seen, mut changed) = (0usize, 0usize);
    for _ in 0..200 {
        let before = state.character_rain().expect("rain").columns().to_vec();
        step(&mut state, &spectrum, &mut ctx, DT);
        let after = state.character_rain().expect("rain").columns();
        for (old, new) in before.iter().zip(after) {
            if new.head_y < old.head_y {
                continue;
            }
            seen += old.glyphs.len();
            changed += old.glyphs.iter().zip(&new.glyphs).filter(|(a, b)| a != b).count();
        }
    }
    let rate = changed as f32 / seen as f32;
    assert!(
        rate > RAIN_MUTATION_CHANCE * 0.5 && rate < RAIN_MUTATION_CHANCE * 1.6,
        "mutation rate {rate}"
    );
}

// ── Particles, stars, orbits ────────────────────────────────────────────────

#[test]
fn particle_field_fills_profile_budget_and_wraps() {
    let spectrum = flat_spectrum(64, 0.8);
    let mut ctx = context_for(160, 100, &spectrum);
    let mut state = modes::initialize(ModeKind::Particles, &ctx);
    assert_eq!(state.particles().expect("particles").len(), ctx.profile.max_particles);
    for _ in 0..200 {
        step(&mut state, &spectrum, &mut ctx, DT);
    }
    let field = state.particles().expect("particles");
    assert!(field
        .particles()
        .iter()
        .all(|p| (0.0..=1.0).contains(&p.x) && (0.0..=1.0).contains(&p.y)));
}

#[test]
fn profile_change_rebalances_entity_pools() {
    let spectrum = flat_spectrum(64, 0.3);
    let mut ctx = context_for(160, 100, &spectrum);
    let low = PerformanceProfile::derive(PerformancePreset::Low, &ProfileOverrides::default());
    let ultra = PerformanceProfile::derive(PerformancePreset::Ultra, &ProfileOverrides::default());

    let mut particles = modes::initialize(ModeKind::Particles, &ctx);
    particles.rebalance(&low);
    assert_eq!(particles.particles().expect("particles").len(), low.max_particles);
    particles.rebalance(&ultra);
    assert_eq!(particles.particles().expect("particles").len(), ultra.max_particles);

    let mut stars = modes::initialize(ModeKind::Starfield, &ctx);
    assert_eq!(stars.starfield().expect("stars").len(), ctx.profile.max_stars);
    ctx.profile = low;
    step(&mut stars, &spectrum, &mut ctx, DT);
    assert_eq!(stars.starfield().expect("stars").len(), low.max_stars);
}

#[test]
fn stars_stay_in_front_of_the_camera() {
    let spectrum = flat_spectrum(64, 1.0);
    let mut ctx = context_for(160, 100, &spectrum);
    let mut state = modes::initialize(ModeKind::Starfield, &ctx);
    for _ in 0..300 {
        step(&mut state, &spectrum, &mut ctx, DT);
        let field = state.starfield().expect("stars");
        assert!(field.stars().iter().all(|s| s.z > 0.0 && s.z <= 1.0));
    }
}

#[test]
fn orbits_follow_keplers_third_law() {
    let ctx = context_for(160, 100, &flat_spectrum(64, 0.0));
    let state = modes::initialize(ModeKind::OrbitScene, &ctx);
    let mut bodies = state.orbit_scene().expect("orbit").bodies().to_vec();
    assert!(bodies.len() >= 2);
    bodies.sort_by(|a, b| a.semi_major.total_cmp(&b.semi_major));
    for pair in bodies.windows(2) {
        let (inner, outer) = (&pair[0], &pair[1]);
        assert!(inner.mean_motion() >= outer.mean_motion());
        let want = (inner.semi_major / outer.semi_major).powf(-1.5);
        let got = inner.mean_motion() / outer.mean_motion();
        assert!((got - want).abs() / want < 1e-3, "ratio {got} vs {want}");
    }
}
