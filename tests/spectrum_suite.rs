use spectral_viz::spectrum::{
    resample_into, synthetic_frame, MAX_BARS, MAX_SENSITIVITY, MIN_BARS, MIN_SENSITIVITY,
    PEAK_DECAY,
};
use spectral_viz::{EngineError, SmoothedSpectrum, SpectrumFrame, SpectrumProcessor};

fn frame(bands: &[f32]) -> SpectrumFrame {
    SpectrumFrame::new(bands).expect("valid frame")
}

/// 64 bands with the first four (bar 0 of 16 in linear mapping) at `v`.
fn low_band_frame(v: f32) -> SpectrumFrame {
    let mut bands = vec![0.0f32; 64];
    bands[..4].fill(v);
    frame(&bands)
}

fn approx(a: f32, b: f32, eps: f32) -> bool {
    (a - b).abs() <= eps
}

// ── Frames ──────────────────────────────────────────────────────────────────

#[test]
fn frame_rejects_band_counts_outside_range() {
    let err = SpectrumFrame::new(&[0.5; 4]).expect_err("too few bands");
    assert!(matches!(err, EngineError::InvalidSpectrum { len: 4, .. }));
    assert!(SpectrumFrame::new(&[0.5; 129]).is_err());
    assert!(SpectrumFrame::new(&[0.5; 8]).is_ok());
    assert!(SpectrumFrame::new(&[0.5; 128]).is_ok());
}

#[test]
fn frame_sanitizes_values() {
    let mut bands = vec![0.25f32; 8];
    bands[0] = f32::NAN;
    bands[1] = 2.0;
    bands[2] = -1.0;
    bands[3] = f32::INFINITY;
    let f = frame(&bands);
    assert_eq!(&f.bands()[..4], &[0.0, 1.0, 0.0, 0.0]);
    assert_eq!(f.bands()[4], 0.25);
}

#[test]
fn synthetic_frame_stays_in_unit_range() {
    for k in 0..200 {
        let f = synthetic_frame(k as f32 * 0.07, 64);
        assert_eq!(f.len(), 64);
        assert!(f.bands().iter().all(|v| (0.0..=1.0).contains(v)));
        assert!(f.bands().iter().any(|v| *v > 0.05), "idle spectrum should breathe");
    }
}

// ── Resampling ──────────────────────────────────────────────────────────────

#[test]
fn uniform_source_resamples_to_uniform_bars() {
    for &log in &[true, false] {
        for &bars in &[16usize, 32, 64, 100, 128] {
            let mut out = vec![0.0f32; bars];
            resample_into(&[0.5; 64], log, &mut out);
            assert!(
                out.iter().all(|v| approx(*v, 0.5, 1e-6)),
                "log={log} bars={bars}: {out:?}"
            );
        }
    }
}

#[test]
fn log_mapping_gives_low_bands_more_bars() {
    let mut bands = vec![0.0f32; 64];
    bands[..8].fill(1.0);
    let mut linear = vec![0.0f32; 32];
    let mut log = vec![0.0f32; 32];
    resample_into(&bands, false, &mut linear);
    resample_into(&bands, true, &mut log);
    let lit = |v: &[f32]| v.iter().filter(|x| **x > 0.5).count();
    assert!(lit(&log) > lit(&linear), "log={log:?} linear={linear:?}");
}

// ── Envelope ────────────────────────────────────────────────────────────────

#[test]
fn rates_follow_sensitivity() {
    let p = SpectrumProcessor::new(32, 1.0, false);
    let (rise, fall) = p.rates();
    assert!(approx(rise, 0.5, 1e-6));
    assert!(approx(fall, 0.08, 1e-6));

    let p = SpectrumProcessor::new(32, 3.0, false);
    let (rise, fall) = p.rates();
    assert_eq!(rise, 1.0);
    assert!(approx(fall, 0.16, 1e-6));
}

#[test]
fn sensitivity_is_clamped() {
    let mut p = SpectrumProcessor::new(32, 10.0, true);
    assert_eq!(p.sensitivity(), MAX_SENSITIVITY);
    p.set_sensitivity(0.0);
    assert_eq!(p.sensitivity(), MIN_SENSITIVITY);
    p.set_sensitivity(f32::NAN);
    assert_eq!(p.sensitivity(), MIN_SENSITIVITY);
    p.set_sensitivity(1.5);
    assert_eq!(p.sensitivity(), 1.5);
}

#[test]
fn attack_is_monotone_and_peak_tracks_it() {
    let mut p = SpectrumProcessor::new(16, 1.0, false);
    let loud = low_band_frame(1.0);
    let mut last = 0.0f32;
    for _ in 0..12 {
        let st = p.ingest(&loud, 16);
        assert!(st.current[0] > last, "attack must rise every tick");
        assert_eq!(st.peak[0], st.current[0]);
        assert!(st.current[0] <= 1.0);
        last = st.current[0];
    }
    assert!(last > 0.99);
}

#[test]
fn release_is_slower_for_peak_than_for_current() {
    let mut p = SpectrumProcessor::new(16, 1.0, false);
    let loud = low_band_frame(1.0);
    for _ in 0..20 {
        p.ingest(&loud, 16);
    }

    let quiet = low_band_frame(0.0);
    let mut prev_peak = p.state().peak[0];
    let mut prev_cur = p.state().current[0];
    for _ in 0..30 {
        let st = p.ingest(&quiet, 16);
        let (cur, peak) = (st.current[0], st.peak[0]);
        assert!(cur < prev_cur, "current must fall");
        assert!(peak >= cur, "peak {peak} below current {cur}");
        assert!(prev_peak - peak <= PEAK_DECAY + 1e-6, "peak fell too fast");
        assert!(cur >= 0.0 && peak >= 0.0);
        prev_peak = peak;
        prev_cur = cur;
    }
    assert!(p.state().peak[0] - p.state().current[0] > 0.2);
}

#[test]
fn silence_settles_to_exact_zero() {
    let mut p = SpectrumProcessor::new(16, 1.0, false);
    for _ in 0..20 {
        p.ingest(&low_band_frame(1.0), 16);
    }
    for _ in 0..200 {
        p.ingest(&low_band_frame(0.0), 16);
    }
    assert!(p.state().current.iter().all(|v| *v == 0.0));
    assert!(p.state().peak.iter().all(|v| *v == 0.0));
}

#[test]
fn steady_input_converges_to_target() {
    let mut p = SpectrumProcessor::new(32, 1.0, true);
    let f = frame(&[0.5; 64]);
    for _ in 0..60 {
        p.ingest(&f, 32);
    }
    assert!(p.state().current.iter().all(|v| approx(*v, 0.5, 1e-3)));
}

// ── Resizing and resets ─────────────────────────────────────────────────────

#[test]
fn every_bar_count_keeps_vectors_aligned() {
    let mut p = SpectrumProcessor::new(64, 1.0, true);
    for bars in MIN_BARS..=MAX_BARS {
        for k in 0..3 {
            let st = p.ingest(&synthetic_frame(k as f32 * 0.1, 64), bars);
            assert_eq!(st.current.len(), bars);
            assert_eq!(st.peak.len(), bars);
            assert_eq!(st.previous.len(), bars);
            assert!(st.peak.iter().zip(&st.current).all(|(p, c)| p >= c));
        }
        assert_eq!(p.targets().len(), bars);
    }
}

#[test]
fn bar_count_is_clamped() {
    let mut p = SpectrumProcessor::new(4, 1.0, true);
    assert_eq!(p.bar_count(), MIN_BARS);
    p.resize(500);
    assert_eq!(p.bar_count(), MAX_BARS);
}

#[test]
fn resize_to_same_count_keeps_state() {
    let mut p = SpectrumProcessor::new(32, 1.0, true);
    p.ingest(&frame(&[0.8; 64]), 32);
    let before = p.state().clone();
    p.resize(32);
    assert_eq!(p.state(), &before);
    p.resize(48);
    assert!(p.state().current.iter().all(|v| *v == 0.0));
}

#[test]
fn resets_jump_to_targets_or_silence() {
    let mut p = SpectrumProcessor::new(32, 1.0, true);
    p.ingest(&frame(&[0.6; 64]), 32);
    assert!(p.state().current[0] < 0.6);

    p.reset_to_targets();
    assert_eq!(p.state().current, p.targets());
    assert_eq!(p.state().peak, p.targets());

    p.reset_to_zero();
    assert!(p.state().current.iter().all(|v| *v == 0.0));
    assert!(p.state().peak.iter().all(|v| *v == 0.0));
    assert!(p.state().previous.iter().all(|v| *v == 0.0));
}

// ── Band summaries ──────────────────────────────────────────────────────────

#[test]
fn band_summaries_split_the_spectrum() {
    let mut st = SmoothedSpectrum::new(16);
    st.current[..3].fill(0.9);
    assert!(approx(st.bass(), 0.9, 1e-6));
    assert_eq!(st.treble(), 0.0);
    assert!(approx(st.average(), 0.9 * 3.0 / 16.0, 1e-6));
    assert!(approx(st.bass_transient(), 0.9, 1e-6));

    st.previous[..3].fill(1.0);
    assert_eq!(st.bass_transient(), 0.0);
}
