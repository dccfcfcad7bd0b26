use crate::error::Result;
use crate::spectrum::SpectrumFrame;
use ringbuf::traits::{Consumer as _, Producer as _, Split as _};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Frames the ring holds before newer ones spill.
pub const FEED_CAPACITY: usize = 16;

/// A feed older than this counts as "no audio flowing".
pub const STALE_AFTER_MS: f32 = 500.0;

/// Frames carry the order they were accepted in, so a frame parked while the
/// ring was full can be compared against what the ring still holds.
type Sequenced = (u64, SpectrumFrame);

struct FeedShared {
    /// Newest frame that found the ring full.
    spill: Mutex<Option<Sequenced>>,
    playing: AtomicBool,
    updated_ms: AtomicU64,
    delivered: AtomicU64,
    overflowed: AtomicU64,
}

/// Producer half handed to the audio service. Cheap to clone, callable from
/// any thread.
#[derive(Clone)]
pub struct SpectrumSender {
    prod: Arc<Mutex<(u64, HeapProd<Sequenced>)>>,
    shared: Arc<FeedShared>,
}

/// Consumer half owned by the engine; drained only on the tick context.
pub struct SpectrumReceiver {
    cons: HeapCons<Sequenced>,
    shared: Arc<FeedShared>,
}

pub fn spectrum_feed() -> (SpectrumSender, SpectrumReceiver) {
    let rb = HeapRb::<Sequenced>::new(FEED_CAPACITY);
    let (prod, cons) = rb.split();
    let shared = Arc::new(FeedShared {
        spill: Mutex::new(None),
        playing: AtomicBool::new(false),
        updated_ms: AtomicU64::new(0),
        delivered: AtomicU64::new(0),
        overflowed: AtomicU64::new(0),
    });
    (
        SpectrumSender {
            prod: Arc::new(Mutex::new((0, prod))),
            shared: Arc::clone(&shared),
        },
        SpectrumReceiver { cons, shared },
    )
}

impl SpectrumSender {
    /// Validates and queues one frame. When the ring is full the frame
    /// replaces the spill slot instead, so the newest frame always survives.
    pub fn on_spectrum_update(&self, bands: &[f32]) -> Result<()> {
        let frame = SpectrumFrame::new(bands)?;
        // A sender that panicked mid-push leaves the ring itself intact.
        let mut guard = self.prod.lock().unwrap_or_else(PoisonError::into_inner);
        let (seq, prod) = &mut *guard;
        *seq += 1;
        if let Err(frame) = prod.try_push((*seq, frame)) {
            self.shared.overflowed.fetch_add(1, Ordering::Relaxed);
            *self.shared.spill.lock().unwrap_or_else(PoisonError::into_inner) = Some(frame);
        }
        self.shared.delivered.fetch_add(1, Ordering::Relaxed);
        self.shared.updated_ms.store(now_ms(), Ordering::Relaxed);
        Ok(())
    }

    pub fn on_playback_state_changed(&self, is_playing: bool) {
        self.shared.playing.store(is_playing, Ordering::Relaxed);
    }

    pub fn overflowed(&self) -> u64 {
        self.shared.overflowed.load(Ordering::Relaxed)
    }
}

impl SpectrumReceiver {
    /// Drains everything queued and returns the newest frame, if any.
    pub fn drain_latest(&mut self) -> Option<SpectrumFrame> {
        let mut latest: Option<Sequenced> = None;
        while let Some(f) = self.cons.try_pop() {
            latest = Some(f);
        }
        let spilled = self
            .shared
            .spill
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match (latest, spilled) {
            (Some(a), Some(b)) => Some(if b.0 > a.0 { b.1 } else { a.1 }),
            (a, b) => a.or(b).map(|(_, f)| f),
        }
    }

    pub fn is_playing(&self) -> bool {
        self.shared.playing.load(Ordering::Relaxed)
    }

    pub fn delivered(&self) -> u64 {
        self.shared.delivered.load(Ordering::Relaxed)
    }

    /// Milliseconds since the last delivered frame; `None` before the first.
    pub fn age_ms(&self) -> Option<f32> {
        let t = self.shared.updated_ms.load(Ordering::Relaxed);
        if t == 0 {
            return None;
        }
        Some(now_ms().saturating_sub(t) as f32)
    }

    /// True when the audio service is playing and delivered recently.
    pub fn is_flowing(&self) -> bool {
        self.is_playing() && self.age_ms().is_some_and(|age| age <= STALE_AFTER_MS)
    }
}

/// Stand-in audio service: a background thread that plays a 120 BPM
/// kick/snare/hat pattern into a [`SpectrumSender`] until dropped.
pub struct DemoSource {
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl DemoSource {
    pub fn spawn(sender: SpectrumSender, bands: usize, rate_hz: u32) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_for_thread = Arc::clone(&stop);
        let period = Duration::from_secs_f32(1.0 / rate_hz.clamp(1, 240) as f32);
        let handle = thread::spawn(move || {
            let start = Instant::now();
            sender.on_playback_state_changed(true);
            while !stop_for_thread.load(Ordering::Relaxed) {
                let t = start.elapsed().as_secs_f32();
                if let Err(err) = sender.on_spectrum_update(&demo_bands(t, bands)) {
                    tracing::warn!(%err, "demo frame rejected");
                    break;
                }
                thread::sleep(period);
            }
            sender.on_playback_state_changed(false);
        });
        Self {
            stop,
            handle: Some(handle),
        }
    }
}

impl Drop for DemoSource {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
    }
}

/// One frame of the demo pattern at `t` seconds.
pub fn demo_bands(t: f32, n: usize) -> Vec<f32> {
    let beat = t * 2.0;
    let phase = beat.fract();
    let bar_pos = (beat as u32) % 4;
    let kick = (-phase * 9.0).exp();
    let snare = if bar_pos % 2 == 1 { (-phase * 12.0).exp() } else { 0.0 };
    let hat = (-((beat * 2.0).fract()) * 20.0).exp();
    let pad = 0.5 + 0.5 * (t * 0.23).sin();
    (0..n)
        .map(|i| {
            let x = i as f32 / n.max(1) as f32;
            let low = kick * (1.0 - x * 6.0).max(0.0);
            let mid = snare * (-((x - 0.35) * 6.0).powi(2)).exp() * 0.8;
            let high = hat * ((x - 0.6) * 2.5).clamp(0.0, 1.0) * 0.6;
            let bed = 0.08 + 0.12 * pad * (1.0 - x) + 0.03 * (t * 3.1 + x * 17.0).sin();
            (low + mid + high + bed).clamp(0.0, 1.0)
        })
        .collect()
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_millis(0))
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poisoned_producer_lock_still_delivers() {
        let (tx, mut rx) = spectrum_feed();
        let prod = Arc::clone(&tx.prod);
        let _ = thread::spawn(move || {
            let _held = prod.lock().unwrap();
            panic!("sender died mid-push");
        })
        .join();
        assert!(tx.prod.is_poisoned());

        tx.on_spectrum_update(&[0.7; 16]).unwrap();
        let frame = rx.drain_latest().expect("frame survives the poisoned lock");
        assert!((frame.bands()[0] - 0.7).abs() < 1e-6);
    }
}
