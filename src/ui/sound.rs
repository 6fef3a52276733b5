/// Sound engine: procedural arcade sound effects via rodio.
///
/// All sounds are generated as in-memory WAV buffers at init time.
/// Playback is fire-and-forget (non-blocking) via rodio's Sink.
///
/// Compile without the "sound" feature to disable audio entirely
/// (the stub SoundEngine does nothing).

use crate::sim::event::GameEvent;

/// One effect per kind of event worth hearing.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Sfx {
    Pickup,
    Power,
    Eaten,
    Caught,
    Win,
}

impl Sfx {
    pub const ALL: [Sfx; 5] = [Sfx::Pickup, Sfx::Power, Sfx::Eaten, Sfx::Caught, Sfx::Win];

    /// Effect for an event; mode flips and power expiry are silent.
    pub fn for_event(event: &GameEvent) -> Option<Sfx> {
        match event {
            GameEvent::PickupEaten { .. } => Some(Sfx::Pickup),
            GameEvent::PowerPickupEaten { .. } => Some(Sfx::Power),
            GameEvent::AdversaryEaten { .. } => Some(Sfx::Eaten),
            GameEvent::PlayerCaught { .. } => Some(Sfx::Caught),
            GameEvent::AllPickupsCleared => Some(Sfx::Win),
            GameEvent::PowerExpired | GameEvent::ModeChanged { .. } => None,
        }
    }
}

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    use super::{synth, Sfx};

    /// Pre-generated WAV buffers, indexed by `Sfx as usize`.
    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        buffers: Vec<Arc<Vec<u8>>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    tracing::warn!(error = %e, "no audio output, sound disabled");
                    return None;
                }
            };
            let buffers = Sfx::ALL
                .iter()
                .map(|&sfx| Arc::new(synth::make_wav(&synth::generate(sfx))))
                .collect();
            Some(SoundEngine { _stream: stream, handle, buffers })
        }

        pub fn play(&self, sfx: Sfx) {
            let buf = &self.buffers[sfx as usize];
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach(); // fire-and-forget
                }
            }
        }
    }
}

#[cfg_attr(not(feature = "sound"), allow(dead_code))]
mod synth {
    use std::f32::consts::TAU;

    use super::Sfx;

    pub const SAMPLE_RATE: u32 = 22050;

    pub fn generate(sfx: Sfx) -> Vec<f32> {
        match sfx {
            Sfx::Pickup => gen_pickup(),
            Sfx::Power => gen_power(),
            Sfx::Eaten => gen_eaten(),
            Sfx::Caught => gen_caught(),
            Sfx::Win => gen_win(),
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators: mono f32 samples
    // ════════════════════════════════════════════════════════════

    fn samples_for(duration: f32) -> usize {
        (SAMPLE_RATE as f32 * duration) as usize
    }

    /// Frequency sweep from `f0` to `f1`, phase-continuous.
    fn sweep(f0: f32, f1: f32, duration: f32, volume: f32) -> Vec<f32> {
        let n = samples_for(duration);
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = f0 + (f1 - f0) * t;
                phase += freq / SAMPLE_RATE as f32;
                let env = 1.0 - t.powf(2.0);
                (phase * TAU).sin() * env * volume
            })
            .collect()
    }

    /// Pickup: two short alternating tones.
    fn gen_pickup() -> Vec<f32> {
        let mut samples = sweep(300.0, 600.0, 0.03, 0.2);
        samples.extend(sweep(600.0, 300.0, 0.03, 0.2));
        samples
    }

    /// Power-up: long rising siren.
    fn gen_power() -> Vec<f32> {
        let mut samples = Vec::new();
        for _ in 0..3 {
            samples.extend(sweep(400.0, 900.0, 0.08, 0.25));
        }
        samples
    }

    /// Adversary eaten: fast upward chirp with a square-ish edge.
    fn gen_eaten() -> Vec<f32> {
        sweep(200.0, 1600.0, 0.15, 0.3)
            .into_iter()
            .map(|s| (s * 3.0).clamp(-0.3, 0.3))
            .collect()
    }

    /// Caught: descending wail.
    fn gen_caught() -> Vec<f32> {
        let mut samples = Vec::new();
        let steps = [(800.0_f32, 500.0_f32), (700.0, 400.0), (600.0, 300.0), (500.0, 150.0)];
        for &(from, to) in &steps {
            samples.extend(sweep(from, to, 0.14, 0.3));
        }
        samples
    }

    /// Board cleared: ascending fanfare with a held top note.
    fn gen_win() -> Vec<f32> {
        let notes = [523.0_f32, 659.0, 784.0, 1047.0]; // C5→E5→G5→C6
        let mut samples = Vec::new();
        for (k, &freq) in notes.iter().enumerate() {
            let dur = if k + 1 == notes.len() { 0.3 } else { 0.1 };
            let n = samples_for(dur);
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32) * 0.5;
                let wave = (t * freq * TAU).sin() * 0.7 + (t * freq * 2.0 * TAU).sin() * 0.3;
                samples.push(wave * env * 0.3);
            }
        }
        samples
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: 16-bit PCM mono
    // ════════════════════════════════════════════════════════════

    pub fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2;
        let file_size = 36 + data_size;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&file_size.to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes()); // chunk size
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());

        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }

        buf
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn every_effect_is_audible_and_bounded() {
            for sfx in Sfx::ALL {
                let s = generate(sfx);
                assert!(!s.is_empty(), "{sfx:?} is empty");
                assert!(s.iter().all(|v| v.abs() <= 1.0), "{sfx:?} clips");
                assert!(s.iter().any(|v| v.abs() > 0.05), "{sfx:?} is silent");
            }
        }

        #[test]
        fn wav_header_matches_payload() {
            let wav = make_wav(&[0.0, 0.5, -0.5]);
            assert_eq!(&wav[0..4], b"RIFF");
            assert_eq!(&wav[8..12], b"WAVE");
            assert_eq!(wav.len(), 44 + 6);
            assert_eq!(u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]), 6);
        }
    }
}

// ════════════════════════════════════════════════════════════
//  Public API (no-op stub without the "sound" feature)
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play(&self, _sfx: Sfx) {}
}
