/// Sound engine: one-shot effects plus a looping background track, via rodio.
///
/// Effects are in-memory WAV buffers, generated procedurally at init time
/// (the catch effect prefers `sounds/catch.wav` from the assets directory
/// when present). Playback is fire-and-forget via detached Sinks.
///
/// Background music is streamed from an asset file and looped. Changing the
/// track drops the old Sink, which stops it. Missing or undecodable files
/// are logged and leave the music silent.
///
/// Compile without the "sound" feature to disable audio entirely (the
/// stub SoundEngine does nothing).

#[cfg(feature = "sound")]
mod inner {
    use std::cell::RefCell;
    use std::fs::File;
    use std::io::{BufReader, Cursor};
    use std::path::Path;
    use std::sync::Arc;

    use log::{info, warn};
    use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};

    use crate::domain::room::DoorKind;

    const SAMPLE_RATE: u32 = 22050;
    const MUSIC_VOLUME: f32 = 0.5;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        music: RefCell<Option<Sink>>,
        sfx_catch: Arc<Vec<u8>>,
        sfx_stairs_up: Arc<Vec<u8>>,
        sfx_stairs_down: Arc<Vec<u8>>,
        sfx_door: Arc<Vec<u8>>,
        sfx_quest_start: Arc<Vec<u8>>,
        sfx_quest_complete: Arc<Vec<u8>>,
        sfx_reset: Arc<Vec<u8>>,
        sfx_blip: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new(catch_asset: &Path) -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    warn!("Audio output unavailable: {}", e);
                    return None;
                }
            };

            let sfx_catch = match std::fs::read(catch_asset) {
                Ok(bytes) => {
                    info!("Loaded catch sound from {}", catch_asset.display());
                    bytes
                }
                Err(e) => {
                    warn!("Catch sound {} not loaded ({}), using built-in", catch_asset.display(), e);
                    make_wav(&gen_catch())
                }
            };

            Some(SoundEngine {
                _stream: stream,
                handle,
                music: RefCell::new(None),
                sfx_catch: Arc::new(sfx_catch),
                sfx_stairs_up: Arc::new(make_wav(&gen_sweep(300.0, 700.0, 0.18))),
                sfx_stairs_down: Arc::new(make_wav(&gen_sweep(700.0, 300.0, 0.18))),
                sfx_door: Arc::new(make_wav(&gen_knock())),
                sfx_quest_start: Arc::new(make_wav(&gen_notes(&[(659.0, 0.08), (880.0, 0.12)]))),
                sfx_quest_complete: Arc::new(make_wav(&gen_fanfare())),
                sfx_reset: Arc::new(make_wav(&gen_sweep(500.0, 150.0, 0.25))),
                sfx_blip: Arc::new(make_wav(&gen_blip(900.0, 0.02, 0.12))),
            })
        }

        fn play(&self, buf: &Arc<Vec<u8>>) {
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach();
                }
            }
        }

        pub fn play_catch(&self) { self.play(&self.sfx_catch); }
        pub fn play_quest_start(&self) { self.play(&self.sfx_quest_start); }
        pub fn play_quest_complete(&self) { self.play(&self.sfx_quest_complete); }
        pub fn play_reset(&self) { self.play(&self.sfx_reset); }
        pub fn play_blip(&self) { self.play(&self.sfx_blip); }

        pub fn play_door(&self, kind: DoorKind) {
            match kind {
                DoorKind::StairsUp => self.play(&self.sfx_stairs_up),
                DoorKind::StairsDown => self.play(&self.sfx_stairs_down),
                DoorKind::Plain => self.play(&self.sfx_door),
            }
        }

        /// Replace the background track with a looped file.
        pub fn change_track(&self, path: &Path) {
            // Dropping the old sink stops it.
            self.music.borrow_mut().take();

            let file = match File::open(path) {
                Ok(f) => f,
                Err(e) => {
                    warn!("Music {} not loaded: {}", path.display(), e);
                    return;
                }
            };
            let source = match Decoder::new_looped(BufReader::new(file)) {
                Ok(s) => s,
                Err(e) => {
                    warn!("Music {} not decodable: {}", path.display(), e);
                    return;
                }
            };
            match Sink::try_new(&self.handle) {
                Ok(sink) => {
                    sink.set_volume(MUSIC_VOLUME);
                    sink.append(source);
                    info!("Music now {}", path.display());
                    *self.music.borrow_mut() = Some(sink);
                }
                Err(e) => warn!("Music sink unavailable: {}", e),
            }
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators: mono Vec<f32> samples
    // ════════════════════════════════════════════════════════════

    fn tone(t: f32, freq: f32) -> f32 {
        (t * freq * 2.0 * std::f32::consts::PI).sin()
    }

    /// Simple sine blip at given frequency and duration
    fn gen_blip(freq: f32, duration: f32, volume: f32) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32);
                tone(t, freq) * env * volume
            })
            .collect()
    }

    /// Catch: bright upward chirp followed by a short ping
    fn gen_catch() -> Vec<f32> {
        let mut samples = gen_sweep(500.0, 1400.0, 0.09);
        samples.extend(gen_blip(1760.0, 0.08, 0.25));
        samples
    }

    /// Linear pitch sweep with a decaying envelope
    fn gen_sweep(from: f32, to: f32, duration: f32) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = from + (to - from) * t;
                phase += freq / SAMPLE_RATE as f32;
                let env = (1.0 - t).powf(0.6);
                (phase * 2.0 * std::f32::consts::PI).sin() * env * 0.25
            })
            .collect()
    }

    /// Plain door: two dull knocks of filtered noise
    fn gen_knock() -> Vec<f32> {
        let mut rng: u32 = 12345;
        let mut samples = Vec::new();
        for _ in 0..2 {
            let n = (SAMPLE_RATE as f32 * 0.05) as usize;
            let mut prev = 0.0_f32;
            for i in 0..n {
                rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
                let noise = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
                prev = prev * 0.85 + noise * 0.15; // crude low-pass
                let env = 1.0 - (i as f32 / n as f32);
                samples.push((prev * 0.7 + tone(i as f32 / SAMPLE_RATE as f32, 120.0) * 0.3) * env * 0.5);
            }
            samples.extend(std::iter::repeat(0.0).take((SAMPLE_RATE as f32 * 0.06) as usize));
        }
        samples
    }

    /// Sequence of (frequency, seconds) notes with a retro timbre
    fn gen_notes(notes: &[(f32, f32)]) -> Vec<f32> {
        let mut samples = Vec::new();
        for &(freq, dur) in notes {
            let n = (SAMPLE_RATE as f32 * dur) as usize;
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32).powf(0.5);
                let wave = tone(t, freq) * 0.7 + tone(t, freq * 2.0) * 0.3;
                samples.push(wave * env * 0.3);
            }
        }
        samples
    }

    /// Quest complete: ascending fanfare C5→E5→G5→C6 with a held top note
    fn gen_fanfare() -> Vec<f32> {
        let mut samples = gen_notes(&[(523.0, 0.1), (659.0, 0.1), (784.0, 0.1)]);
        let n = (SAMPLE_RATE as f32 * 0.3) as usize;
        for i in 0..n {
            let t = i as f32 / SAMPLE_RATE as f32;
            let env = 1.0 - (i as f32 / n as f32);
            let wave = tone(t, 1047.0) * 0.6 + tone(t, 2094.0) * 0.3 + tone(t, 3141.0) * 0.1;
            samples.push(wave * env * 0.3);
        }
        samples
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: wraps f32 samples into a valid WAV buffer
    // ════════════════════════════════════════════════════════════

    fn make_wav(samples: &[f32]) -> Vec<u8> {
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
        buf.extend_from_slice(&16u32.to_le_bytes());
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
        fn wav_header_matches_sample_count() {
            let samples = gen_catch();
            let wav = make_wav(&samples);
            assert_eq!(&wav[0..4], b"RIFF");
            assert_eq!(wav.len(), 44 + samples.len() * 2);
            let data_size = u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]);
            assert_eq!(data_size as usize, samples.len() * 2);
        }

        #[test]
        fn generated_effects_stay_in_range() {
            for s in [gen_catch(), gen_knock(), gen_fanfare(), gen_sweep(700.0, 300.0, 0.18)] {
                assert!(!s.is_empty());
                assert!(s.iter().all(|v| v.abs() <= 1.0));
            }
        }
    }
}

// ════════════════════════════════════════════════════════════
//  Public API: compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new(_catch_asset: &std::path::Path) -> Option<Self> { Some(SoundEngine) }
    pub fn play_catch(&self) {}
    pub fn play_quest_start(&self) {}
    pub fn play_quest_complete(&self) {}
    pub fn play_reset(&self) {}
    pub fn play_blip(&self) {}
    pub fn play_door(&self, _kind: crate::domain::room::DoorKind) {}
    pub fn change_track(&self, _path: &std::path::Path) {}
}
