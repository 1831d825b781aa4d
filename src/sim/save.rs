/// Persistent catch totals.
///
/// ## File format:
///   A fixed 20-byte little-endian record: four `u32` per-species counts
///   (Bear, Raccoon, Deer, Big Deer) followed by a `u32` checksum.
///
///   checksum = (Σ count[i] * (i + 1), wrapping) XOR 0xDEADBEEF
///
/// A short file or checksum mismatch is corruption. Corrupt saves are
/// treated as absent: totals reset to zero and a fresh file is written.
/// The file is rewritten after every catch.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::domain::species::{PerSpecies, Species, SPECIES_COUNT};

const CHECKSUM_KEY: u32 = 0xDEAD_BEEF;
pub const RECORD_LEN: usize = (SPECIES_COUNT + 1) * 4;

#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("save file I/O: {0}")]
    Io(#[from] io::Error),
    #[error("save file truncated ({0} bytes)")]
    Truncated(usize),
    #[error("save checksum mismatch (stored {stored:#010x}, computed {computed:#010x})")]
    Checksum { stored: u32, computed: u32 },
}

// ══════════════════════════════════════════════════════════════
// Record
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct SaveState {
    pub counts: PerSpecies<u32>,
}

impl SaveState {
    pub fn checksum(&self) -> u32 {
        let sum = self.counts.0.iter().enumerate().fold(0u32, |acc, (i, &c)| {
            acc.wrapping_add(c.wrapping_mul(i as u32 + 1))
        });
        sum ^ CHECKSUM_KEY
    }

    pub fn encode(&self) -> [u8; RECORD_LEN] {
        let mut buf = [0u8; RECORD_LEN];
        for (i, c) in self.counts.0.iter().enumerate() {
            buf[i * 4..i * 4 + 4].copy_from_slice(&c.to_le_bytes());
        }
        buf[SPECIES_COUNT * 4..].copy_from_slice(&self.checksum().to_le_bytes());
        buf
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, SaveError> {
        if bytes.len() < RECORD_LEN {
            return Err(SaveError::Truncated(bytes.len()));
        }
        let word = |i: usize| {
            let mut w = [0u8; 4];
            w.copy_from_slice(&bytes[i * 4..i * 4 + 4]);
            u32::from_le_bytes(w)
        };

        let mut counts = PerSpecies::default();
        for i in 0..SPECIES_COUNT {
            counts.0[i] = word(i);
        }
        let state = SaveState { counts };
        let stored = word(SPECIES_COUNT);
        let computed = state.checksum();
        if stored != computed {
            return Err(SaveError::Checksum { stored, computed });
        }
        Ok(state)
    }

    pub fn increment(&mut self, species: Species) {
        self.counts[species] = self.counts[species].saturating_add(1);
    }

    pub fn reset(&mut self) {
        self.counts = PerSpecies::default();
    }
}

// ══════════════════════════════════════════════════════════════
// Paths
// ══════════════════════════════════════════════════════════════

fn save_dir() -> PathBuf {
    // 1. Exe directory, if writable (portable installs)
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            let test_path = parent.join(".write_test_campus_critters");
            if fs::write(&test_path, "").is_ok() {
                let _ = fs::remove_file(&test_path);
                return parent.to_path_buf();
            }
        }
    }

    // 2. XDG data home for system installs
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/campus-critters");
        if fs::create_dir_all(&xdg).is_ok() {
            return xdg;
        }
    }

    // 3. CWD
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Relative names land in the save directory; absolute paths are kept.
pub fn resolve_path(file: &str) -> PathBuf {
    let p = Path::new(file);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        save_dir().join(p)
    }
}

// ══════════════════════════════════════════════════════════════
// Store
// ══════════════════════════════════════════════════════════════

/// The save record plus where it lives on disk.
pub struct SaveStore {
    path: PathBuf,
    pub state: SaveState,
}

impl SaveStore {
    /// Load `path`, falling back to zeroed totals. A corrupt file is
    /// replaced immediately; a missing one is written on the first catch.
    pub fn open(path: PathBuf) -> Self {
        let state = match load(&path) {
            Ok(state) => {
                info!("Loaded save data from {}", path.display());
                state
            }
            Err(SaveError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                info!("No save data at {}, starting fresh", path.display());
                SaveState::default()
            }
            Err(e) => {
                warn!("Save data at {} unusable ({}), resetting", path.display(), e);
                let fresh = SaveState::default();
                if let Err(e) = write(&path, &fresh) {
                    warn!("Could not rewrite save file: {}", e);
                }
                fresh
            }
        };
        SaveStore { path, state }
    }

    #[cfg(test)]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record a catch and persist. Write failures are logged, not fatal.
    pub fn record_catch(&mut self, species: Species) {
        self.state.increment(species);
        info!("{} total now {}", species.plural(), self.state.counts[species]);
        self.persist();
    }

    pub fn reset(&mut self) {
        info!("Resetting all catch totals");
        self.state.reset();
        self.persist();
    }

    fn persist(&self) {
        match write(&self.path, &self.state) {
            Ok(()) => info!("Saved to {}", self.path.display()),
            Err(e) => warn!("Save failed: {}", e),
        }
    }
}

pub fn load(path: &Path) -> Result<SaveState, SaveError> {
    let bytes = fs::read(path)?;
    SaveState::decode(&bytes)
}

pub fn write(path: &Path, state: &SaveState) -> Result<(), SaveError> {
    fs::write(path, state.encode())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("save_data.dat");
        let state = SaveState { counts: PerSpecies([2, 1, 0, 4]) };
        write(&path, &state).unwrap();
        assert_eq!(fs::metadata(&path).unwrap().len(), RECORD_LEN as u64);
        assert_eq!(load(&path).unwrap(), state);
    }

    #[test]
    fn checksum_matches_weighted_sum() {
        let state = SaveState { counts: PerSpecies([2, 1, 0, 4]) };
        // 2*1 + 1*2 + 0*3 + 4*4 = 20
        assert_eq!(state.checksum(), 20 ^ 0xDEAD_BEEF);
        assert_eq!(SaveState::default().checksum(), 0xDEAD_BEEF);
    }

    #[test]
    fn corrupt_checksum_resets_and_rewrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("save_data.dat");
        let mut bytes = SaveState { counts: PerSpecies([2, 1, 0, 4]) }.encode();
        bytes[RECORD_LEN - 1] ^= 0xFF;
        fs::write(&path, bytes).unwrap();

        assert!(matches!(load(&path), Err(SaveError::Checksum { .. })));

        let store = SaveStore::open(path.clone());
        assert_eq!(store.state, SaveState::default());
        assert_eq!(load(&path).unwrap(), SaveState::default());
    }

    #[test]
    fn short_file_is_corrupt() {
        assert!(matches!(SaveState::decode(&[0u8; 7]), Err(SaveError::Truncated(7))));
    }

    #[test]
    fn missing_file_starts_fresh_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("none.dat");
        let store = SaveStore::open(path.clone());
        assert_eq!(store.state, SaveState::default());
        assert!(!path.exists());
    }

    #[test]
    fn catch_and_reset_persist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("save_data.dat");
        let mut store = SaveStore::open(path.clone());
        store.record_catch(Species::Deer);
        store.record_catch(Species::Deer);
        store.record_catch(Species::Bear);
        assert_eq!(load(&path).unwrap().counts.0, [1, 0, 2, 0]);

        store.reset();
        assert_eq!(load(&path).unwrap().counts.0, [0, 0, 0, 0]);
    }
}
