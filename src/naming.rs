use crate::error::{ImagenError, Result};
use rand::Rng;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Suffix length appended to output stems (e.g. `home_a3xz.jpg`).
const SUFFIX_LEN: usize = 4;

/// Suffix alphabet: lowercase letters and digits (36^4 combinations).
const SUFFIX_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Redraw bound before giving up on a pathological target directory.
const MAX_ATTEMPTS: usize = 100;

/// Collision-free output-name allocator for one batch run.
///
/// An allocated path is guaranteed distinct from every file already on disk
/// in the target directory and from every path previously allocated through
/// the same registry, so two jobs in one batch can never pick the same name
/// in the window before either has written its file. The guarantee holds for
/// one process run plus pre-existing filesystem state; nothing is persisted.
#[derive(Debug, Default)]
pub struct NameRegistry {
    allocated: Mutex<HashSet<PathBuf>>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a unique output path derived from `requested`.
    ///
    /// The result has the form `{stem}_{suffix}{ext}` in the same directory
    /// as `requested`. Draws are redrawn on collision with an on-disk file or
    /// an in-run allocation; after [`MAX_ATTEMPTS`] draws the allocator gives
    /// up with [`ImagenError::NamingExhausted`].
    pub fn allocate(&self, requested: &Path) -> Result<PathBuf> {
        let mut allocated = self.guard();
        allocate_suffixed(&mut allocated, requested)
    }

    /// Claim `requested` verbatim when it is free.
    ///
    /// Falls back to a suffixed allocation when `requested` already exists on
    /// disk or was handed out earlier in this run. Used for derived outputs
    /// (post-processing stages) whose name should follow the raster's.
    pub fn reserve(&self, requested: &Path) -> Result<PathBuf> {
        let mut allocated = self.guard();
        if !requested.exists() && !allocated.contains(requested) {
            allocated.insert(requested.to_path_buf());
            return Ok(requested.to_path_buf());
        }
        allocate_suffixed(&mut allocated, requested)
    }

    fn guard(&self) -> std::sync::MutexGuard<'_, HashSet<PathBuf>> {
        match self.allocated.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

// The disk check, the in-run set check and the insert must stay in one
// critical section; a gap would let two workers pick the same name between
// check and insert. Callers hold the registry's guard across the whole draw.
fn allocate_suffixed(allocated: &mut HashSet<PathBuf>, requested: &Path) -> Result<PathBuf> {
    let stem = requested
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image");
    let ext = requested
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e))
        .unwrap_or_default();
    let dir = requested.parent().map(Path::to_path_buf).unwrap_or_default();

    for _ in 0..MAX_ATTEMPTS {
        let candidate = dir.join(format!("{}_{}{}", stem, random_suffix(), ext));
        if candidate.exists() || allocated.contains(&candidate) {
            continue;
        }
        allocated.insert(candidate.clone());
        return Ok(candidate);
    }

    Err(ImagenError::NamingExhausted {
        base: requested.display().to_string(),
        attempts: MAX_ATTEMPTS,
    })
}

fn random_suffix() -> String {
    let mut rng = rand::rng();
    (0..SUFFIX_LEN)
        .map(|_| SUFFIX_ALPHABET[rng.random_range(0..SUFFIX_ALPHABET.len())] as char)
        .collect()
}
