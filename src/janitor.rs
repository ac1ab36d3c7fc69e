//! Temp-Dir Janitor (C14): a process-lifetime registry of scratch object
//! directories created by C6, swept best-effort on `SIGTERM` so a worker that
//! crashes mid-detection doesn't leak its scratch dir. Deterministic release
//! on the happy path still happens via `IsolatedObjectEnv`'s `Drop` impl —
//! this registry is the backstop, not the primary cleanup mechanism.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

static REGISTRY: Mutex<Option<HashSet<PathBuf>>> = Mutex::new(None);

pub fn register(path: &Path) {
    let mut guard = REGISTRY.lock().expect("janitor registry poisoned");
    guard.get_or_insert_with(HashSet::new).insert(path.to_path_buf());
}

pub fn deregister(path: &Path) {
    let mut guard = REGISTRY.lock().expect("janitor registry poisoned");
    if let Some(set) = guard.as_mut() {
        set.remove(path);
    }
}

/// Remove every currently-registered scratch directory. Called from the
/// `SIGTERM` handler installed in `main`; also callable directly in tests.
pub fn sweep() {
    let mut guard = REGISTRY.lock().expect("janitor registry poisoned");
    if let Some(set) = guard.as_mut() {
        for path in set.drain() {
            let _ = std::fs::remove_dir_all(&path);
        }
    }
}

#[cfg(unix)]
pub fn install_signal_sweep() -> anyhow::Result<()> {
    // SIGTERM-triggered best-effort cleanup. signal_hook's `flag`/`iterator`
    // helpers would require unsafe-free async-signal-safety we don't get for
    // free with `fs::remove_dir_all`, so instead we watch for the signal on
    // a dedicated thread and run the sweep from ordinary (non-signal-handler)
    // context — matching the crate-wide `unsafe_code = "forbid"` constraint.
    let mut signals = signal_hook::iterator::Signals::new([signal_hook::consts::SIGTERM])?;
    std::thread::Builder::new()
        .name("sq-janitor".into())
        .spawn(move || {
            for _ in signals.forever() {
                sweep();
                std::process::exit(143); // 128 + SIGTERM
            }
        })?;
    Ok(())
}

#[cfg(not(unix))]
pub fn install_signal_sweep() -> anyhow::Result<()> {
    Ok(())
}
