//! Copies bundled assets into the data directory on startup.

use std::fs;
use std::io;
use std::path::Path;

/// Copy every file under `src` into `dest`, keeping the relative layout.
///
/// Files already present in `dest` with the same size are left alone. Each IO
/// failure is logged with its path; the walk continues and `false` is returned.
pub fn extract_assets(src: &Path, dest: &Path) -> bool {
    let mut ok = true;
    copy_dir(src, dest, &mut ok);
    ok
}

fn copy_dir(src: &Path, dest: &Path, ok: &mut bool) {
    let entries = match fs::read_dir(src) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(path = %src.display(), "Failed to read asset directory: {e}");
            *ok = false;
            return;
        }
    };

    if let Err(e) = fs::create_dir_all(dest) {
        tracing::warn!(path = %dest.display(), "Failed to create asset directory: {e}");
        *ok = false;
        return;
    }

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(path = %src.display(), "Failed to list asset: {e}");
                *ok = false;
                continue;
            }
        };
        let from = entry.path();
        let to = dest.join(entry.file_name());

        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::warn!(path = %from.display(), "Failed to stat asset: {e}");
                *ok = false;
                continue;
            }
        };

        if metadata.is_dir() {
            copy_dir(&from, &to, ok);
            continue;
        }

        if is_current(&to, metadata.len()) {
            tracing::trace!(path = %to.display(), "Asset up to date");
            continue;
        }

        match fs::copy(&from, &to) {
            Ok(bytes) => tracing::debug!(path = %to.display(), bytes, "Asset extracted"),
            Err(e) => {
                tracing::warn!(path = %from.display(), "Failed to extract asset: {e}");
                *ok = false;
            }
        }
    }
}

fn is_current(path: &Path, len: u64) -> bool {
    match fs::metadata(path) {
        Ok(existing) => existing.is_file() && existing.len() == len,
        Err(e) if e.kind() == io::ErrorKind::NotFound => false,
        Err(e) => {
            tracing::debug!(path = %path.display(), "Treating asset as stale: {e}");
            false
        }
    }
}
