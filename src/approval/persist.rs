// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Writing accepted edits to disk.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::debug;
use uuid::Uuid;

/// Resolve `filename` to a path inside `root`.
///
/// Absolute names are accepted only under `root`. `..` may not climb above
/// `root`. The check is lexical; symlinks are not followed.
pub fn resolve_path(root: &Path, filename: &str) -> io::Result<PathBuf> {
    let path = Path::new(filename);
    let path = if path.is_absolute() {
        path.strip_prefix(root).map_err(|_| outside_root(filename))?
    } else {
        path
    };

    let mut relative = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !relative.pop() {
                    return Err(outside_root(filename));
                }
            }
            Component::RootDir | Component::Prefix(_) => return Err(outside_root(filename)),
        }
    }

    if relative.as_os_str().is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("'{}' does not name a file", filename),
        ));
    }
    Ok(root.join(relative))
}

fn outside_root(filename: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::PermissionDenied,
        format!("'{}' is outside the repository root", filename),
    )
}

/// Write `content` to `path` on a blocking worker thread.
///
/// Parent directories are created. Content goes to a sibling temporary file
/// first and is renamed into place, so readers never see a partial write.
pub async fn write_file(path: PathBuf, content: String) -> io::Result<()> {
    tokio::task::spawn_blocking(move || write_atomic(&path, &content))
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("write task failed: {}", e)))?
}

fn write_atomic(path: &Path, content: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?
        .to_string_lossy();
    let tmp = path.with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4().simple()));

    fs::write(&tmp, content)?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }

    debug!(path = %path.display(), bytes = content.len(), "Wrote file");
    Ok(())
}
