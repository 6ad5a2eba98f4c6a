#![forbid(unsafe_code)]

//! Header count sidecar for grouped batches.
//!
//! A grouped batch stored on disk keeps its header count in a hidden
//! `.lscat` file next to the items, as a single decimal number. Replaying
//! the batch later reads it back so the Order Generator can rebuild the same
//! interleaving without re-fetching the batch metadata.
//!
//! Writes go through a temporary file and a rename, so a reader never sees a
//! half-written count.

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use lscat_core::{debug, warn};

/// File name of the sidecar inside a batch directory.
pub const SIDECAR_NAME: &str = ".lscat";

const SIDECAR_TMP_NAME: &str = ".lscat.tmp";

/// Sidecar could not be read or written.
#[derive(Debug)]
pub enum SidecarError {
    Io(io::Error),
    /// The file exists but does not hold a decimal count.
    Malformed { path: PathBuf, content: String },
}

impl fmt::Display for SidecarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "sidecar I/O error: {e}"),
            Self::Malformed { path, content } => write!(
                f,
                "sidecar {} holds {content:?}, not a header count",
                path.display()
            ),
        }
    }
}

impl std::error::Error for SidecarError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Malformed { .. } => None,
        }
    }
}

impl From<io::Error> for SidecarError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

pub fn sidecar_path(dir: &Path) -> PathBuf {
    dir.join(SIDECAR_NAME)
}

/// Persist `count` as the header count of the batch in `dir`.
pub fn write_header_count(dir: &Path, count: usize) -> Result<(), SidecarError> {
    fs::create_dir_all(dir)?;
    let tmp = dir.join(SIDECAR_TMP_NAME);
    {
        let mut file = fs::File::create(&tmp)?;
        writeln!(file, "{count}")?;
        file.sync_all()?;
    }
    fs::rename(&tmp, sidecar_path(dir))?;
    debug!(dir = %dir.display(), count, "wrote header count");
    Ok(())
}

/// Header count stored for the batch in `dir`, or `None` without a sidecar.
pub fn read_header_count(dir: &Path) -> Result<Option<usize>, SidecarError> {
    let path = sidecar_path(dir);
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    content
        .trim()
        .parse()
        .map(Some)
        .map_err(|_| SidecarError::Malformed { path, content })
}

/// Header count for a grouped batch of `total` items.
///
/// Precedence: `known` (from fresh metadata), then the sidecar in `dir`,
/// then `ceil(total / group_size)`. A value larger than `total` is clamped.
/// An unreadable sidecar is logged and skipped.
pub fn resolve_header_count(
    known: Option<usize>,
    dir: &Path,
    total: usize,
    group_size: usize,
) -> usize {
    let resolved = match known {
        Some(count) => count,
        None => match read_header_count(dir) {
            Ok(Some(count)) => count,
            Ok(None) => fallback_header_count(total, group_size),
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "ignoring unreadable sidecar");
                fallback_header_count(total, group_size)
            }
        },
    };
    resolved.min(total)
}

/// Headers needed to give every group `group_size` items.
pub fn fallback_header_count(total: usize, group_size: usize) -> usize {
    total.div_ceil(group_size.max(1))
}
