//! POSIX mode bits ⇄ archive entry external attributes.
//!
//! An entry's 32-bit external-attributes field is shared: the low 16 bits
//! belong to the archive format (MS-DOS compatibility bits and the like), the
//! high 16 bits carry the POSIX `st_mode` of the original file.  This module
//! only ever ORs into the high half and never clears anything.
//!
//! Filesystem access goes through the [`FileSystem`] port so the bridge can
//! be exercised against fakes.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

// ── ExternalAttributes ───────────────────────────────────────────────────────

/// Archive entry external-attributes field.
///
/// Bits 0–15 are archive-format owned, bits 16–31 hold the POSIX mode.
/// [`with_posix_mode`](Self::with_posix_mode) is the only mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ExternalAttributes(u32);

impl ExternalAttributes {
    pub const POSIX_SHIFT: u32 = 16;

    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Archive-format owned half (bits 0–15).
    #[inline]
    pub const fn low_attribute_bits(self) -> u16 {
        self.0 as u16
    }

    /// POSIX mode carried in bits 16–31.
    #[inline]
    pub const fn posix_mode(self) -> u16 {
        (self.0 >> Self::POSIX_SHIFT) as u16
    }

    /// OR `mode` into the high half.  Additive: existing bits survive.
    #[inline]
    #[must_use]
    pub const fn with_posix_mode(self, mode: u16) -> Self {
        Self(self.0 | ((mode as u32) << Self::POSIX_SHIFT))
    }
}

impl From<u32> for ExternalAttributes {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl From<ExternalAttributes> for u32 {
    fn from(attrs: ExternalAttributes) -> Self {
        attrs.0
    }
}

// ── Error type ───────────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum AttributeError {
    /// Metadata for the source path could not be read.
    #[error("cannot read mode of {}: {source}", path.display())]
    Lookup {
        path:   PathBuf,
        #[source]
        source: io::Error,
    },
    /// The destination's mode could not be read or changed.
    #[error("cannot apply mode {mode:#o} to {}: {source}", path.display())]
    Apply {
        path:   PathBuf,
        mode:   u16,
        #[source]
        source: io::Error,
    },
}

impl AttributeError {
    pub fn path(&self) -> &Path {
        match self {
            AttributeError::Lookup { path, .. } | AttributeError::Apply { path, .. } => path,
        }
    }
}

// ── FileSystem port ──────────────────────────────────────────────────────────

/// The stat/chmod surface the bridge needs.
pub trait FileSystem: Send + Sync {
    /// Current 16-bit mode (file type + permission bits) of `path`.
    fn mode(&self, path: &Path) -> io::Result<u16>;
    fn set_mode(&self, path: &Path, mode: u16) -> io::Result<()>;
}

/// [`FileSystem`] over `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdFileSystem;

#[cfg(unix)]
impl FileSystem for StdFileSystem {
    fn mode(&self, path: &Path) -> io::Result<u16> {
        use std::os::unix::fs::MetadataExt;
        // st_mode fits in 16 bits on every Unix we target.
        Ok(fs::metadata(path)?.mode() as u16)
    }

    fn set_mode(&self, path: &Path, mode: u16) -> io::Result<()> {
        use std::os::unix::fs::PermissionsExt;
        // chmod only takes permission, setuid/setgid and sticky bits.
        fs::set_permissions(path, fs::Permissions::from_mode(u32::from(mode) & 0o7777))
    }
}

#[cfg(not(unix))]
impl FileSystem for StdFileSystem {
    fn mode(&self, path: &Path) -> io::Result<u16> {
        const S_IFDIR: u16 = 0o040000;
        const S_IFREG: u16 = 0o100000;
        let meta = fs::metadata(path)?;
        let kind = if meta.is_dir() { S_IFDIR | 0o111 } else { S_IFREG };
        let perms = if meta.permissions().readonly() { 0o444 } else { 0o644 };
        Ok(kind | perms)
    }

    fn set_mode(&self, path: &Path, mode: u16) -> io::Result<()> {
        let mut perms = fs::metadata(path)?.permissions();
        perms.set_readonly(mode & 0o200 == 0);
        fs::set_permissions(path, perms)
    }
}

// ── Bridge ───────────────────────────────────────────────────────────────────

/// Moves POSIX modes between the filesystem and entry attributes.
#[derive(Debug, Clone, Default)]
pub struct PosixAttributeBridge<F: FileSystem = StdFileSystem> {
    fs: F,
}

impl PosixAttributeBridge<StdFileSystem> {
    pub fn new() -> Self {
        Self { fs: StdFileSystem }
    }
}

impl<F: FileSystem> PosixAttributeBridge<F> {
    pub fn with_filesystem(fs: F) -> Self {
        Self { fs }
    }

    /// Merge the mode of `source` into `attrs` (write path).
    pub fn capture_into(
        &self,
        attrs:  ExternalAttributes,
        source: &Path,
    ) -> Result<ExternalAttributes, AttributeError> {
        let mode = self.fs.mode(source).map_err(|source_err| AttributeError::Lookup {
            path:   source.to_owned(),
            source: source_err,
        })?;
        let merged = attrs.with_posix_mode(mode);
        debug!(path = %source.display(), mode, attrs = merged.raw(), "captured mode");
        Ok(merged)
    }

    /// Apply the mode stored in `attrs` to `destination` (extract path).
    ///
    /// The stored mode is ORed with whatever mode the freshly created file
    /// already has, then written back with chmod.  The stored half is shifted
    /// down to bit 0 before the OR, so the archive-owned low bits never reach
    /// chmod.
    pub fn apply_from(&self, attrs: ExternalAttributes, destination: &Path) -> Result<(), AttributeError> {
        let stored = attrs.posix_mode();
        let current = self.fs.mode(destination).map_err(|source| AttributeError::Apply {
            path: destination.to_owned(),
            mode: stored,
            source,
        })?;
        let new_mode = current | stored;
        self.fs.set_mode(destination, new_mode).map_err(|source| AttributeError::Apply {
            path: destination.to_owned(),
            mode: new_mode,
            source,
        })?;
        debug!(path = %destination.display(), mode = new_mode, "applied mode");
        Ok(())
    }
}

/// [`PosixAttributeBridge::capture_into`] against the real filesystem.
pub fn capture_into<P: AsRef<Path>>(attrs: ExternalAttributes, source: P) -> Result<ExternalAttributes, AttributeError> {
    PosixAttributeBridge::new().capture_into(attrs, source.as_ref())
}

/// [`PosixAttributeBridge::apply_from`] against the real filesystem.
pub fn apply_from<P: AsRef<Path>>(attrs: ExternalAttributes, destination: P) -> Result<(), AttributeError> {
    PosixAttributeBridge::new().apply_from(attrs, destination.as_ref())
}
