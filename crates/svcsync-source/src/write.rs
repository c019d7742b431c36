//! File egress
//!
//! All mutations end here: the buffer is reformatted, compared against the
//! bytes already on disk, and only then replaced as a whole through a
//! sibling temporary file and a rename. A reader never observes a
//! half-written file.

use std::io::Write;
use std::path::Path;

use crate::error::WriteError;
use crate::format::CodeFormatter;
use crate::hash::ContentHash;

/// Replace `path` with `contents` atomically
///
/// Existing file permissions are preserved.
///
/// # Errors
/// Returns `WriteError::Io` if the scratch file cannot be written or renamed
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), WriteError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut scratch =
        tempfile::NamedTempFile::new_in(dir).map_err(|e| WriteError::io_error(path, e))?;
    scratch
        .write_all(contents)
        .and_then(|()| scratch.as_file().sync_all())
        .map_err(|e| WriteError::io_error(path, e))?;

    match std::fs::metadata(path) {
        Ok(meta) => std::fs::set_permissions(scratch.path(), meta.permissions())
            .map_err(|e| WriteError::io_error(path, e))?,
        Err(_) => set_default_permissions(scratch.path()).map_err(|e| WriteError::io_error(path, e))?,
    }

    scratch
        .persist(path)
        .map_err(|e| WriteError::io_error(path, e.error))?;
    Ok(())
}

#[cfg(unix)]
fn set_default_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn set_default_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

/// Format `code` and write it to `path` unless the file already holds it
///
/// Returns `true` when the file was written.
///
/// # Errors
/// - `WriteError::Format` if the formatter rejects the buffer
/// - `WriteError::Io` if the write fails
pub fn format_and_write(
    path: &Path,
    code: &str,
    formatter: &dyn CodeFormatter,
) -> Result<bool, WriteError> {
    let formatted = formatter.format(code).map_err(|source| WriteError::Format {
        path: path.to_path_buf(),
        source,
    })?;

    let fresh = ContentHash::compute(formatted.as_bytes());
    if ContentHash::of_file(path) == Some(fresh) {
        tracing::debug!(path = %path.display(), "content unchanged, skipping write");
        return Ok(false);
    }

    write_atomic(path, formatted.as_bytes())?;
    tracing::info!(
        path = %path.display(),
        formatter = formatter.name(),
        hash = %fresh.short(),
        "wrote file"
    );
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::LayoutFormatter;

    #[test]
    fn write_atomic_creates_and_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.go");

        write_atomic(&path, b"package a\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "package a\n");

        write_atomic(&path, b"package b\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "package b\n");

        let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn format_and_write_skips_identical_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.go");
        std::fs::write(&path, "package a\n").unwrap();

        let wrote = format_and_write(&path, "package a\n\n\n", &LayoutFormatter).unwrap();
        assert!(!wrote);

        let wrote = format_and_write(&path, "package b", &LayoutFormatter).unwrap();
        assert!(wrote);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "package b\n");
    }

    #[cfg(unix)]
    #[test]
    fn write_atomic_preserves_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.go");
        std::fs::write(&path, "package a\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o640)).unwrap();

        write_atomic(&path, b"package b\n").unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o640);
    }
}
