use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::PlotError;

/// Hidden sibling of `path` that receives the bytes before the rename.
fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.{}.tmp", name, std::process::id()))
}

/// Write `bytes` to `path` so that readers see either the old file or the new one.
///
/// The data goes to a temp file in the same directory which is then renamed over
/// `path`. If anything fails the temp file is removed and `path` is left as it was.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), PlotError> {
    if path.file_name().is_none() {
        return Err(PlotError::io(
            path,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "output path has no file name"),
        ));
    }

    // write through a symlink instead of replacing it
    let target = match fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_symlink() => {
            fs::canonicalize(path).map_err(|e| PlotError::io(path, e))?
        }
        _ => path.to_path_buf(),
    };

    let existing = match fs::metadata(&target) {
        Ok(meta) => Some(meta.permissions()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => return Err(PlotError::io(path, e)),
    };
    if existing.as_ref().is_some_and(|p| p.readonly()) {
        return Err(PlotError::io(
            path,
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "output file is read-only"),
        ));
    }

    let tmp = temp_path(&target);
    let mut file = fs::File::create(&tmp).map_err(|e| PlotError::io(path, e))?;
    let cleanup = scopeguard::guard(tmp.clone(), |tmp| {
        if let Err(e) = fs::remove_file(&tmp) {
            tracing::warn!("could not remove {}: {}", tmp.display(), e);
        }
    });

    file.write_all(bytes).map_err(|e| PlotError::io(path, e))?;
    file.sync_all().map_err(|e| PlotError::io(path, e))?;
    drop(file);

    if let Some(permissions) = existing {
        fs::set_permissions(&tmp, permissions).map_err(|e| PlotError::io(path, e))?;
    }

    fs::rename(&tmp, &target).map_err(|e| PlotError::io(path, e))?;

    // renamed away; nothing left to clean up
    scopeguard::ScopeGuard::into_inner(cleanup);

    tracing::debug!("wrote {} bytes to {}", bytes.len(), target.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        fs::write(&path, b"old").unwrap();

        write_atomic(&path, b"new contents").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"new contents");
        assert_eq!(entries(dir.path()), vec!["out.png".to_string()]);
    }

    #[cfg(unix)]
    #[test]
    fn read_only_output_is_left_alone() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("speedup.png");
        fs::write(&path, b"old").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o444)).unwrap();

        let err = write_atomic(&path, b"new").unwrap_err();

        match err {
            PlotError::Io { source, .. } => {
                assert_eq!(source.kind(), std::io::ErrorKind::PermissionDenied)
            }
            other => panic!("expected io error, got {other}"),
        }
        assert_eq!(fs::read(&path).unwrap(), b"old");
        assert_eq!(fs::metadata(&path).unwrap().permissions().mode() & 0o777, 0o444);
        assert_eq!(entries(dir.path()), vec!["speedup.png".to_string()]);
    }

    #[cfg(unix)]
    #[test]
    fn keeps_mode_of_replaced_file() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("speedup.png");
        fs::write(&path, b"old").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o600)).unwrap();

        write_atomic(&path, b"new").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"new");
        assert_eq!(fs::metadata(&path).unwrap().permissions().mode() & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn writes_through_symlink() {
        let dir = tempfile::tempdir().unwrap();
        let real = dir.path().join("real.png");
        let link = dir.path().join("speedup.png");
        fs::write(&real, b"old").unwrap();
        std::os::unix::fs::symlink(&real, &link).unwrap();

        write_atomic(&link, b"new").unwrap();

        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(fs::read(&real).unwrap(), b"new");
    }

    #[test]
    fn parent_that_is_a_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"x").unwrap();

        let err = write_atomic(&blocker.join("out.png"), b"data").unwrap_err();

        assert!(matches!(err, PlotError::Io { .. }), "{err}");
        assert_eq!(fs::read(&blocker).unwrap(), b"x");
    }

    #[test]
    fn missing_directory_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.png");

        let err = write_atomic(&path, b"data").unwrap_err();

        assert!(matches!(err, PlotError::Io { .. }), "{err}");
        assert!(!path.exists());
    }

    #[test]
    fn failed_rename_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        // a non-empty directory cannot be replaced by a file
        let path = dir.path().join("out.png");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep"), b"x").unwrap();

        let err = write_atomic(&path, b"data").unwrap_err();

        assert!(matches!(err, PlotError::Io { .. }), "{err}");
        assert_eq!(entries(dir.path()), vec!["out.png".to_string()]);
        assert_eq!(fs::read(path.join("keep")).unwrap(), b"x");
    }
}
