//! Persistence of the joined document.
//!
//! The aggregate is written as indented JSON and read back from the same
//! path. Writes go through a temporary file in the target directory that
//! is renamed over the destination, so the previous file stays intact
//! until the new one is complete.

use crate::error::StoreError;
use crate::models::AggregatedUser;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Serialize `data` with indentation and replace the file at `path`.
pub fn write_aggregate(path: &Path, data: &[AggregatedUser]) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(data).map_err(|source| StoreError::Encode {
        path: path.to_path_buf(),
        source,
    })?;

    let write_error = |source: std::io::Error| StoreError::Write {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(write_error)?;

    let permissions = target_permissions(path);

    let mut staged = NamedTempFile::new_in(dir).map_err(write_error)?;
    debug!("Staging aggregate in {}", staged.path().display());
    staged.write_all(json.as_bytes()).map_err(write_error)?;
    staged.as_file().sync_all().map_err(write_error)?;
    // Staged files are private to the owner.
    if let Some(permissions) = permissions {
        staged
            .as_file()
            .set_permissions(permissions)
            .map_err(write_error)?;
    }
    staged.persist(path).map_err(|e| write_error(e.error))?;

    info!(
        "Saved {} users ({} bytes) to {}",
        data.len(),
        json.len(),
        path.display()
    );
    Ok(())
}

/// Mode for the written file: the one of the file being replaced, or
/// 0644 for a new file on unix.
fn target_permissions(path: &Path) -> Option<fs::Permissions> {
    if let Ok(meta) = fs::metadata(path) {
        return Some(meta.permissions());
    }

    #[cfg(unix)]
    let fresh = {
        use std::os::unix::fs::PermissionsExt;
        Some(fs::Permissions::from_mode(0o644))
    };
    #[cfg(not(unix))]
    let fresh = None;

    fresh
}

/// Read and parse the aggregate stored at `path`.
pub fn read_aggregate(path: &Path) -> Result<Vec<AggregatedUser>, StoreError> {
    let content = fs::read(path).map_err(|source| StoreError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let data: Vec<AggregatedUser> =
        serde_json::from_slice(&content).map_err(|source| StoreError::Decode {
            path: path.to_path_buf(),
            source,
        })?;

    debug!("Read {} users from {}", data.len(), path.display());
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::aggregate;
    use crate::models::{Comment, Post, User};

    fn sample() -> Vec<AggregatedUser> {
        let users: Vec<User> =
            serde_json::from_str(include_str!("../../fixtures/users.json")).unwrap();
        let posts: Vec<Post> =
            serde_json::from_str(include_str!("../../fixtures/posts.json")).unwrap();
        let comments: Vec<Comment> =
            serde_json::from_str(include_str!("../../fixtures/comments.json")).unwrap();
        aggregate(&users, &posts, &comments)
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        let data = sample();

        write_aggregate(&path, &data).unwrap();
        let first = read_aggregate(&path).unwrap();
        assert_eq!(first, data);

        write_aggregate(&path, &first).unwrap();
        let second = read_aggregate(&path).unwrap();
        assert_eq!(second, first);
    }

    #[test]
    fn test_output_is_indented() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");

        write_aggregate(&path, &sample()).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("[\n  {\n    \"user\": {"));
        assert!(text.contains("\"userId\": 1"));
        assert!(text.contains("\"comments\": ["));
    }

    #[test]
    fn test_write_replaces_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        fs::write(&path, "x".repeat(64 * 1024)).unwrap();

        write_aggregate(&path, &[]).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "[]");
        assert!(read_aggregate(&path).unwrap().is_empty());
    }

    #[test]
    fn test_write_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out").join("data.json");

        write_aggregate(&path, &sample()).unwrap();

        assert_eq!(read_aggregate(&path).unwrap().len(), 3);
    }

    #[cfg(unix)]
    #[test]
    fn test_write_keeps_existing_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let fresh = dir.path().join("fresh.json");
        write_aggregate(&fresh, &[]).unwrap();
        let mode = fs::metadata(&fresh).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);

        let private = dir.path().join("private.json");
        fs::write(&private, "[]").unwrap();
        fs::set_permissions(&private, fs::Permissions::from_mode(0o600)).unwrap();

        write_aggregate(&private, &sample()).unwrap();

        let mode = fs::metadata(&private).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(read_aggregate(&private).unwrap().len(), 3);
    }

    #[test]
    fn test_read_partial_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        fs::write(
            &path,
            r#"[{"user": {"id": 1, "name": "Alice"},
                 "posts": [{"post": {"id": 10, "userId": 1},
                            "comments": [{"id": 100, "postId": 10}]}]}]"#,
        )
        .unwrap();

        let data = read_aggregate(&path).unwrap();

        assert_eq!(data[0].user.name, "Alice");
        assert!(data[0].user.email.is_empty());
        assert!(data[0].posts[0].post.title.is_empty());
        assert_eq!(data[0].posts[0].comments[0].id, 100);
        assert_eq!(data[0].comment_count(), 1);
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");

        let err = read_aggregate(&path).unwrap_err();
        assert!(matches!(err, StoreError::Read { .. }));
    }

    #[test]
    fn test_read_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        fs::write(&path, "{\"user\": 1}").unwrap();

        let err = read_aggregate(&path).unwrap_err();
        assert!(matches!(err, StoreError::Decode { .. }));
    }
}
