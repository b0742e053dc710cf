// ABOUTME: Public key export to the filesystem.
// ABOUTME: Writes one <short-title>.pub file per record that carries public key material.

use crate::error::{OpsshError, Result};
use crate::fingerprint::compute_fingerprint;
use crate::record::KeyRecord;
use std::path::{Path, PathBuf};

/// Writes public keys into a single export directory.
#[derive(Debug, Clone)]
pub struct KeyExporter {
    dir: PathBuf,
}

impl KeyExporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path the public key of a record with `short_title` is written to.
    pub fn key_path(&self, short_title: &str) -> PathBuf {
        self.dir.join(format!("{short_title}.pub"))
    }

    /// Create the export directory if needed. On Unix it is restricted to
    /// the owner (0700).
    pub fn prepare(&self) -> Result<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| OpsshError::CreateDirectory {
            path: self.dir.clone(),
            source: e,
        })?;

        #[cfg(unix)]
        set_mode(&self.dir, 0o700)?;

        Ok(())
    }

    /// Export every record that has a public key and record where it went.
    /// Returns the number of files written.
    pub fn export(&self, records: &mut [KeyRecord]) -> Result<usize> {
        self.prepare()?;

        let mut written = 0;
        for record in records.iter_mut() {
            let Some(public_key) = record.public_key.as_deref() else {
                tracing::debug!(title = %record.title, "no public key, nothing to export");
                continue;
            };

            let path = self.key_path(&record.short_title);
            write_public_key(&path, public_key)?;

            match compute_fingerprint(public_key) {
                Ok(fingerprint) => tracing::info!(
                    title = %record.title,
                    path = %path.display(),
                    %fingerprint,
                    "exported public key"
                ),
                Err(e) => tracing::warn!(
                    title = %record.title,
                    path = %path.display(),
                    error = %e,
                    "exported public key that does not parse as OpenSSH"
                ),
            }

            record.export_path = Some(path);
            written += 1;
        }
        Ok(written)
    }
}

fn write_public_key(path: &Path, public_key: &str) -> Result<()> {
    let contents = format!("{}\n", public_key.trim_end());
    std::fs::write(path, contents.as_bytes()).map_err(|e| OpsshError::WriteFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    #[cfg(unix)]
    set_mode(path, 0o644)?;

    Ok(())
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).map_err(|e| {
        OpsshError::SetPermissions {
            path: path.to_path_buf(),
            source: e,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const ED25519_PUB: &str =
        "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAILM+rvN+ot98qgEN796jTiQfZfG1KaT0PtFDJ/XFSqti user@example.com";

    fn record_with_key(title: &str, key: Option<&str>) -> KeyRecord {
        let mut record = KeyRecord::new(format!("id-{title}"), title);
        record.public_key = key.map(str::to_string);
        record
    }

    #[test]
    fn test_export_writes_pub_files() {
        let temp_dir = TempDir::new().expect("should create temp dir");
        let exporter = KeyExporter::new(temp_dir.path().join("1password"));
        let mut records = vec![
            record_with_key("Prod DB", Some(ED25519_PUB)),
            record_with_key("No Key", None),
        ];

        let written = exporter.export(&mut records).expect("should export");
        assert_eq!(written, 1);

        let path = temp_dir.path().join("1password").join("proddb.pub");
        assert_eq!(records[0].export_path.as_deref(), Some(path.as_path()));
        assert!(records[1].export_path.is_none());
        assert!(!temp_dir.path().join("1password").join("nokey.pub").exists());

        let contents = std::fs::read_to_string(&path).expect("should read key");
        assert_eq!(contents, format!("{ED25519_PUB}\n"));
    }

    #[test]
    fn test_export_normalizes_trailing_newlines() {
        let temp_dir = TempDir::new().unwrap();
        let exporter = KeyExporter::new(temp_dir.path());
        let mut records = vec![record_with_key("work", Some("ssh-ed25519 AAAA\n\n"))];

        exporter.export(&mut records).unwrap();
        let contents = std::fs::read_to_string(exporter.key_path("work")).unwrap();
        assert_eq!(contents, "ssh-ed25519 AAAA\n");
    }

    #[test]
    fn test_export_overwrites_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let exporter = KeyExporter::new(temp_dir.path());
        std::fs::write(exporter.key_path("work"), "stale").unwrap();

        let mut records = vec![record_with_key("work", Some(ED25519_PUB))];
        exporter.export(&mut records).unwrap();

        let contents = std::fs::read_to_string(exporter.key_path("work")).unwrap();
        assert!(contents.starts_with("ssh-ed25519 "));
    }

    #[test]
    fn test_key_path() {
        let exporter = KeyExporter::new("/home/me/.ssh/1password");
        assert_eq!(
            exporter.key_path("github"),
            PathBuf::from("/home/me/.ssh/1password/github.pub")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("keys");
        let exporter = KeyExporter::new(&dir);
        let mut records = vec![record_with_key("work", Some(ED25519_PUB))];
        exporter.export(&mut records).unwrap();

        let dir_mode = std::fs::metadata(&dir).unwrap().permissions().mode() & 0o777;
        assert_eq!(dir_mode, 0o700, "export dir should be owner-only");

        let file_mode = std::fs::metadata(exporter.key_path("work"))
            .unwrap()
            .permissions()
            .mode()
            & 0o777;
        assert_eq!(file_mode, 0o644, "public key should be world-readable");
    }

    #[test]
    fn test_export_into_file_path_fails() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();

        let exporter = KeyExporter::new(blocker.join("keys"));
        let mut records = vec![record_with_key("work", Some(ED25519_PUB))];
        let err = exporter.export(&mut records).unwrap_err();
        assert!(matches!(err, OpsshError::CreateDirectory { .. }));
    }
}
