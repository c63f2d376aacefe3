//! Student photo storage and access logging.
//!
//! Photos are plain files under a configured root, referenced by the relative
//! path stored on the student row. Every successful download is appended to a
//! flat access log; appends are serialized through a mutex so concurrent
//! downloads never interleave lines, and a failing append never affects the
//! download itself.

use crate::error::AppError;
use chrono::Utc;
use std::{
    io::ErrorKind,
    path::{Component, Path, PathBuf},
    sync::Arc,
};
use tokio::{fs::OpenOptions, io::AsyncWriteExt, sync::Mutex};

/// Raw photo bytes plus the content type to serve them with.
#[derive(Debug)]
pub struct Photo {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
}

/// Content type from the file extension: PNG or, by default, JPEG.
pub fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("png") => "image/png",
        _ => "image/jpeg",
    }
}

#[derive(Debug, Clone)]
pub struct PhotoStore {
    root: PathBuf,
}

impl PhotoStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a stored reference under the root.
    ///
    /// Absolute references and references containing `..` are refused.
    fn resolve(&self, relative: &str) -> Option<PathBuf> {
        let relative = Path::new(relative);
        let plain = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_) | Component::CurDir));
        if !plain || relative.as_os_str().is_empty() {
            return None;
        }
        Some(self.root.join(relative))
    }

    /// Read a whole photo. `Ok(None)` if the reference does not point at a file.
    pub async fn read(&self, relative: &str) -> Result<Option<Photo>, AppError> {
        let Some(path) = self.resolve(relative) else {
            tracing::warn!(reference = relative, "photo reference outside photo root");
            return Ok(None);
        };

        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Ok(None),
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(AppError::Internal(format!("photo metadata: {err}"))),
        }

        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|err| AppError::Internal(format!("photo read: {err}")))?;

        Ok(Some(Photo {
            bytes,
            content_type: content_type_for(&path),
        }))
    }
}

/// One photo download, as recorded in the access log.
#[derive(Debug)]
pub struct PhotoAccess<'a> {
    pub legajo: &'a str,
    pub token: &'a str,
    pub ip: &'a str,
    pub user_agent: &'a str,
}

impl PhotoAccess<'_> {
    fn line(&self) -> String {
        format!(
            "[{}] Acceso a foto - Legajo: {}, Token: {}, IP: {}, UserAgent: {}\n",
            Utc::now().format("%Y-%m-%d %H:%M:%S"),
            self.legajo,
            self.token,
            self.ip,
            single_line(self.user_agent),
        )
    }
}

/// Caller-controlled text must not be able to forge extra log lines.
fn single_line(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}

#[derive(Debug, Clone)]
pub struct AccessLog {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl AccessLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Append one line, creating the log directory if needed.
    pub async fn append(&self, access: &PhotoAccess<'_>) -> std::io::Result<()> {
        let line = access.line();
        let _guard = self.lock.lock().await;

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await
    }

    /// Best-effort append: failures go to the diagnostic log only.
    pub async fn record(&self, access: &PhotoAccess<'_>) {
        if let Err(err) = self.append(access).await {
            tracing::warn!(
                error = %err,
                path = ?self.path,
                legajo = access.legajo,
                "failed to record photo access"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_types() {
        assert_eq!(content_type_for(Path::new("a/b.png")), "image/png");
        assert_eq!(content_type_for(Path::new("b.PNG")), "image/png");
        assert_eq!(content_type_for(Path::new("b.jpg")), "image/jpeg");
        assert_eq!(content_type_for(Path::new("b")), "image/jpeg");
    }

    #[test]
    fn references_cannot_escape_the_root() {
        let store = PhotoStore::new("/srv/fotos");
        assert_eq!(
            store.resolve("2024/1234.jpg"),
            Some(PathBuf::from("/srv/fotos/2024/1234.jpg"))
        );
        assert_eq!(store.resolve("../secret.txt"), None);
        assert_eq!(store.resolve("/etc/passwd"), None);
        assert_eq!(store.resolve(""), None);
    }

    #[tokio::test]
    async fn read_missing_and_present_files() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("1234.png"), b"png-bytes")
            .await
            .unwrap();
        let store = PhotoStore::new(dir.path());

        let photo = store.read("1234.png").await.unwrap().unwrap();
        assert_eq!(photo.bytes, b"png-bytes");
        assert_eq!(photo.content_type, "image/png");

        assert!(store.read("nope.jpg").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn concurrent_appends_keep_whole_lines() {
        let dir = tempfile::tempdir().unwrap();
        let log = AccessLog::new(dir.path().join("logs/acceso.log"));

        let mut handles = Vec::new();
        for i in 0..20 {
            let log = log.clone();
            handles.push(tokio::spawn(async move {
                let legajo = format!("L{i}");
                let access = PhotoAccess {
                    legajo: &legajo,
                    token: "ABCDEFGHIJ",
                    ip: "127.0.0.1",
                    user_agent: "agent\nforged",
                };
                log.append(&access).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let content = tokio::fs::read_to_string(dir.path().join("logs/acceso.log"))
            .await
            .unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 20);
        assert!(lines.iter().all(|l| l.contains("Acceso a foto - Legajo: L")));
        assert!(lines.iter().all(|l| l.ends_with("UserAgent: agent forged")));
    }

    #[tokio::test]
    async fn record_swallows_failures() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should be makes the open fail
        let log = AccessLog::new(dir.path().to_path_buf());
        let access = PhotoAccess {
            legajo: "1",
            token: "ABCDEFGHIJ",
            ip: "unknown",
            user_agent: "unknown",
        };
        log.record(&access).await;
        assert!(log.append(&access).await.is_err());
    }
}
