//! Background decoding of a logo file into a `data:` URI.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use thiserror::Error;

use crate::model::LogoImage;

#[derive(Debug, Error)]
pub enum LogoError {
    #[error("Failed to read logo {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Logo decode was cancelled")]
    Cancelled,

    #[error("Logo decode worker stopped unexpectedly")]
    WorkerLost,
}

pub fn mime_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        "ico" => "image/x-icon",
        _ => "application/octet-stream",
    }
}

pub fn encode_data_uri(mime: &str, bytes: &[u8]) -> LogoImage {
    LogoImage::from_data_uri(format!("data:{};base64,{}", mime, STANDARD.encode(bytes)))
}

/// Reads and encodes `path` on the calling thread.
pub fn decode_file(path: &Path) -> Result<LogoImage, LogoError> {
    let bytes = std::fs::read(path).map_err(|source| LogoError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(encode_data_uri(mime_type_for(path), &bytes))
}

/// An in-flight decode running on a worker thread.
pub struct LogoDecode {
    path: PathBuf,
    cancelled: Arc<AtomicBool>,
    rx: Receiver<Result<LogoImage, LogoError>>,
}

impl LogoDecode {
    pub fn start(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let cancelled = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mpsc::channel();

        let worker_path = path.clone();
        let worker_flag = Arc::clone(&cancelled);
        thread::spawn(move || {
            let result = decode_file(&worker_path);
            if worker_flag.load(Ordering::Acquire) {
                tracing::debug!("Discarding cancelled logo decode of {:?}", worker_path);
                return;
            }
            // Receiver may already be gone; nothing to report then.
            let _ = tx.send(result);
        });

        tracing::debug!("Started logo decode of {:?}", path);
        Self { path, cancelled, rx }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Non-blocking check; `None` while the worker is still running.
    pub fn try_take(&self) -> Option<Result<LogoImage, LogoError>> {
        if self.is_cancelled() {
            return Some(Err(LogoError::Cancelled));
        }
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(LogoError::WorkerLost)),
        }
    }

    pub fn wait(self) -> Result<LogoImage, LogoError> {
        if self.is_cancelled() {
            return Err(LogoError::Cancelled);
        }
        self.rx.recv().map_err(|_| LogoError::WorkerLost)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_mime_type_for() {
        assert_eq!(mime_type_for(Path::new("logo.PNG")), "image/png");
        assert_eq!(mime_type_for(Path::new("a/b/logo.jpeg")), "image/jpeg");
        assert_eq!(mime_type_for(Path::new("logo.svg")), "image/svg+xml");
        assert_eq!(mime_type_for(Path::new("logo")), "application/octet-stream");
    }

    #[test]
    fn test_encode_data_uri() {
        let logo = encode_data_uri("image/png", b"hello");
        assert_eq!(logo.as_str(), "data:image/png;base64,aGVsbG8=");
    }

    #[test]
    fn test_decode_in_background() {
        let mut file = tempfile::Builder::new().suffix(".gif").tempfile().unwrap();
        file.write_all(b"GIF89a").unwrap();

        let decode = LogoDecode::start(file.path());
        let logo = decode.wait().unwrap();
        assert_eq!(logo.as_str(), "data:image/gif;base64,R0lGODlh");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let decode = LogoDecode::start(dir.path().join("nope.png"));
        assert!(matches!(decode.wait(), Err(LogoError::Read { .. })));
    }

    #[test]
    fn test_cancelled_decode_yields_nothing() {
        let file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        let decode = LogoDecode::start(file.path());
        decode.cancel();
        assert!(matches!(decode.try_take(), Some(Err(LogoError::Cancelled))));
    }
}
