//! Input resolution: normalise a path, URL or uploaded bytes to a local file.
//!
//! pdfium needs a file-system path, so URLs and in-memory uploads are written
//! into a `TempDir` that lives as long as the returned [`ResolvedInput`].
//! Dropping it removes the temp file, including on error paths.
//!
//! Only two document kinds are accepted: PDFs (recognised by the `%PDF` magic
//! bytes) and plain-text files (recognised by a `.txt` extension).

use crate::error::ReportError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// What the resolved file contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Text,
}

/// The resolved input: a local path, or a temp file that is removed on drop.
#[derive(Debug)]
pub enum ResolvedInput {
    /// Input was already a local file.
    Local { path: PathBuf, kind: DocumentKind },
    /// Input was downloaded or uploaded into a temp directory.
    Temporary {
        path: PathBuf,
        kind: DocumentKind,
        _temp_dir: TempDir,
    },
}

impl ResolvedInput {
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local { path, .. } | ResolvedInput::Temporary { path, .. } => path,
        }
    }

    pub fn kind(&self) -> DocumentKind {
        match self {
            ResolvedInput::Local { kind, .. } | ResolvedInput::Temporary { kind, .. } => *kind,
        }
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve a path or URL to a readable document.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, ReportError> {
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        resolve_local(Path::new(input))
    }
}

/// Write uploaded bytes to a temp file named after `filename`.
///
/// Only the final path component of `filename` is used.
pub async fn resolve_bytes(bytes: &[u8], filename: &str) -> Result<ResolvedInput, ReportError> {
    let name = sanitize_filename(filename);
    let kind = detect_kind(Path::new(&name), bytes).ok_or_else(|| ReportError::UnsupportedInput {
        path: PathBuf::from(&name),
        magic: magic_of(bytes),
    })?;

    let temp_dir = TempDir::new().map_err(|e| ReportError::io("creating upload directory", e))?;
    let path = temp_dir.path().join(&name);
    tokio::fs::write(&path, bytes)
        .await
        .map_err(|e| ReportError::io("writing uploaded document", e))?;

    debug!("Upload staged at {} ({} bytes)", path.display(), bytes.len());
    Ok(ResolvedInput::Temporary {
        path,
        kind,
        _temp_dir: temp_dir,
    })
}

/// Read a text document, replacing invalid UTF-8 sequences.
pub async fn read_text(path: &Path) -> Result<String, ReportError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| ReportError::io(format!("reading {}", path.display()), e))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn resolve_local(path: &Path) -> Result<ResolvedInput, ReportError> {
    let path = path.to_path_buf();
    if !path.exists() {
        return Err(ReportError::FileNotFound { path });
    }

    let mut head = [0u8; 4];
    let read = match std::fs::File::open(&path) {
        Ok(mut f) => f.read(&mut head).unwrap_or(0),
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(ReportError::PermissionDenied { path });
        }
        Err(_) => return Err(ReportError::FileNotFound { path }),
    };

    let kind = detect_kind(&path, &head[..read]).ok_or(ReportError::UnsupportedInput {
        magic: head,
        path: path.clone(),
    })?;

    debug!("Resolved local {:?}: {}", kind, path.display());
    Ok(ResolvedInput::Local { path, kind })
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, ReportError> {
    info!("Downloading document from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ReportError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            ReportError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            ReportError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(ReportError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let filename = filename_from_url(url);
    let bytes = response
        .bytes()
        .await
        .map_err(|e| ReportError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let resolved = resolve_bytes(&bytes, &filename).await?;
    info!("Downloaded to: {}", resolved.path().display());
    Ok(resolved)
}

/// PDF by magic bytes first, then text by extension.
fn detect_kind(path: &Path, head: &[u8]) -> Option<DocumentKind> {
    if head.starts_with(b"%PDF") {
        return Some(DocumentKind::Pdf);
    }
    let is_txt = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("txt"));
    is_txt.then_some(DocumentKind::Text)
}

fn magic_of(bytes: &[u8]) -> [u8; 4] {
    let mut magic = [0u8; 4];
    let n = bytes.len().min(4);
    magic[..n].copy_from_slice(&bytes[..n]);
    magic
}

fn sanitize_filename(filename: &str) -> String {
    Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .unwrap_or("upload.pdf")
        .to_string()
}

fn filename_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }
    "downloaded.pdf".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/tender.pdf"));
        assert!(is_url("http://example.com/tender.pdf"));
        assert!(!is_url("/tmp/tender.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn detects_pdf_by_magic_and_text_by_extension() {
        assert_eq!(
            detect_kind(Path::new("x.bin"), b"%PDF-1.7"),
            Some(DocumentKind::Pdf)
        );
        assert_eq!(
            detect_kind(Path::new("notes.TXT"), b"hello"),
            Some(DocumentKind::Text)
        );
        assert_eq!(detect_kind(Path::new("image.png"), b"\x89PNG"), None);
    }

    #[test]
    fn filename_from_url_falls_back() {
        assert_eq!(filename_from_url("https://a.b/c/tender.pdf"), "tender.pdf");
        assert_eq!(filename_from_url("https://a.b/download"), "downloaded.pdf");
    }

    #[test]
    fn sanitize_strips_directories() {
        assert_eq!(sanitize_filename("../../etc/tender.txt"), "tender.txt");
        assert_eq!(sanitize_filename(""), "upload.pdf");
    }

    #[test]
    fn missing_local_file() {
        let err = resolve_local(Path::new("/definitely/not/here.pdf")).unwrap_err();
        assert!(matches!(err, ReportError::FileNotFound { .. }));
    }

    #[test]
    fn unsupported_local_file() {
        let mut f = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        f.write_all(b"\x89PNG\r\n").unwrap();
        let err = resolve_local(f.path()).unwrap_err();
        match err {
            ReportError::UnsupportedInput { magic, .. } => assert_eq!(&magic, b"\x89PNG"),
            other => panic!("unexpected: {other}"),
        }
    }

    #[tokio::test]
    async fn uploaded_text_is_staged_and_removed() {
        let resolved = resolve_bytes(b"Tender No. 42", "tender.txt").await.unwrap();
        assert_eq!(resolved.kind(), DocumentKind::Text);
        let path = resolved.path().to_path_buf();
        assert_eq!(read_text(&path).await.unwrap(), "Tender No. 42");
        drop(resolved);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn uploaded_garbage_is_rejected() {
        let err = resolve_bytes(b"GIF89a", "image.gif").await.unwrap_err();
        assert!(matches!(err, ReportError::UnsupportedInput { .. }));
    }
}
