//! HTML → tall bitmap via headless Chromium.
//!
//! The report HTML is written into a temp directory and Chromium takes a
//! screenshot of a fixed `width × render_height` viewport. Anything taller
//! than the viewport is clipped; blank space below the content is dropped
//! later by the paginator.

use crate::error::ReportError;
use async_trait::async_trait;
use image::RgbImage;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// Renders an HTML document to an RGB bitmap.
#[async_trait]
pub trait HtmlRasterizer: Send + Sync {
    async fn rasterize(&self, html: &str, width: u32, height: u32) -> Result<RgbImage, ReportError>;
}

/// Executable names tried, in order, when no explicit path is configured.
pub const CHROME_CANDIDATES: &[&str] = &[
    "chromium",
    "chromium-browser",
    "google-chrome",
    "google-chrome-stable",
    "chrome",
];

/// [`HtmlRasterizer`] that shells out to a Chromium-family browser.
#[derive(Debug, Clone, Default)]
pub struct ChromeRasterizer {
    executable: Option<PathBuf>,
}

impl ChromeRasterizer {
    pub fn new(executable: Option<PathBuf>) -> Self {
        Self { executable }
    }

    fn candidates(&self) -> Vec<PathBuf> {
        match &self.executable {
            Some(path) => vec![path.clone()],
            None => CHROME_CANDIDATES.iter().map(PathBuf::from).collect(),
        }
    }
}

/// Command-line flags for one screenshot.
pub fn chrome_args(html_path: &Path, png_path: &Path, width: u32, height: u32) -> Vec<String> {
    vec![
        "--headless".into(),
        "--no-sandbox".into(),
        "--disable-gpu".into(),
        "--disable-dev-shm-usage".into(),
        "--hide-scrollbars".into(),
        format!("--window-size={width},{height}"),
        format!("--screenshot={}", png_path.display()),
        format!("file://{}", html_path.display()),
    ]
}

#[async_trait]
impl HtmlRasterizer for ChromeRasterizer {
    async fn rasterize(&self, html: &str, width: u32, height: u32) -> Result<RgbImage, ReportError> {
        let dir = tempfile::tempdir().map_err(|e| ReportError::io("creating render directory", e))?;
        let html_path = dir.path().join("report.html");
        let png_path = dir.path().join("report.png");
        tokio::fs::write(&html_path, html)
            .await
            .map_err(|e| ReportError::io("writing report HTML", e))?;

        let candidates = self.candidates();
        let args = chrome_args(&html_path, &png_path, width, height);
        let png = png_path.clone();

        tokio::task::spawn_blocking(move || screenshot_blocking(&candidates, &args, &png))
            .await
            .map_err(|e| ReportError::Internal(format!("Render task panicked: {}", e)))??;

        let image = load_screenshot(&png_path)?;
        info!("Rendered report HTML → {}x{} px", image.width(), image.height());
        Ok(image)
    }
}

fn screenshot_blocking(candidates: &[PathBuf], args: &[String], png: &Path) -> Result<(), ReportError> {
    let mut not_found = Vec::new();

    for exe in candidates {
        debug!("Trying {} for report screenshot", exe.display());
        let output = match Command::new(exe).args(args).output() {
            Ok(output) => output,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                not_found.push(exe.display().to_string());
                continue;
            }
            Err(e) => {
                return Err(ReportError::Render(format!(
                    "failed to execute {}: {e}",
                    exe.display()
                )))
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ReportError::Render(format!(
                "{} failed (exit code {}): {}",
                exe.display(),
                output
                    .status
                    .code()
                    .map_or_else(|| "unknown".to_string(), |c| c.to_string()),
                stderr.trim()
            )));
        }
        if !png.exists() {
            return Err(ReportError::Render("PNG snapshot not created".into()));
        }
        return Ok(());
    }

    Err(ReportError::Render(format!(
        "no Chromium executable found (tried {}); set --chrome-path",
        not_found.join(", ")
    )))
}

/// Decode a screenshot, normalising RGBA/grey to RGB.
pub fn load_screenshot(path: &Path) -> Result<RgbImage, ReportError> {
    let image = image::open(path)
        .map_err(|e| ReportError::Render(format!("unreadable screenshot {}: {e}", path.display())))?;
    if image.width() == 0 || image.height() == 0 {
        return Err(ReportError::Render("screenshot is empty".into()));
    }
    Ok(image.to_rgb8())
}
