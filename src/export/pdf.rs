use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;

use crate::model::Invoice;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("PDF engine not available: {0}")]
    EngineUnavailable(String),

    #[error("PDF generation failed: {0}")]
    GenerationFailed(String),

    #[error("Invalid PDF file name: {0:?}")]
    InvalidFilename(String),

    #[error("Failed to prepare output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageFormat {
    Letter,
}

impl PageFormat {
    fn as_arg(&self) -> &'static str {
        match self {
            PageFormat::Letter => "Letter",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
}

impl Orientation {
    fn as_arg(&self) -> &'static str {
        match self {
            Orientation::Portrait => "Portrait",
        }
    }
}

/// Layout handed to the rasteriser. Margins are in inches.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfOptions {
    pub margin: f64,
    pub filename: String,
    pub image_type: &'static str,
    pub image_quality: f64,
    pub scale: f64,
    pub page_format: PageFormat,
    pub orientation: Orientation,
}

impl PdfOptions {
    pub fn for_invoice(invoice: &Invoice) -> Self {
        Self {
            margin: 1.0,
            filename: invoice.pdf_filename(),
            image_type: "jpeg",
            image_quality: 0.98,
            scale: 2.0,
            page_format: PageFormat::Letter,
            orientation: Orientation::Portrait,
        }
    }

    /// Command-line flags for wkhtmltopdf. Raster scale maps onto DPI (96 per unit).
    pub fn wkhtmltopdf_args(&self) -> Vec<String> {
        let margin = format!("{}in", self.margin);
        vec![
            "--page-size".into(),
            self.page_format.as_arg().into(),
            "--orientation".into(),
            self.orientation.as_arg().into(),
            "--margin-top".into(),
            margin.clone(),
            "--margin-bottom".into(),
            margin.clone(),
            "--margin-left".into(),
            margin.clone(),
            "--margin-right".into(),
            margin,
            "--image-quality".into(),
            format!("{}", (self.image_quality * 100.0).round() as u32),
            "--dpi".into(),
            format!("{}", (self.scale * 96.0).round() as u32),
            "--encoding".into(),
            "utf-8".into(),
            "--quiet".into(),
        ]
    }
}

/// Turns rendered markup into a paged binary document at `output`.
pub trait PdfEngine {
    fn render_pdf(&self, markup: &str, options: &PdfOptions, output: &Path) -> Result<(), PdfError>;
}

pub struct WkHtmlToPdf {
    binary: String,
}

impl WkHtmlToPdf {
    pub fn new(binary: Option<String>) -> Self {
        Self {
            binary: binary.unwrap_or_else(|| "wkhtmltopdf".to_string()),
        }
    }

    fn verify_installed(&self) -> Result<(), PdfError> {
        let output = Command::new(&self.binary)
            .arg("--version")
            .output()
            .map_err(|e| {
                PdfError::EngineUnavailable(format!(
                    "'{}' not found: {}. Please install wkhtmltopdf.",
                    self.binary, e
                ))
            })?;

        if !output.status.success() {
            return Err(PdfError::EngineUnavailable(format!(
                "'{}' is not working correctly",
                self.binary
            )));
        }
        Ok(())
    }
}

impl Default for WkHtmlToPdf {
    fn default() -> Self {
        Self::new(None)
    }
}

impl PdfEngine for WkHtmlToPdf {
    fn render_pdf(&self, markup: &str, options: &PdfOptions, output: &Path) -> Result<(), PdfError> {
        self.verify_installed()?;

        let mut child = Command::new(&self.binary)
            .args(options.wkhtmltopdf_args())
            .arg("-")
            .arg(output)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| PdfError::GenerationFailed(format!("failed to start {}: {}", self.binary, e)))?;

        let stdin = child.stdin.take();

        // stderr is drained while markup is still being fed, otherwise a chatty
        // engine fills its pipe and both sides block.
        let (result, written) = std::thread::scope(|scope| {
            let writer = scope.spawn(move || match stdin {
                Some(mut stdin) => stdin.write_all(markup.as_bytes()),
                None => Ok(()),
            });
            let result = child.wait_with_output();
            (result, writer.join())
        });

        let result = result
            .map_err(|e| PdfError::GenerationFailed(format!("{} did not finish: {}", self.binary, e)))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(PdfError::GenerationFailed(format!("{} failed: {}", self.binary, stderr.trim())));
        }

        match written {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                return Err(PdfError::GenerationFailed(format!("failed to stream markup: {}", e)));
            }
            Err(_) => {
                return Err(PdfError::GenerationFailed("markup writer panicked".to_string()));
            }
        }

        if !output.exists() {
            return Err(PdfError::GenerationFailed("PDF file was not created".to_string()));
        }

        Ok(())
    }
}

/// Writes `<output_dir>/<options.filename>` and returns its path.
pub fn export_pdf(
    engine: &dyn PdfEngine,
    markup: &str,
    options: &PdfOptions,
    output_dir: &Path,
) -> Result<PathBuf, PdfError> {
    let mut components = Path::new(&options.filename).components();
    if !matches!((components.next(), components.next()), (Some(Component::Normal(_)), None)) {
        return Err(PdfError::InvalidFilename(options.filename.clone()));
    }

    fs::create_dir_all(output_dir).map_err(|source| PdfError::OutputDir {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let path = output_dir.join(&options.filename);
    engine.render_pdf(markup, options, &path)?;
    tracing::info!("PDF written to {:?}", path);
    Ok(path)
}
