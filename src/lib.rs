mod assets;
mod canvas;
mod compose;
mod config;
mod error;
mod fit;
mod font;
mod format;
mod layout;
mod output;
mod pdf;
mod pdfinspect;
mod qr;
mod resolve;
mod types;

pub use assets::{AssetBundle, ImageAsset, ImageFilter};
pub use canvas::{Canvas, Command, Document, Page};
pub use compose::{PHOTO_RESOURCE_ID, VERIFICATION_CODE_RESOURCE_ID, compose};
pub use config::{Branding, PathPolicy, RenderConfig};
pub use error::CertificateError;
pub use fit::{
    BoxedText, DEFAULT_MIN_FONT_SIZE, TextMeasure, fit_font_size, fit_lines_in_box,
    truncate_with_ellipsis, wrap_lines,
};
pub use font::{FontRegistry, FontStyle};
pub use format::{DateStyle, PLACEHOLDER, format_date, format_duration, format_timestamp};
pub use layout::{FitRange, Palette, Region};
pub use output::write_durably;
pub use pdf::{PdfOptions, document_to_pdf, document_to_writer};
pub use pdfinspect::{
    PdfImage, PdfInspectError, PdfInspectErrorCode, PdfInspectReport, inspect_pdf_bytes,
    inspect_pdf_path,
};
pub use qr::{VerificationCodeImage, encode as encode_verification_code};
pub use resolve::{ImageOrigin, ResolvedImage, ResourceResolver};
pub use types::{Color, Pt, Rect, Size};

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Everything printed on one certificate, plus where to put the file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CertificateRequest {
    pub output_path: PathBuf,
    pub certificate_number: String,
    pub verification_url: String,
    pub student_name: String,
    pub student_photo_source: Option<String>,
    pub course_title: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub issue_date: Option<NaiveDate>,
    pub performance_label: Option<String>,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSummary {
    pub output_path: PathBuf,
    pub bytes: usize,
    pub photo_embedded: bool,
}

/// A rendered certificate held in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedCertificate {
    pub pdf: Vec<u8>,
    pub photo_embedded: bool,
}

/// Renders certificates. Cloning is cheap, and clones can render concurrently;
/// each call works on its own canvas.
#[derive(Debug, Clone)]
pub struct CertificateRenderer {
    config: Arc<RenderConfig>,
    fonts: Arc<FontRegistry>,
    resolver: ResourceResolver,
}

impl CertificateRenderer {
    pub fn builder() -> CertificateRendererBuilder {
        CertificateRendererBuilder::new()
    }

    /// Renders `request` and durably writes it to `request.output_path`.
    pub async fn render(
        &self,
        request: &CertificateRequest,
    ) -> Result<RenderSummary, CertificateError> {
        if request.output_path.as_os_str().is_empty() {
            return Err(CertificateError::InvalidRequest(
                "outputPath is required".to_string(),
            ));
        }
        let RenderedCertificate {
            pdf,
            photo_embedded,
        } = self.render_to_bytes(request).await?;
        let bytes = pdf.len();
        let path = request.output_path.clone();
        let target = path.clone();
        tokio::task::spawn_blocking(move || write_durably(&target, &pdf)).await??;

        log::info!(
            "certificate {} written to {} ({bytes} bytes)",
            request.certificate_number,
            path.display()
        );
        Ok(RenderSummary {
            output_path: path,
            bytes,
            photo_embedded,
        })
    }

    /// The full pipeline without persistence.
    pub async fn render_to_bytes(
        &self,
        request: &CertificateRequest,
    ) -> Result<RenderedCertificate, CertificateError> {
        let (photo, code) = tokio::join!(
            self.resolver
                .resolve(request.student_photo_source.as_deref()),
            qr::encode_async(request.verification_url.clone()),
        );
        let code = code?;
        log::debug!(
            "inputs ready for {}: photo {}, code {} modules",
            request.certificate_number,
            if photo.is_some() { "resolved" } else { "absent" },
            code.modules
        );

        let generated_at = chrono::Local::now();
        let document = compose(
            request,
            photo.as_ref(),
            &code,
            &self.fonts,
            &self.config.branding,
            self.config.date_style,
            &generated_at,
        )?;
        let photo_embedded = document.images.get(PHOTO_RESOURCE_ID).is_some();

        let options = PdfOptions {
            title: Some(format!("Certificate {}", request.certificate_number)),
            subject: Some(format!(
                "{} - {}",
                request.student_name, request.course_title
            )),
            creation_date: Some(generated_at.with_timezone(&Utc)),
            ..PdfOptions::default()
        };
        let pdf = document_to_pdf(&document, &self.fonts, &options)
            .map_err(CertificateError::Serialize)?;
        Ok(RenderedCertificate {
            pdf,
            photo_embedded,
        })
    }
}

#[derive(Debug, Clone)]
pub struct CertificateRendererBuilder {
    config: RenderConfig,
}

impl Default for CertificateRendererBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CertificateRendererBuilder {
    pub fn new() -> Self {
        Self {
            config: RenderConfig::default(),
        }
    }

    pub fn from_config(config: RenderConfig) -> Self {
        Self { config }
    }

    pub fn asset_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.asset_root = path.into();
        self
    }

    pub fn path_policy(mut self, policy: PathPolicy) -> Self {
        self.config.path_policy = policy;
        self
    }

    pub fn photo_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.config.photo_fetch_timeout = Some(timeout);
        self
    }

    pub fn branding(mut self, branding: Branding) -> Self {
        self.config.branding = branding;
        self
    }

    pub fn date_style(mut self, style: DateStyle) -> Self {
        self.config.date_style = style;
        self
    }

    pub fn font_file(mut self, style: FontStyle, path: impl Into<PathBuf>) -> Self {
        self.config.font_files.push((style, path.into()));
        self
    }

    pub fn font_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.font_dir = Some(path.into());
        self
    }

    /// Loads fonts and prepares the HTTP client. Explicit font files win over
    /// styles picked up from the font directory.
    pub fn build(self) -> Result<CertificateRenderer, CertificateError> {
        let mut fonts = FontRegistry::new();
        if let Some(dir) = self.config.font_dir.as_deref() {
            let assigned = fonts.register_dir(dir);
            log::debug!("{assigned} font styles loaded from {}", dir.display());
        }
        for (style, path) in &self.config.font_files {
            fonts.register_file_for(*style, path)?;
        }
        let resolver = ResourceResolver::new(
            self.config.asset_root.clone(),
            self.config.path_policy,
            self.config.photo_fetch_timeout,
        )?;
        Ok(CertificateRenderer {
            config: Arc::new(self.config),
            fonts: Arc::new(fonts),
            resolver,
        })
    }
}

/// Reads a JSON request from `path`.
pub fn load_request(path: &Path) -> Result<CertificateRequest, CertificateError> {
    let raw = std::fs::read_to_string(path).map_err(|err| {
        CertificateError::InvalidRequest(format!("{}: {err}", path.display()))
    })?;
    serde_json::from_str(&raw).map_err(|err| {
        CertificateError::InvalidRequest(format!("{}: {err}", path.display()))
    })
}
