use crate::font::FontStyle;
use crate::format::DateStyle;
use std::path::PathBuf;
use std::time::Duration;

/// How local photo paths are confined relative to the asset root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PathPolicy {
    /// Leading separators are stripped and the path is joined onto the asset
    /// root, but `..` components are followed. Not a security boundary.
    #[default]
    Lenient,
    /// The resolved file must canonicalize to a location under the asset root.
    Contained,
}

impl PathPolicy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "lenient" => Some(PathPolicy::Lenient),
            "contained" | "strict" => Some(PathPolicy::Contained),
            _ => None,
        }
    }
}

/// Fixed institutional copy printed on every certificate.
#[derive(Debug, Clone, PartialEq)]
pub struct Branding {
    pub institution: String,
    pub tagline: String,
    pub section_title: String,
    pub decorative_title: String,
    pub intro: String,
    pub continuation: String,
    pub footer: String,
    pub signatory_caption: String,
    pub seal_caption: String,
    pub photo_caption: String,
    pub qr_caption: String,
    pub qr_subtext: String,
}

impl Default for Branding {
    fn default() -> Self {
        Self {
            institution: "Institute of Applied Learning".to_string(),
            tagline: "Excellence in Education and Professional Development".to_string(),
            section_title: "CERTIFICATE OF COMPLETION".to_string(),
            decorative_title: "Certificate of Achievement".to_string(),
            intro: "This is to certify that".to_string(),
            continuation: "has successfully completed the course below, fulfilling all \
                           requirements with dedication and commitment to learning."
                .to_string(),
            footer: "This certificate is issued electronically and can be verified \
                     by scanning the QR code or visiting the verification page."
                .to_string(),
            signatory_caption: "Authorized Signatory".to_string(),
            seal_caption: "Seal".to_string(),
            photo_caption: "STUDENT PHOTO".to_string(),
            qr_caption: "Scan to Verify".to_string(),
            qr_subtext: "Confirms this certificate online".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    pub asset_root: PathBuf,
    pub path_policy: PathPolicy,
    /// `None` leaves the HTTP client's defaults in place, which means a slow
    /// photo host can stall its render indefinitely.
    pub photo_fetch_timeout: Option<Duration>,
    pub date_style: DateStyle,
    pub font_dir: Option<PathBuf>,
    pub font_files: Vec<(FontStyle, PathBuf)>,
    pub branding: Branding,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            asset_root: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            path_policy: PathPolicy::default(),
            photo_fetch_timeout: None,
            date_style: DateStyle::default(),
            font_dir: None,
            font_files: Vec::new(),
            branding: Branding::default(),
        }
    }
}

impl RenderConfig {
    /// Loads `.env` if present, then overlays `CERTFORGE_*` variables on the
    /// defaults. Unparsable values are logged and ignored.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = RenderConfig::default();

        if let Some(root) = lookup("CERTFORGE_ASSET_ROOT") {
            config.asset_root = PathBuf::from(root);
        }
        if let Some(raw) = lookup("CERTFORGE_PATH_POLICY") {
            match PathPolicy::parse(&raw) {
                Some(policy) => config.path_policy = policy,
                None => log::warn!("ignoring CERTFORGE_PATH_POLICY={raw}"),
            }
        }
        if let Some(raw) = lookup("CERTFORGE_FETCH_TIMEOUT_SECS") {
            match raw.trim().parse::<u64>() {
                Ok(0) => config.photo_fetch_timeout = None,
                Ok(secs) => config.photo_fetch_timeout = Some(Duration::from_secs(secs)),
                Err(_) => log::warn!("ignoring CERTFORGE_FETCH_TIMEOUT_SECS={raw}"),
            }
        }
        if let Some(raw) = lookup("CERTFORGE_DATE_STYLE") {
            match DateStyle::parse(&raw) {
                Some(style) => config.date_style = style,
                None => log::warn!("ignoring CERTFORGE_DATE_STYLE={raw}"),
            }
        }
        if let Some(dir) = lookup("CERTFORGE_FONT_DIR") {
            config.font_dir = Some(PathBuf::from(dir));
        }
        if let Some(name) = lookup("CERTFORGE_INSTITUTION").filter(|v| !v.trim().is_empty()) {
            config.branding.institution = name;
        }
        if let Some(tagline) = lookup("CERTFORGE_TAGLINE").filter(|v| !v.trim().is_empty()) {
            config.branding.tagline = tagline;
        }
        if let Some(footer) = lookup("CERTFORGE_FOOTER").filter(|v| !v.trim().is_empty()) {
            config.branding.footer = footer;
        }

        config
    }
}
