//! Photo reference resolution.
//!
//! A reference is turned into raw image bytes or into nothing at all. Every
//! failure is logged and swallowed here so the certificate still renders,
//! just without a photo.

use crate::config::PathPolicy;
use crate::error::CertificateError;
use base64::Engine;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

/// Where a resolved photo came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageOrigin {
    Remote,
    Local,
    Inline,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedImage {
    pub bytes: Vec<u8>,
    pub origin: ImageOrigin,
}

/// Fetches photo bytes from URLs, the local asset root, or inline `data:`
/// URIs. Cheap to clone; clones share the HTTP connection pool.
#[derive(Debug, Clone)]
pub struct ResourceResolver {
    client: reqwest::Client,
    asset_root: PathBuf,
    policy: PathPolicy,
}

impl ResourceResolver {
    pub fn new(
        asset_root: impl Into<PathBuf>,
        policy: PathPolicy,
        timeout: Option<Duration>,
    ) -> Result<Self, CertificateError> {
        let mut builder = reqwest::Client::builder().user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            asset_root: asset_root.into(),
            policy,
        })
    }

    /// Resolves a photo reference. `None` means "no photo": the reference was
    /// absent or blank, or the image could not be obtained.
    pub async fn resolve(&self, source: Option<&str>) -> Option<ResolvedImage> {
        let source = source.map(str::trim).filter(|s| !s.is_empty())?;

        if is_remote(source) {
            return self.fetch_remote(source).await;
        }
        if has_scheme(source, "data:") {
            let bytes = decode_data_uri(source);
            if bytes.is_none() {
                log::warn!("photo data URI is malformed; rendering without photo");
            }
            return bytes.map(|bytes| ResolvedImage {
                bytes,
                origin: ImageOrigin::Inline,
            });
        }
        self.read_local(source).await
    }

    async fn fetch_remote(&self, url: &str) -> Option<ResolvedImage> {
        log::debug!("fetching photo from {url}");
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(err) => {
                log::warn!("photo fetch from {url} failed: {err}");
                return None;
            }
        };
        let status = response.status();
        if !status.is_success() {
            log::warn!("photo fetch from {url} returned {status}");
            return None;
        }
        match response.bytes().await {
            Ok(body) => Some(ResolvedImage {
                bytes: body.to_vec(),
                origin: ImageOrigin::Remote,
            }),
            Err(err) => {
                log::warn!("photo body from {url} could not be read: {err}");
                None
            }
        }
    }

    async fn read_local(&self, source: &str) -> Option<ResolvedImage> {
        let candidate = self.local_candidate(source);
        if self.policy == PathPolicy::Contained && !self.is_contained(&candidate).await {
            log::warn!(
                "photo path {} escapes asset root {}; ignoring it",
                candidate.display(),
                self.asset_root.display()
            );
            return None;
        }
        match tokio::fs::read(&candidate).await {
            Ok(bytes) => Some(ResolvedImage {
                bytes,
                origin: ImageOrigin::Local,
            }),
            Err(err) => {
                log::warn!("photo {} could not be read: {err}", candidate.display());
                None
            }
        }
    }

    /// Local references are always rooted at the asset root; a leading
    /// separator does not make them host-absolute.
    fn local_candidate(&self, source: &str) -> PathBuf {
        self.asset_root
            .join(source.trim_start_matches(['/', '\\']))
    }

    async fn is_contained(&self, candidate: &Path) -> bool {
        let Ok(root) = tokio::fs::canonicalize(&self.asset_root).await else {
            return false;
        };
        match tokio::fs::canonicalize(candidate).await {
            Ok(resolved) => resolved.starts_with(&root),
            // Missing files cannot be canonicalized; judge them lexically so the
            // log says "escapes" rather than "not found" for `../` paths.
            Err(_) => lexically_within(candidate, &self.asset_root),
        }
    }
}

fn has_scheme(source: &str, scheme: &str) -> bool {
    source
        .get(..scheme.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
}

fn is_remote(source: &str) -> bool {
    has_scheme(source, "http://") || has_scheme(source, "https://")
}

fn lexically_within(candidate: &Path, root: &Path) -> bool {
    let Ok(rest) = candidate.strip_prefix(root) else {
        return false;
    };
    let mut depth = 0i32;
    for component in rest.components() {
        match component {
            Component::ParentDir => depth -= 1,
            Component::Normal(_) => depth += 1,
            _ => {}
        }
        if depth < 0 {
            return false;
        }
    }
    true
}

/// Decodes `data:[<mime>][;base64],<payload>`. Non-base64 payloads are
/// percent-decoded.
pub(crate) fn decode_data_uri(uri: &str) -> Option<Vec<u8>> {
    if !has_scheme(uri, "data:") {
        return None;
    }
    let (header, payload) = uri.split_once(',')?;
    let bytes = if header.to_ascii_lowercase().ends_with(";base64") {
        let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
        base64::engine::general_purpose::STANDARD
            .decode(compact.as_bytes())
            .ok()?
    } else {
        decode_percent_encoded(payload)?
    };
    (!bytes.is_empty()).then_some(bytes)
}

fn decode_percent_encoded(input: &str) -> Option<Vec<u8>> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0usize;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = input.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    Some(out)
}
