use crate::error::CertificateError;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Writes `bytes` to `path` so that the target either keeps its previous
/// content or holds the complete new file. Data is flushed to disk before the
/// rename, and a failed attempt removes its temp file.
pub fn write_durably(path: &Path, bytes: &[u8]) -> Result<(), CertificateError> {
    if path.as_os_str().is_empty() {
        return Err(CertificateError::InvalidRequest(
            "output path is empty".to_string(),
        ));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|err| CertificateError::write(path, err))?;
    }

    let temp = temp_sibling(path);
    let result = write_and_sync(&temp, bytes).and_then(|()| std::fs::rename(&temp, path));
    if let Err(err) = result {
        match std::fs::remove_file(&temp) {
            Err(cleanup) if cleanup.kind() != std::io::ErrorKind::NotFound => {
                log::warn!("could not remove temp file {}: {cleanup}", temp.display());
            }
            _ => {}
        }
        return Err(CertificateError::write(path, err));
    }
    log::debug!("wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

fn write_and_sync(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "certificate".to_string());
    let nonce = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    path.with_file_name(format!(".{name}.{}.{nonce}.tmp", std::process::id()))
}
