use crate::error::CertificateError;
use image::{GrayImage, ImageFormat, Luma};
use qrcode::QrCode;
use std::io::Cursor;

pub const PIXELS_PER_MODULE: u32 = 8;
pub const QUIET_ZONE_MODULES: u32 = 4;

/// PNG rendering of the verification URL as a QR symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationCodeImage {
    pub png: Vec<u8>,
    /// Symbol width in modules, excluding the quiet zone.
    pub modules: u32,
}

impl VerificationCodeImage {
    pub fn pixel_width(&self) -> u32 {
        (self.modules + 2 * QUIET_ZONE_MODULES) * PIXELS_PER_MODULE
    }
}

/// Encodes `url` at the default error-correction level. Output is a pure
/// function of the input.
pub fn encode(url: &str) -> Result<VerificationCodeImage, CertificateError> {
    let code = QrCode::new(url.as_bytes())?;
    let modules = code.width() as u32;
    let colors = code.to_colors();

    let side = (modules + 2 * QUIET_ZONE_MODULES) * PIXELS_PER_MODULE;
    let mut raster = GrayImage::from_pixel(side, side, Luma([255u8]));
    for (idx, color) in colors.iter().enumerate() {
        if *color != qrcode::Color::Dark {
            continue;
        }
        let col = idx as u32 % modules;
        let row = idx as u32 / modules;
        let x0 = (col + QUIET_ZONE_MODULES) * PIXELS_PER_MODULE;
        let y0 = (row + QUIET_ZONE_MODULES) * PIXELS_PER_MODULE;
        for y in y0..y0 + PIXELS_PER_MODULE {
            for x in x0..x0 + PIXELS_PER_MODULE {
                raster.put_pixel(x, y, Luma([0u8]));
            }
        }
    }

    let mut png = Vec::new();
    raster
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|err| CertificateError::Encoding(err.to_string()))?;
    log::debug!("encoded verification code: {modules} modules, {} bytes", png.len());
    Ok(VerificationCodeImage { png, modules })
}

/// [`encode`] on the blocking pool, so it can run alongside photo resolution.
pub async fn encode_async(url: String) -> Result<VerificationCodeImage, CertificateError> {
    tokio::task::spawn_blocking(move || encode(&url)).await?
}
