use image::GenericImageView;
use std::collections::BTreeMap;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFilter {
    Flate,
    Dct,
}

impl ImageFilter {
    pub fn as_pdf_name(&self) -> &'static str {
        match self {
            ImageFilter::Flate => "/FlateDecode",
            ImageFilter::Dct => "/DCTDecode",
        }
    }
}

/// Raster image decoded into the shape a PDF image XObject needs.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAsset {
    pub width: u32,
    pub height: u32,
    pub color_space: &'static str,
    pub bits_per_component: u8,
    pub filter: ImageFilter,
    pub data: Vec<u8>,
    pub alpha: Option<Vec<u8>>,
}

impl ImageAsset {
    /// Placement of this image scaled to fit inside a `box_w` x `box_h` box,
    /// preserving aspect ratio. Returns `None` for degenerate sizes.
    pub fn fit_within(&self, box_w: f32, box_h: f32) -> Option<(f32, f32)> {
        if self.width == 0 || self.height == 0 || box_w <= 0.0 || box_h <= 0.0 {
            return None;
        }
        let scale = (box_w / self.width as f32).min(box_h / self.height as f32);
        if !scale.is_finite() || scale <= 0.0 {
            return None;
        }
        Some((self.width as f32 * scale, self.height as f32 * scale))
    }
}

/// Images referenced by a document, keyed by resource id.
#[derive(Debug, Clone, Default)]
pub struct AssetBundle {
    images: BTreeMap<String, ImageAsset>,
}

impl AssetBundle {
    pub fn insert_encoded(&mut self, resource_id: &str, bytes: &[u8]) -> Option<&ImageAsset> {
        let Some(asset) = decode_image_bytes(bytes) else {
            log::warn!("image {resource_id} could not be decoded; leaving it out");
            return None;
        };
        self.images.insert(resource_id.to_string(), asset);
        self.images.get(resource_id)
    }

    pub fn get(&self, resource_id: &str) -> Option<&ImageAsset> {
        self.images.get(resource_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ImageAsset)> {
        self.images.iter().map(|(id, asset)| (id.as_str(), asset))
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// JPEG data is passed through untouched; everything else is re-encoded as
/// Flate-compressed samples with a separate alpha mask when needed.
pub(crate) fn decode_image_bytes(data: &[u8]) -> Option<ImageAsset> {
    let format = image::guess_format(data).ok()?;
    let decoded = image::load_from_memory_with_format(data, format).ok()?;
    let (width, height) = decoded.dimensions();
    if width == 0 || height == 0 {
        return None;
    }

    if format == image::ImageFormat::Jpeg {
        let (color_space, supported) = match decoded.color() {
            image::ColorType::L8 => ("/DeviceGray", true),
            image::ColorType::Rgb8 => ("/DeviceRGB", true),
            _ => ("/DeviceRGB", false),
        };
        if supported {
            return Some(ImageAsset {
                width,
                height,
                color_space,
                bits_per_component: 8,
                filter: ImageFilter::Dct,
                data: data.to_vec(),
                alpha: None,
            });
        }
    }

    if matches!(decoded.color(), image::ColorType::L8 | image::ColorType::L16) {
        let gray = decoded.to_luma8();
        return Some(ImageAsset {
            width,
            height,
            color_space: "/DeviceGray",
            bits_per_component: 8,
            filter: ImageFilter::Flate,
            data: flate_compress(gray.as_raw()),
            alpha: None,
        });
    }

    let rgba = decoded.to_rgba8();
    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    let mut alpha = Vec::with_capacity((width * height) as usize);
    let mut has_alpha = false;
    for pixel in rgba.pixels() {
        let [r, g, b, a] = pixel.0;
        if a != 255 {
            has_alpha = true;
        }
        rgb.extend_from_slice(&[r, g, b]);
        alpha.push(a);
    }

    Some(ImageAsset {
        width,
        height,
        color_space: "/DeviceRGB",
        bits_per_component: 8,
        filter: ImageFilter::Flate,
        data: flate_compress(&rgb),
        alpha: has_alpha.then(|| flate_compress(&alpha)),
    })
}

pub(crate) fn flate_compress(data: &[u8]) -> Vec<u8> {
    use flate2::Compression;
    use flate2::write::ZlibEncoder;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    let _ = encoder.write_all(data);
    encoder.finish().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageBuffer, Luma, Rgba};
    use std::io::Cursor;

    fn png_bytes(img: DynamicImage) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png)
            .expect("encode png");
        out.into_inner()
    }

    #[test]
    fn grayscale_png_decodes_to_device_gray() {
        let img: ImageBuffer<Luma<u8>, Vec<u8>> = ImageBuffer::from_pixel(4, 3, Luma([0u8]));
        let asset = decode_image_bytes(&png_bytes(img.into())).expect("decode");
        assert_eq!((asset.width, asset.height), (4, 3));
        assert_eq!(asset.color_space, "/DeviceGray");
        assert_eq!(asset.filter, ImageFilter::Flate);
        assert!(asset.alpha.is_none());
    }

    #[test]
    fn translucent_png_carries_alpha_mask() {
        let img: ImageBuffer<Rgba<u8>, Vec<u8>> =
            ImageBuffer::from_pixel(2, 2, Rgba([10, 20, 30, 128]));
        let asset = decode_image_bytes(&png_bytes(img.into())).expect("decode");
        assert_eq!(asset.color_space, "/DeviceRGB");
        assert!(asset.alpha.is_some());
    }

    #[test]
    fn opaque_rgba_png_drops_alpha_mask() {
        let img: ImageBuffer<Rgba<u8>, Vec<u8>> =
            ImageBuffer::from_pixel(2, 2, Rgba([10, 20, 30, 255]));
        let asset = decode_image_bytes(&png_bytes(img.into())).expect("decode");
        assert!(asset.alpha.is_none());
    }

    #[test]
    fn garbage_bytes_are_rejected() {
        assert!(decode_image_bytes(b"\x89PNG\r\n\x1a\nbroken").is_none());
        assert!(decode_image_bytes(&[]).is_none());
    }

    #[test]
    fn fit_within_preserves_aspect_ratio() {
        let asset = ImageAsset {
            width: 200,
            height: 100,
            color_space: "/DeviceRGB",
            bits_per_component: 8,
            filter: ImageFilter::Flate,
            data: Vec::new(),
            alpha: None,
        };
        let (w, h) = asset.fit_within(96.0, 116.0).expect("fits");
        assert!((w - 96.0).abs() < 1e-3);
        assert!((h - 48.0).abs() < 1e-3);
        assert!(asset.fit_within(0.0, 10.0).is_none());
    }
}
