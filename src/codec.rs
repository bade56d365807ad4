// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
// base64 图像编解码

use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageDecoder, ImageReader, RgbImage};
use thiserror::Error;

/// JPEG 编码质量
pub const JPEG_QUALITY: u8 = 95;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Invalid base64 encoding: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Failed to decode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("Failed to read image data: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image data is empty")]
    Empty,
}

/// base64 → RGB 图像
///
/// 忽略空白字符和 `data:image/...;base64,` 前缀, 按 EXIF 方向旋转
pub fn decode(base64_str: &str) -> Result<DynamicImage, CodecError> {
    let payload = match base64_str.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => base64_str,
    };
    let cleaned: String = payload
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    let bytes = STANDARD.decode(cleaned)?;
    if bytes.is_empty() {
        return Err(CodecError::Empty);
    }

    let mut decoder = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .into_decoder()?;
    let orientation = decoder.orientation()?;
    let mut image = DynamicImage::from_decoder(decoder)?;
    image.apply_orientation(orientation);
    Ok(DynamicImage::ImageRgb8(image.into_rgb8()))
}

/// RGB 图像 → JPEG → base64
pub fn encode(image: &RgbImage) -> Result<String, CodecError> {
    let mut buf = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY);
    image.write_with_encoder(encoder)?;
    Ok(STANDARD.encode(buf.into_inner()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgb};

    #[test]
    fn test_roundtrip_keeps_dimensions() {
        let img = RgbImage::from_pixel(37, 21, Rgb([200, 30, 90]));
        let b64 = encode(&img).unwrap();
        let back = decode(&b64).unwrap();
        assert_eq!(back.dimensions(), (37, 21));
    }

    #[test]
    fn test_decode_png_and_data_url() {
        let img = RgbImage::from_pixel(8, 4, Rgb([1, 2, 3]));
        let mut png = Cursor::new(Vec::new());
        img.write_to(&mut png, image::ImageFormat::Png).unwrap();
        let b64 = STANDARD.encode(png.into_inner());

        let plain = decode(&b64).unwrap();
        assert_eq!(plain.dimensions(), (8, 4));
        assert_eq!(plain.to_rgb8().get_pixel(0, 0), &Rgb([1, 2, 3]));

        let wrapped = format!("data:image/png;base64,{}\n", b64);
        assert_eq!(decode(&wrapped).unwrap().dimensions(), (8, 4));
    }

    #[test]
    fn test_decode_applies_exif_orientation() {
        let img = RgbImage::from_pixel(40, 20, Rgb([10, 120, 200]));
        let jpeg = STANDARD.decode(encode(&img).unwrap()).unwrap();

        // APP1 Exif, 小端 TIFF, 单个 IFD 条目: Orientation (0x0112) = 6, 顺时针 90°
        let app1: [u8; 36] = [
            0xFF, 0xE1, 0x00, 0x22, b'E', b'x', b'i', b'f', 0x00, 0x00, b'I', b'I', 0x2A, 0x00,
            0x08, 0x00, 0x00, 0x00, 0x01, 0x00, 0x12, 0x01, 0x03, 0x00, 0x01, 0x00, 0x00, 0x00,
            0x06, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ];
        let mut tagged = jpeg[..2].to_vec();
        tagged.extend_from_slice(&app1);
        tagged.extend_from_slice(&jpeg[2..]);

        let decoded = decode(&STANDARD.encode(tagged)).unwrap();
        assert_eq!(decoded.dimensions(), (20, 40));
    }

    #[test]
    fn test_invalid_base64() {
        assert!(matches!(decode("@@not base64@@"), Err(CodecError::Base64(_))));
    }

    #[test]
    fn test_not_an_image() {
        let b64 = STANDARD.encode(b"hello world");
        assert!(matches!(decode(&b64), Err(CodecError::Image(_))));
    }

    #[test]
    fn test_empty() {
        assert!(matches!(decode(""), Err(CodecError::Empty)));
    }
}
