//! Frame decoding service
//!
//! Separates byte-level decoding from the resize pipeline. The default
//! decoder guesses the format from content, applies EXIF orientation to still
//! images, expands animated GIF, APNG and WebP files into all of their frames,
//! and splits transparency out as a separate alpha channel. Palette GIF frames
//! carry no alpha channel. 16-bit sources are rescaled linearly to 8 bit by the
//! RGB conversion.

use crate::error::{MaskLoadError, Result};
use crate::types::DecodedFrame;
use image::codecs::gif::GifDecoder;
use image::codecs::png::PngDecoder;
#[cfg(feature = "webp-support")]
use image::codecs::webp::WebPDecoder;
use image::{
    AnimationDecoder, DynamicImage, Frame, GrayImage, ImageDecoder, ImageFormat, ImageReader,
};
use std::io::Cursor;

/// Turns raw file bytes into one or more frames
pub trait FrameDecoder {
    /// Decode every frame contained in `data`
    ///
    /// # Errors
    ///
    /// Returns `MaskLoadError` when the bytes are not a supported image
    fn decode(&self, data: &[u8]) -> Result<Vec<DecodedFrame>>;
}

/// Default decoder backed by the `image` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageFrameDecoder;

impl ImageFrameDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Decode a single still image with EXIF orientation applied
    pub fn decode_still(data: &[u8]) -> Result<DynamicImage> {
        let mut decoder = ImageReader::new(Cursor::new(data))
            .with_guessed_format()?
            .into_decoder()?;
        let orientation = decoder.orientation()?;
        let mut image = DynamicImage::from_decoder(decoder)?;
        image.apply_orientation(orientation);
        Ok(image)
    }

    fn decode_gif(data: &[u8]) -> Result<Vec<DynamicImage>> {
        let frames = GifDecoder::new(Cursor::new(data))?
            .into_frames()
            .collect_frames()?;
        Ok(into_images(frames, false))
    }

    fn decode_png(data: &[u8]) -> Result<Vec<DynamicImage>> {
        let decoder = PngDecoder::new(Cursor::new(data))?;
        if !decoder.is_apng()? {
            return Ok(vec![Self::decode_still(data)?]);
        }
        let keep_alpha = decoder.color_type().has_alpha();
        let frames = decoder.apng()?.into_frames().collect_frames()?;
        Ok(into_images(frames, keep_alpha))
    }

    #[cfg(feature = "webp-support")]
    fn decode_webp(data: &[u8]) -> Result<Vec<DynamicImage>> {
        let decoder = WebPDecoder::new(Cursor::new(data))?;
        if !decoder.has_animation() {
            return Ok(vec![Self::decode_still(data)?]);
        }
        let keep_alpha = decoder.color_type().has_alpha();
        let frames = decoder.into_frames().collect_frames()?;
        Ok(into_images(frames, keep_alpha))
    }
}

/// Composited animation frames, dropping alpha when the source has none
fn into_images(frames: Vec<Frame>, keep_alpha: bool) -> Vec<DynamicImage> {
    frames
        .into_iter()
        .map(|frame| {
            let image = DynamicImage::ImageRgba8(frame.into_buffer());
            if keep_alpha {
                image
            } else {
                DynamicImage::ImageRgb8(image.to_rgb8())
            }
        })
        .collect()
}

impl FrameDecoder for ImageFrameDecoder {
    fn decode(&self, data: &[u8]) -> Result<Vec<DecodedFrame>> {
        let format = image::guess_format(data)?;
        let images = match format {
            ImageFormat::Gif => Self::decode_gif(data)?,
            ImageFormat::Png => Self::decode_png(data)?,
            #[cfg(feature = "webp-support")]
            ImageFormat::WebP => Self::decode_webp(data)?,
            _ => vec![Self::decode_still(data)?],
        };

        log::trace!("Decoded {} frame(s) as {:?}", images.len(), format);

        images
            .iter()
            .map(|image| DecodedFrame::new(image.to_rgb8(), alpha_channel(image)))
            .collect()
    }
}

/// Extract the alpha channel of an image, if it has one
#[must_use]
pub fn alpha_channel(image: &DynamicImage) -> Option<GrayImage> {
    if !image.color().has_alpha() {
        return None;
    }
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    GrayImage::from_raw(width, height, rgba.pixels().map(|p| p[3]).collect())
}

/// Decode `data`, attaching the source name to any failure
pub fn decode_with_context(
    decoder: &dyn FrameDecoder,
    data: &[u8],
    source_name: &str,
) -> Result<Vec<DecodedFrame>> {
    decoder.decode(data).map_err(|e| {
        MaskLoadError::processing_stage_error(
            "image decoding",
            &e.to_string(),
            Some(&format!("source: {}, size: {} bytes", source_name, data.len())),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::gif::GifEncoder;
    use image::codecs::jpeg::JpegEncoder;
    use image::{Delay, ImageBuffer, Luma, LumaA, Rgb, RgbImage, Rgba, RgbaImage};

    fn encode(image: &DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut bytes = Cursor::new(Vec::new());
        image.write_to(&mut bytes, format).unwrap();
        bytes.into_inner()
    }

    #[test]
    fn test_decode_opaque_png() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(5, 3, Rgb([1, 2, 3])));
        let frames = ImageFrameDecoder::new()
            .decode(&encode(&image, ImageFormat::Png))
            .unwrap();

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].image.dimensions(), (5, 3));
        assert!(frames[0].alpha.is_none());
        assert_eq!(*frames[0].image.get_pixel(4, 2), Rgb([1, 2, 3]));
    }

    #[test]
    fn test_decode_keeps_alpha() {
        let rgba = RgbaImage::from_fn(4, 4, |x, _| Rgba([10, 20, 30, (x * 60) as u8]));
        let frames = ImageFrameDecoder::new()
            .decode(&encode(&DynamicImage::ImageRgba8(rgba), ImageFormat::Png))
            .unwrap();

        let alpha = frames[0].alpha.as_ref().unwrap();
        assert_eq!(alpha.get_pixel(0, 0)[0], 0);
        assert_eq!(alpha.get_pixel(3, 0)[0], 180);
        assert_eq!(*frames[0].image.get_pixel(1, 1), Rgb([10, 20, 30]));
    }

    #[test]
    fn test_decode_gray_alpha() {
        let la = ImageBuffer::from_pixel(2, 2, LumaA([90u8, 64]));
        let frames = ImageFrameDecoder::new()
            .decode(&encode(&DynamicImage::ImageLumaA8(la), ImageFormat::Png))
            .unwrap();
        assert_eq!(*frames[0].image.get_pixel(0, 0), Rgb([90, 90, 90]));
        assert_eq!(frames[0].alpha.as_ref().unwrap().get_pixel(1, 1)[0], 64);
    }

    #[test]
    fn test_decode_sixteen_bit_is_rescaled() {
        let wide = ImageBuffer::from_pixel(2, 2, Luma([65535u16]));
        let frames = ImageFrameDecoder::new()
            .decode(&encode(&DynamicImage::ImageLuma16(wide), ImageFormat::Png))
            .unwrap();
        assert_eq!(*frames[0].image.get_pixel(0, 0), Rgb([255, 255, 255]));
    }

    #[test]
    fn test_decode_jpeg() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(16, 8, Rgb([128, 128, 128])));
        let frames = ImageFrameDecoder::new()
            .decode(&encode(&image, ImageFormat::Jpeg))
            .unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].image.dimensions(), (16, 8));
    }

    #[test]
    fn test_decode_animated_gif_yields_every_frame() {
        let mut bytes = Vec::new();
        {
            let mut encoder = GifEncoder::new(&mut bytes);
            let frames = (0..3).map(|i| {
                Frame::from_parts(
                    RgbaImage::from_pixel(6, 4, Rgba([i * 80, 0, 0, 255])),
                    0,
                    0,
                    Delay::from_numer_denom_ms(100, 1),
                )
            });
            encoder.encode_frames(frames).unwrap();
        }

        let frames = ImageFrameDecoder::new().decode(&bytes).unwrap();
        assert_eq!(frames.len(), 3);
        assert!(frames.iter().all(|f| f.image.dimensions() == (6, 4)));
        assert!(frames.iter().all(|f| f.alpha.is_none()));
    }

    #[test]
    fn test_decode_gif_transparency_is_not_alpha() {
        let mut bytes = Vec::new();
        {
            let mut encoder = GifEncoder::new(&mut bytes);
            let frame = RgbaImage::from_fn(4, 4, |x, _| {
                if x < 2 {
                    Rgba([0, 0, 0, 0])
                } else {
                    Rgba([0, 200, 0, 255])
                }
            });
            encoder
                .encode_frame(Frame::from_parts(frame, 0, 0, Delay::from_numer_denom_ms(50, 1)))
                .unwrap();
        }

        let frames = ImageFrameDecoder::new().decode(&bytes).unwrap();
        assert_eq!(frames.len(), 1);
        assert!(frames[0].alpha.is_none());
    }

    /// JPEG with an APP1 Exif segment carrying only an orientation tag
    fn jpeg_with_orientation(image: &RgbImage, orientation: u16) -> Vec<u8> {
        let mut plain = Vec::new();
        JpegEncoder::new(&mut plain).encode_image(image).unwrap();

        let mut tiff = vec![b'I', b'I', 42, 0, 8, 0, 0, 0, 1, 0];
        tiff.extend_from_slice(&0x0112u16.to_le_bytes());
        tiff.extend_from_slice(&3u16.to_le_bytes());
        tiff.extend_from_slice(&1u32.to_le_bytes());
        tiff.extend_from_slice(&orientation.to_le_bytes());
        tiff.extend_from_slice(&[0, 0, 0, 0, 0, 0]);

        let mut segment = b"Exif\0\0".to_vec();
        segment.extend_from_slice(&tiff);
        let length = u16::try_from(segment.len() + 2).unwrap();

        let mut bytes = plain[..2].to_vec();
        bytes.extend_from_slice(&[0xFF, 0xE1]);
        bytes.extend_from_slice(&length.to_be_bytes());
        bytes.extend_from_slice(&segment);
        bytes.extend_from_slice(&plain[2..]);
        bytes
    }

    #[test]
    fn test_decode_applies_exif_orientation() {
        let image = RgbImage::from_pixel(32, 16, Rgb([90, 90, 90]));

        let rotated = ImageFrameDecoder::new()
            .decode(&jpeg_with_orientation(&image, 6))
            .unwrap();
        assert_eq!(rotated.len(), 1);
        assert_eq!(rotated[0].image.dimensions(), (16, 32));

        let upright = ImageFrameDecoder::new()
            .decode(&jpeg_with_orientation(&image, 1))
            .unwrap();
        assert_eq!(upright[0].image.dimensions(), (32, 16));
    }

    #[test]
    fn test_decode_apng_yields_every_frame() {
        let frames: Vec<RgbaImage> = (0..3u8)
            .map(|i| RgbaImage::from_pixel(5, 7, Rgba([i * 60, 10, 20, 128])))
            .collect();

        let mut bytes = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut bytes, 5, 7);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            encoder.set_animated(3, 0).unwrap();
            let mut writer = encoder.write_header().unwrap();
            for frame in &frames {
                writer.write_image_data(frame.as_raw()).unwrap();
            }
            writer.finish().unwrap();
        }

        let decoded = ImageFrameDecoder::new().decode(&bytes).unwrap();
        assert_eq!(decoded.len(), 3);
        assert!(decoded.iter().all(|f| f.image.dimensions() == (5, 7)));
        assert_eq!(decoded[2].alpha.as_ref().unwrap().get_pixel(4, 6)[0], 128);
    }

    #[cfg(feature = "webp-support")]
    fn riff_chunk(fourcc: &[u8; 4], payload: &[u8]) -> Vec<u8> {
        let mut chunk = fourcc.to_vec();
        chunk.extend_from_slice(&u32::try_from(payload.len()).unwrap().to_le_bytes());
        chunk.extend_from_slice(payload);
        if payload.len() % 2 == 1 {
            chunk.push(0);
        }
        chunk
    }

    #[cfg(feature = "webp-support")]
    fn u24(value: u32) -> [u8; 3] {
        let [a, b, c, _] = value.to_le_bytes();
        [a, b, c]
    }

    /// Extended WebP with one lossless ANMF chunk per frame
    #[cfg(feature = "webp-support")]
    fn animated_webp(frames: &[RgbaImage]) -> Vec<u8> {
        use image::codecs::webp::WebPEncoder;
        use image::ExtendedColorType;

        let (width, height) = frames[0].dimensions();
        let mut vp8x = vec![0b0001_0010, 0, 0, 0];
        vp8x.extend_from_slice(&u24(width - 1));
        vp8x.extend_from_slice(&u24(height - 1));

        let mut body = b"WEBP".to_vec();
        body.extend(riff_chunk(b"VP8X", &vp8x));
        body.extend(riff_chunk(b"ANIM", &[0, 0, 0, 0, 0, 0]));

        for frame in frames {
            let mut still = Vec::new();
            WebPEncoder::new_lossless(&mut still)
                .encode(frame.as_raw(), width, height, ExtendedColorType::Rgba8)
                .unwrap();

            let mut anmf = Vec::new();
            anmf.extend_from_slice(&u24(0));
            anmf.extend_from_slice(&u24(0));
            anmf.extend_from_slice(&u24(width - 1));
            anmf.extend_from_slice(&u24(height - 1));
            anmf.extend_from_slice(&u24(100));
            anmf.push(0b0000_0010);
            // Skip the simple container's RIFF header, keep its VP8L chunk
            anmf.extend_from_slice(&still[12..]);
            body.extend(riff_chunk(b"ANMF", &anmf));
        }

        let mut bytes = b"RIFF".to_vec();
        bytes.extend_from_slice(&u32::try_from(body.len()).unwrap().to_le_bytes());
        bytes.extend(body);
        bytes
    }

    #[cfg(feature = "webp-support")]
    #[test]
    fn test_decode_animated_webp_yields_every_frame() {
        let frames = [
            RgbaImage::from_pixel(6, 4, Rgba([255, 0, 0, 255])),
            RgbaImage::from_pixel(6, 4, Rgba([0, 0, 255, 64])),
        ];
        let decoded = ImageFrameDecoder::new().decode(&animated_webp(&frames)).unwrap();

        assert_eq!(decoded.len(), 2);
        assert!(decoded.iter().all(|f| f.image.dimensions() == (6, 4)));
        assert_eq!(*decoded[0].image.get_pixel(0, 0), Rgb([255, 0, 0]));
        assert_eq!(decoded[1].alpha.as_ref().unwrap().get_pixel(5, 3)[0], 64);
    }

    #[cfg(feature = "webp-support")]
    #[test]
    fn test_decode_still_webp() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(3, 2, Rgba([9, 8, 7, 255])));
        let frames = ImageFrameDecoder::new()
            .decode(&encode(&image, ImageFormat::WebP))
            .unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].image.dimensions(), (3, 2));
    }

    #[test]
    fn test_decode_garbage_fails() {
        let err = ImageFrameDecoder::new().decode(b"definitely not an image");
        assert!(err.is_err());

        let err = decode_with_context(&ImageFrameDecoder, b"nope", "a.png").unwrap_err();
        assert!(err.to_string().contains("a.png"));
    }
}
