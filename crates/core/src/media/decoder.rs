use crate::error::{Result, RtspError};
use crate::frame::DecodedFrame;

/// Decodes a complete JPEG image into BGRA pixels.
///
/// This is the boundary to whatever image library the host prefers. The
/// RTP worker calls it once per reassembled frame; an error drops that
/// frame only.
pub trait JpegDecoder: Send + Sync {
    fn decode(&self, jpeg: &[u8]) -> Result<DecodedFrame>;
}

/// [`JpegDecoder`] backed by the pure-Rust `jpeg-decoder` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct SoftwareJpegDecoder;

impl JpegDecoder for SoftwareJpegDecoder {
    fn decode(&self, jpeg: &[u8]) -> Result<DecodedFrame> {
        let mut decoder = jpeg_decoder::Decoder::new(jpeg);
        let pixels = decoder
            .decode()
            .map_err(|e| RtspError::Decode(e.to_string()))?;
        let info = decoder
            .info()
            .ok_or_else(|| RtspError::Decode("missing image info".to_string()))?;

        let bgra: Vec<u8> = match info.pixel_format {
            jpeg_decoder::PixelFormat::RGB24 => pixels
                .chunks_exact(3)
                .flat_map(|p| [p[2], p[1], p[0], 0xff])
                .collect(),
            jpeg_decoder::PixelFormat::L8 => {
                pixels.iter().flat_map(|&l| [l, l, l, 0xff]).collect()
            }
            // big-endian samples; keep the high byte
            jpeg_decoder::PixelFormat::L16 => pixels
                .chunks_exact(2)
                .flat_map(|p| [p[0], p[0], p[0], 0xff])
                .collect(),
            other => {
                return Err(RtspError::Decode(format!(
                    "unsupported pixel format {:?}",
                    other
                )));
            }
        };

        Ok(DecodedFrame {
            pixels: bgra,
            width: info.width as u32,
            height: info.height as u32,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::jpeg_header::{FrameHeader, QuantTables};
    use crate::media::mjpeg::Subsampling;

    #[test]
    fn decodes_synthesized_gray_frame() {
        // One 16x8 MCU (4:2:2): two luma blocks then Cb, Cr, each with a
        // zero DC difference followed by end-of-block, padded with 1 bits.
        let scan = [0x28, 0xa0, 0x0f];
        let header = FrameHeader {
            subsampling: Subsampling::Yuv422,
            width: 16,
            height: 8,
            restart_interval: 0,
            tables: QuantTables::from_q_factor(50),
        };

        let frame = SoftwareJpegDecoder.decode(&header.assemble(&scan)).unwrap();
        assert_eq!(frame.width, 16);
        assert_eq!(frame.height, 8);
        assert_eq!(frame.pixels.len(), 16 * 8 * 4);
        for px in frame.pixels.chunks_exact(4) {
            for &c in &px[..3] {
                assert!((c as i32 - 128).abs() <= 2, "expected mid gray, got {}", c);
            }
            assert_eq!(px[3], 0xff);
        }
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            SoftwareJpegDecoder.decode(&[0x00, 0x01, 0x02]),
            Err(RtspError::Decode(_))
        ));
    }
}
