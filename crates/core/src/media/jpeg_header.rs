//! Baseline JPEG header synthesis for RTP/JPEG frames (RFC 2435 App. A, B).
//!
//! RTP/JPEG strips the JPEG headers and ships only scan data plus a few
//! parameters. To hand a decodable image to the decoder, the receiver
//! rebuilds them:
//!
//! ```text
//! SOI                       FF D8
//! DQT  table 0 (luma)       FF DB
//! DQT  table 1 (chroma)     FF DB
//! DRI  (restart types only) FF DD
//! SOF0 3 components         FF C0
//! DHT  ×4 (standard K.3)    FF C4
//! SOS                       FF DA
//! <scan data>
//! EOI                       FF D9
//! ```

use crate::media::mjpeg::Subsampling;

/// Zigzag position -> natural (row-major) index.
const ZIGZAG: [usize; 64] = [
    0, 1, 8, 16, 9, 2, 3, 10, 17, 24, 32, 25, 18, 11, 4, 5, 12, 19, 26, 33, 40, 48, 41, 34, 27,
    20, 13, 6, 7, 14, 21, 28, 35, 42, 49, 56, 57, 50, 43, 36, 29, 22, 15, 23, 30, 37, 44, 51, 58,
    59, 52, 45, 38, 31, 39, 46, 53, 60, 61, 54, 47, 55, 62, 63,
];

/// JPEG Annex K.1, natural order.
const LUMA_QUANTIZER: [u8; 64] = [
    16, 11, 10, 16, 24, 40, 51, 61, //
    12, 12, 14, 19, 26, 58, 60, 55, //
    14, 13, 16, 24, 40, 57, 69, 56, //
    14, 17, 22, 29, 51, 87, 80, 62, //
    18, 22, 37, 56, 68, 109, 103, 77, //
    24, 35, 55, 64, 81, 104, 113, 92, //
    49, 64, 78, 87, 103, 121, 120, 101, //
    72, 92, 95, 98, 112, 100, 103, 99,
];

/// JPEG Annex K.2, natural order.
const CHROMA_QUANTIZER: [u8; 64] = [
    17, 18, 24, 47, 99, 99, 99, 99, //
    18, 21, 26, 66, 99, 99, 99, 99, //
    24, 26, 56, 99, 99, 99, 99, 99, //
    47, 66, 99, 99, 99, 99, 99, 99, //
    99, 99, 99, 99, 99, 99, 99, 99, //
    99, 99, 99, 99, 99, 99, 99, 99, //
    99, 99, 99, 99, 99, 99, 99, 99, //
    99, 99, 99, 99, 99, 99, 99, 99,
];

const LUMA_DC_CODELENS: [u8; 16] = [0, 1, 5, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0];
const LUMA_DC_SYMBOLS: &[u8] = &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11];

const LUMA_AC_CODELENS: [u8; 16] = [0, 2, 1, 3, 3, 2, 4, 3, 5, 5, 4, 4, 0, 0, 1, 0x7d];
const LUMA_AC_SYMBOLS: &[u8] = &[
    0x01, 0x02, 0x03, 0x00, 0x04, 0x11, 0x05, 0x12, 0x21, 0x31, 0x41, 0x06, 0x13, 0x51, 0x61,
    0x07, 0x22, 0x71, 0x14, 0x32, 0x81, 0x91, 0xa1, 0x08, 0x23, 0x42, 0xb1, 0xc1, 0x15, 0x52,
    0xd1, 0xf0, 0x24, 0x33, 0x62, 0x72, 0x82, 0x09, 0x0a, 0x16, 0x17, 0x18, 0x19, 0x1a, 0x25,
    0x26, 0x27, 0x28, 0x29, 0x2a, 0x34, 0x35, 0x36, 0x37, 0x38, 0x39, 0x3a, 0x43, 0x44, 0x45,
    0x46, 0x47, 0x48, 0x49, 0x4a, 0x53, 0x54, 0x55, 0x56, 0x57, 0x58, 0x59, 0x5a, 0x63, 0x64,
    0x65, 0x66, 0x67, 0x68, 0x69, 0x6a, 0x73, 0x74, 0x75, 0x76, 0x77, 0x78, 0x79, 0x7a, 0x83,
    0x84, 0x85, 0x86, 0x87, 0x88, 0x89, 0x8a, 0x92, 0x93, 0x94, 0x95, 0x96, 0x97, 0x98, 0x99,
    0x9a, 0xa2, 0xa3, 0xa4, 0xa5, 0xa6, 0xa7, 0xa8, 0xa9, 0xaa, 0xb2, 0xb3, 0xb4, 0xb5, 0xb6,
    0xb7, 0xb8, 0xb9, 0xba, 0xc2, 0xc3, 0xc4, 0xc5, 0xc6, 0xc7, 0xc8, 0xc9, 0xca, 0xd2, 0xd3,
    0xd4, 0xd5, 0xd6, 0xd7, 0xd8, 0xd9, 0xda, 0xe1, 0xe2, 0xe3, 0xe4, 0xe5, 0xe6, 0xe7, 0xe8,
    0xe9, 0xea, 0xf1, 0xf2, 0xf3, 0xf4, 0xf5, 0xf6, 0xf7, 0xf8, 0xf9, 0xfa,
];

const CHROMA_DC_CODELENS: [u8; 16] = [0, 3, 1, 1, 1, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0];
const CHROMA_DC_SYMBOLS: &[u8] = &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11];

const CHROMA_AC_CODELENS: [u8; 16] = [0, 2, 1, 2, 4, 4, 3, 4, 7, 5, 4, 4, 0, 1, 2, 0x77];
const CHROMA_AC_SYMBOLS: &[u8] = &[
    0x00, 0x01, 0x02, 0x03, 0x11, 0x04, 0x05, 0x21, 0x31, 0x06, 0x12, 0x41, 0x51, 0x07, 0x61,
    0x71, 0x13, 0x22, 0x32, 0x81, 0x08, 0x14, 0x42, 0x91, 0xa1, 0xb1, 0xc1, 0x09, 0x23, 0x33,
    0x52, 0xf0, 0x15, 0x62, 0x72, 0xd1, 0x0a, 0x16, 0x24, 0x34, 0xe1, 0x25, 0xf1, 0x17, 0x18,
    0x19, 0x1a, 0x26, 0x27, 0x28, 0x29, 0x2a, 0x35, 0x36, 0x37, 0x38, 0x39, 0x3a, 0x43, 0x44,
    0x45, 0x46, 0x47, 0x48, 0x49, 0x4a, 0x53, 0x54, 0x55, 0x56, 0x57, 0x58, 0x59, 0x5a, 0x63,
    0x64, 0x65, 0x66, 0x67, 0x68, 0x69, 0x6a, 0x73, 0x74, 0x75, 0x76, 0x77, 0x78, 0x79, 0x7a,
    0x82, 0x83, 0x84, 0x85, 0x86, 0x87, 0x88, 0x89, 0x8a, 0x92, 0x93, 0x94, 0x95, 0x96, 0x97,
    0x98, 0x99, 0x9a, 0xa2, 0xa3, 0xa4, 0xa5, 0xa6, 0xa7, 0xa8, 0xa9, 0xaa, 0xb2, 0xb3, 0xb4,
    0xb5, 0xb6, 0xb7, 0xb8, 0xb9, 0xba, 0xc2, 0xc3, 0xc4, 0xc5, 0xc6, 0xc7, 0xc8, 0xc9, 0xca,
    0xd2, 0xd3, 0xd4, 0xd5, 0xd6, 0xd7, 0xd8, 0xd9, 0xda, 0xe2, 0xe3, 0xe4, 0xe5, 0xe6, 0xe7,
    0xe8, 0xe9, 0xea, 0xf2, 0xf3, 0xf4, 0xf5, 0xf6, 0xf7, 0xf8, 0xf9, 0xfa,
];

/// Luma and chroma quantization tables, zigzag order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantTables {
    pub luma: [u8; 64],
    pub chroma: [u8; 64],
}

impl QuantTables {
    /// Scale the standard tables by a Q factor in 1..=99 (RFC 2435 App. A).
    pub fn from_q_factor(q: u8) -> Self {
        let factor = q.clamp(1, 99) as u32;
        let scale = if factor < 50 {
            5000 / factor
        } else {
            200 - factor * 2
        };

        let mut luma = [0u8; 64];
        let mut chroma = [0u8; 64];
        for (i, &natural) in ZIGZAG.iter().enumerate() {
            luma[i] = ((LUMA_QUANTIZER[natural] as u32 * scale + 50) / 100).clamp(1, 255) as u8;
            chroma[i] =
                ((CHROMA_QUANTIZER[natural] as u32 * scale + 50) / 100).clamp(1, 255) as u8;
        }

        QuantTables { luma, chroma }
    }

    /// Take 8-bit tables from an in-band quantization table header. The
    /// first table is luma; the second, if present, chroma (otherwise the
    /// luma table is reused).
    pub fn from_inband(tables: &[u8]) -> Option<Self> {
        let luma: [u8; 64] = tables.get(..64)?.try_into().ok()?;
        let chroma: [u8; 64] = match tables.get(64..128) {
            Some(t) => t.try_into().ok()?,
            None => luma,
        };
        Some(QuantTables { luma, chroma })
    }
}

/// Parameters of the frame header to synthesize.
#[derive(Debug, Clone)]
pub struct FrameHeader {
    pub subsampling: Subsampling,
    pub width: u16,
    pub height: u16,
    pub restart_interval: u16,
    pub tables: QuantTables,
}

impl FrameHeader {
    /// Serialize SOI through SOS.
    pub fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&[0xff, 0xd8]);

        write_quant_table(out, 0, &self.tables.luma);
        write_quant_table(out, 1, &self.tables.chroma);

        if self.restart_interval != 0 {
            out.extend_from_slice(&[0xff, 0xdd, 0x00, 0x04]);
            out.extend_from_slice(&self.restart_interval.to_be_bytes());
        }

        let luma_sampling = match self.subsampling {
            Subsampling::Yuv422 => 0x21,
            Subsampling::Yuv420 => 0x22,
        };
        out.extend_from_slice(&[0xff, 0xc0, 0x00, 17, 8]);
        out.extend_from_slice(&self.height.to_be_bytes());
        out.extend_from_slice(&self.width.to_be_bytes());
        out.extend_from_slice(&[3, 0, luma_sampling, 0, 1, 0x11, 1, 2, 0x11, 1]);

        write_huffman_table(out, 0, 0, &LUMA_DC_CODELENS, LUMA_DC_SYMBOLS);
        write_huffman_table(out, 1, 0, &LUMA_AC_CODELENS, LUMA_AC_SYMBOLS);
        write_huffman_table(out, 0, 1, &CHROMA_DC_CODELENS, CHROMA_DC_SYMBOLS);
        write_huffman_table(out, 1, 1, &CHROMA_AC_CODELENS, CHROMA_AC_SYMBOLS);

        out.extend_from_slice(&[0xff, 0xda, 0x00, 12, 3, 0, 0x00, 1, 0x11, 2, 0x11, 0, 63, 0]);
    }

    /// Header + scan data + EOI (added unless the scan already ends with it).
    pub fn assemble(&self, scan: &[u8]) -> Vec<u8> {
        let mut jpeg = Vec::with_capacity(scan.len() + 640);
        self.write(&mut jpeg);
        jpeg.extend_from_slice(scan);
        if !jpeg.ends_with(&[0xff, 0xd9]) {
            jpeg.extend_from_slice(&[0xff, 0xd9]);
        }
        jpeg
    }
}

fn write_quant_table(out: &mut Vec<u8>, table_no: u8, table: &[u8; 64]) {
    out.extend_from_slice(&[0xff, 0xdb, 0x00, 67, table_no]);
    out.extend_from_slice(table);
}

fn write_huffman_table(
    out: &mut Vec<u8>,
    class: u8,
    table_no: u8,
    codelens: &[u8; 16],
    symbols: &[u8],
) {
    let length = (3 + codelens.len() + symbols.len()) as u16;
    out.extend_from_slice(&[0xff, 0xc4]);
    out.extend_from_slice(&length.to_be_bytes());
    out.push((class << 4) | table_no);
    out.extend_from_slice(codelens);
    out.extend_from_slice(symbols);
}
