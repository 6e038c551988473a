pub mod client;
pub mod error;
pub mod frame;
pub mod media;
pub mod protocol;
pub mod session;
pub mod transport;

pub use client::{ClientConfig, RtspClient};
pub use error::{PacketErrorKind, ParseErrorKind, Result, RtspError};
pub use frame::{DecodedFrame, FrameSlot};
pub use media::{JpegDecoder, SoftwareJpegDecoder, StatsSnapshot};
pub use session::{PlaybackState, SessionState};
