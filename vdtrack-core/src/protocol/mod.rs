mod error;
mod packet;
mod timecode;

pub use error::{DecodeError, DecodeResult};
pub use packet::{GpsFix, StatusFlags, TrackerPacket};
pub use timecode::{PackedTimestamp, TimeParts};

// payload structure : key '|' device-id '|' voltage '|' flags '|' fix records

pub const BLOCK_SEPARATOR: u8 = b'|';
pub const MAX_BLOCKS: usize = 5;
pub const MIN_BLOCKS: usize = 4;
pub const DEVICE_ID_PREFIX: &str = "VD";
pub const FIX_RECORD_SIZE: usize = 13;
pub const COORD_SCALE: f64 = 10_000_000.0;
