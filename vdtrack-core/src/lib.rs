use serde::{Deserialize, Serialize};
use ulid::Ulid;

pub mod protocol;

pub use protocol::{
    DecodeError, DecodeResult, GpsFix, PackedTimestamp, StatusFlags, TrackerPacket,
};

// `Box<str>` keeps the string fields of long-lived records compact and makes
// accidental cloning visible at the call site.
type BoxStr = Box<str>;

/// Unique identifier for a registered thing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThingId(pub Ulid);

/// Unique identifier for an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrgId(pub Ulid);

/// A tracker device registered with the platform.
///
/// Created on the first packet a device sends; location data is only
/// published once the thing has been assigned to an organization and
/// enabled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thing {
    /// Stable identity of this thing.
    pub id: ThingId,
    /// Wire device id, including the fixed tag prefix.
    pub device_id: BoxStr,
    /// Owning organization, if assigned.
    pub org: Option<OrgId>,
    /// Whether data from this thing is processed.
    pub enabled: bool,
    /// Topic its location fixes are published to.
    pub location_topic: BoxStr,
    /// Registration timestamp.
    pub registered_at: jiff::Timestamp,
}
