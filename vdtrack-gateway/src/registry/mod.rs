pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use ulid::Ulid;
use vdtrack_core::{Thing, ThingId};

/// Topic newly registered things publish their fixes to.
pub const DEFAULT_LOCATION_TOPIC: &str = "location";

/// Directory of registered things.
///
/// The narrow surface the ingest pipeline needs: look a device up by its
/// wire id (registering it on first contact) and maintain its assignment.
#[async_trait]
pub trait ThingRegistry: Send + Sync + 'static {
    /// Error type specific to this registry implementation
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetch the thing for `device_id`, registering it with defaults when
    /// it is not known yet.
    async fn find_or_register(&self, device_id: &str) -> Result<Thing, Self::Error>;

    /// Fetch a thing without registering it.
    async fn get(&self, device_id: &str) -> Result<Option<Thing>, Self::Error>;

    /// Replace the stored record for `device_id`.
    async fn update(&self, device_id: &str, new: Thing) -> Result<(), Self::Error>;
}

/// The record a device gets on first contact: no organization, disabled,
/// publishing to the default location topic once ops turn it on.
fn register_defaults(device_id: &str) -> Thing {
    Thing {
        id: ThingId(Ulid::new()),
        device_id: device_id.into(),
        org: None,
        enabled: false,
        location_topic: DEFAULT_LOCATION_TOPIC.into(),
        registered_at: jiff::Timestamp::now(),
    }
}
