use tracing::{debug, info};
use vdtrack_core::TrackerPacket;
use vdtrack_core::protocol::DEVICE_ID_PREFIX;

use crate::publish::LocationPublisher;
use crate::registry::ThingRegistry;

/// What became of a successfully decoded packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Fixes were published to the thing's location topic.
    Published { fixes: usize },
    /// The thing exists but is not assigned to an organization yet.
    IgnoredUnassigned,
    /// The thing is assigned but disabled.
    IgnoredDisabled,
}

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    /// The identity block of the packet was empty.
    #[error("device id is empty")]
    EmptyDeviceId,
    #[error("registry error: {0}")]
    Registry(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("publish error: {0}")]
    Publish(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("failed to encode fix: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Runs one decoded packet through registration, assignment gates and
/// publication.
///
/// Unknown devices are registered on first contact but their data is
/// dropped until ops assign them to an organization and enable them.
pub async fn process_packet<R, P>(
    registry: &R,
    publisher: &P,
    packet: &TrackerPacket,
) -> Result<Outcome, ProcessError>
where
    R: ThingRegistry,
    P: LocationPublisher,
{
    // the prefix alone means the identity block was empty
    if packet.device_id.len() <= DEVICE_ID_PREFIX.len() {
        return Err(ProcessError::EmptyDeviceId);
    }

    let thing = registry
        .find_or_register(&packet.device_id)
        .await
        .map_err(|e| ProcessError::Registry(Box::new(e)))?;

    if thing.org.is_none() {
        debug!(
            device_id = %packet.device_id,
            "thing is not assigned to any organization, dropping packet"
        );
        return Ok(Outcome::IgnoredUnassigned);
    }

    if !thing.enabled {
        debug!(device_id = %packet.device_id, "thing is disabled, dropping packet");
        return Ok(Outcome::IgnoredDisabled);
    }

    for fix in &packet.fixes {
        let payload = serde_json::to_vec(fix)?;
        publisher
            .publish(&thing.location_topic, &payload)
            .await
            .map_err(|e| ProcessError::Publish(Box::new(e)))?;
    }

    info!(
        device_id = %packet.device_id,
        fixes = packet.fixes.len(),
        topic = %thing.location_topic,
        "published location fixes"
    );

    Ok(Outcome::Published {
        fixes: packet.fixes.len(),
    })
}
