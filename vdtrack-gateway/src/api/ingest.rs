use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::{debug, warn};
use vdtrack_core::TrackerPacket;

use crate::AppState;
use crate::process::{self, ProcessError};
use crate::publish::LocationPublisher;
use crate::registry::ThingRegistry;

use super::error::ApiError;

/// POST / — one raw tracker payload per request body.
pub async fn ingest<R, P>(State(state): State<AppState<R, P>>, body: Bytes) -> Response
where
    R: ThingRegistry,
    P: LocationPublisher,
{
    debug!(size = body.len(), "ingest request received");

    let packet = match TrackerPacket::from_bytes(&body) {
        Ok(packet) => packet,
        Err(e) => {
            warn!(error = %e, "failed to decode packet");
            return ApiError::BadRequest(e.to_string()).into_response();
        }
    };

    debug!(
        device_id = %packet.device_id,
        voltage = packet.voltage,
        flags = packet.flags.0,
        fixes = packet.fixes.len(),
        "packet decoded"
    );

    match process::process_packet(state.registry.as_ref(), state.publisher.as_ref(), &packet).await
    {
        Ok(outcome) => {
            debug!(?outcome, "packet processed");
            StatusCode::OK.into_response()
        }
        Err(e @ ProcessError::EmptyDeviceId) => ApiError::BadRequest(e.to_string()).into_response(),
        Err(e) => {
            warn!(error = %e, "failed to process packet");
            ApiError::InternalServerError(e.to_string()).into_response()
        }
    }
}
