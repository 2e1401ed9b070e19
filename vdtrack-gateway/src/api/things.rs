use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::str::FromStr;
use ulid::Ulid;
use vdtrack_core::{OrgId, Thing};

use crate::AppState;
use crate::publish::LocationPublisher;
use crate::registry::ThingRegistry;

use super::error::ApiError;
use super::models::{ApiResponse, ThingResponse, ThingUpdateRequest};

// Helper to create success response
fn success_response<T: serde::Serialize>(status: StatusCode, data: T, message: Option<String>) -> Response {
    let api_response = ApiResponse {
        success: true,
        data: Some(data),
        message,
    };
    (status, Json(api_response)).into_response()
}

// Get a registered thing by its wire device id
pub async fn get_thing<R, P>(
    Path(device_id): Path<String>,
    State(state): State<AppState<R, P>>,
) -> Response
where
    R: ThingRegistry,
    P: LocationPublisher,
{
    match state.registry.get(&device_id).await {
        Ok(Some(thing)) => success_response(StatusCode::OK, ThingResponse::from(thing), None),
        Ok(None) => ApiError::NotFound(format!("thing {device_id:?} is not registered")).into_response(),
        Err(e) => ApiError::InternalServerError(format!("failed to get thing: {e}")).into_response(),
    }
}

// Assign or enable a registered thing
pub async fn update_thing<R, P>(
    Path(device_id): Path<String>,
    State(state): State<AppState<R, P>>,
    Json(payload): Json<ThingUpdateRequest>,
) -> Response
where
    R: ThingRegistry,
    P: LocationPublisher,
{
    let existing = match state.registry.get(&device_id).await {
        Ok(Some(thing)) => thing,
        Ok(None) => {
            return ApiError::NotFound(format!("thing {device_id:?} is not registered"))
                .into_response();
        }
        Err(e) => {
            return ApiError::InternalServerError(format!("failed to get thing: {e}"))
                .into_response();
        }
    };

    let org = match payload.org {
        Some(raw) => match Ulid::from_str(&raw) {
            Ok(ulid) => Some(OrgId(ulid)),
            Err(_) => {
                return ApiError::BadRequest("Invalid org ID format. Expected ULID.".to_string())
                    .into_response();
            }
        },
        None => existing.org,
    };

    let updated = Thing {
        org,
        enabled: payload.enabled.unwrap_or(existing.enabled),
        location_topic: match payload.location_topic {
            Some(topic) => topic.into_boxed_str(),
            None => existing.location_topic.clone(),
        },
        ..existing
    };

    match state.registry.update(&device_id, updated.clone()).await {
        Ok(()) => success_response(
            StatusCode::OK,
            ThingResponse::from(updated),
            Some("Thing updated successfully".to_string()),
        ),
        Err(e) => {
            ApiError::InternalServerError(format!("failed to update thing: {e}")).into_response()
        }
    }
}
