use axum::Json;
use tracing::warn;

use crate::{
    error::{Result, RoomRatesError},
    source::{RoomDataSource, RoomRecord},
};

/// Path parameter carrying the room id
pub const ROOM_ID_PARAM: &str = "roomID";

/// Template of the single API route
pub const ROOM_ROUTE: &str = "/api/room/{roomID:[0-9]+}";

/// Look up room data and return it as a JSON body.
///
/// The route only matches non-empty numeric ids, so the empty-id check only
/// triggers when the handler is called directly.
pub async fn room_data_handler(
    source: &dyn RoomDataSource,
    room_id: &str,
) -> Result<Json<RoomRecord>> {
    if room_id.is_empty() {
        return Err(RoomRatesError::Validation("Room ID is required".to_string()));
    }

    match source.fetch_room_data(room_id).await {
        Ok(record) => Ok(Json(record)),
        Err(e) => {
            warn!(room_id, error = %e, "failed to fetch room data");
            Err(RoomRatesError::Upstream(e.to_string()))
        }
    }
}
