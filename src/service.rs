use axum::{
    extract::{Request, State},
    http::Method,
    response::{IntoResponse, Response},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::{
    config::ServiceConfig,
    error::{Result, RoomRatesError},
    handler::{room_data_handler, ROOM_ID_PARAM, ROOM_ROUTE},
    limiter::{Admission, TokenBucket},
    metrics::Metrics,
    router::{handler, RouteMatch, RouteParams, RouteTable},
    source::{self, RoomDataSource},
};

/// State handed to route handlers
#[derive(Clone)]
pub struct HandlerState {
    pub source: Arc<dyn RoomDataSource>,
}

/// Front door for every API request.
///
/// Each request first has to be admitted by the limiter. Only then is it
/// routed, so unroutable requests still spend a token.
pub struct RoomRatesService {
    admission: Arc<dyn Admission>,
    routes: RouteTable<HandlerState>,
    state: HandlerState,
    metrics: Arc<Metrics>,
}

impl RoomRatesService {
    /// Create a service with the room route registered
    pub fn new(
        admission: Arc<dyn Admission>,
        source: Arc<dyn RoomDataSource>,
        metrics: Arc<Metrics>,
    ) -> Result<Self> {
        let routes = RouteTable::new().route(Method::GET, ROOM_ROUTE, handler(room_route))?;

        Ok(Self {
            admission,
            routes,
            state: HandlerState { source },
            metrics,
        })
    }

    /// Build the limiter and data source described by `config`
    pub fn from_config(config: &ServiceConfig, metrics: Arc<Metrics>) -> Result<Self> {
        config.validate()?;
        let limiter = Arc::new(TokenBucket::from_settings(&config.rate_limit));
        let source: Arc<dyn RoomDataSource> = Arc::from(source::from_config(&config.data_source));
        Self::new(limiter, source, metrics)
    }

    /// Admit, route, then run the bound handler
    pub async fn dispatch(&self, method: &Method, path: &str) -> Response {
        let _timer = self.metrics.start_request_timer();

        let response = if !self.admission.try_admit() {
            self.metrics.record_rejected();
            debug!(%method, path, "rejected by rate limiter");
            RoomRatesError::RateLimited.into_response()
        } else {
            self.metrics.record_admitted();
            match self.routes.match_request(method, path) {
                RouteMatch::Matched { route, params } => {
                    (route.handler())(self.state.clone(), params).await
                }
                RouteMatch::MethodNotAllowed => RoomRatesError::MethodNotAllowed.into_response(),
                RouteMatch::NotFound => RoomRatesError::NotFound.into_response(),
            }
        };

        let status = response.status();
        if status.is_server_error() {
            self.metrics.record_upstream_error();
        }
        self.metrics.record_response(status.as_u16());
        response
    }
}

async fn room_route(state: HandlerState, params: RouteParams) -> Response {
    let room_id = params.get(ROOM_ID_PARAM).unwrap_or_default();
    room_data_handler(state.source.as_ref(), room_id)
        .await
        .into_response()
}

async fn dispatch_request(
    State(service): State<Arc<RoomRatesService>>,
    request: Request,
) -> Response {
    service
        .dispatch(request.method(), request.uri().path())
        .await
}

/// HTTP application serving the API. All paths go through
/// [`RoomRatesService::dispatch`].
pub fn build_app(service: Arc<RoomRatesService>) -> Router {
    Router::new()
        .fallback(dispatch_request)
        .with_state(service)
        .layer(TraceLayer::new_for_http())
}
