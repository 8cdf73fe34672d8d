//! Request handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use serde_json::json;

use crate::http::{ApiError, AppState, NodeInfo};
use crate::identity::MultiAddress;
use crate::ingress::{FragmentRoute, OpenOrderRequest};
use crate::observability::metrics;
use crate::swarm::client::{PingRequest, PingResponse, QueryRequest, QueryResponse};

/// `POST /orders`
pub async fn open_order(
    State(state): State<AppState>,
    Json(request): Json<OpenOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let order_id = request.order_id;
    match state.ingress.open_order(request) {
        Ok(()) => {
            metrics::record_submission("order", StatusCode::ACCEPTED.as_u16());
            tracing::debug!(order = %order_id, "Order accepted");
            Ok((StatusCode::ACCEPTED, Json(json!({ "orderId": order_id }))))
        }
        Err(e) => {
            let err = ApiError::from(e);
            metrics::record_submission("order", err.status().as_u16());
            Err(err)
        }
    }
}

/// `POST /orders/fragments`
pub async fn open_order_fragment(
    State(state): State<AppState>,
    Json(route): Json<FragmentRoute>,
) -> Result<impl IntoResponse, ApiError> {
    let fragment_id = route.fragment.id;
    match state.ingress.open_order_fragment(route) {
        Ok(()) => {
            metrics::record_submission("order_fragment", StatusCode::ACCEPTED.as_u16());
            Ok((StatusCode::ACCEPTED, Json(json!({ "fragmentId": fragment_id }))))
        }
        Err(e) => {
            let err = ApiError::from(e);
            metrics::record_submission("order_fragment", err.status().as_u16());
            Err(err)
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    #[serde(flatten)]
    pub node: NodeInfo,
    pub version: &'static str,
    pub peers: usize,
    pub darknodes: usize,
}

/// `GET /status`
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        node: NodeInfo::clone(&state.node),
        version: env!("CARGO_PKG_VERSION"),
        peers: state.swarmer.table().len(),
        darknodes: state.ingress.darknode_count(),
    })
}

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}

/// `GET /peers`
pub async fn peers(State(state): State<AppState>) -> Json<Vec<MultiAddress>> {
    Json(state.swarmer.peers())
}

/// `POST /swarm/ping`
pub async fn swarm_ping(State(state): State<AppState>, Json(request): Json<PingRequest>) -> Json<PingResponse> {
    Json(PingResponse {
        multi_address: state.swarmer.ping_from(request.multi_address),
    })
}

/// `POST /swarm/query`
pub async fn swarm_query(State(state): State<AppState>, Json(request): Json<QueryRequest>) -> Json<QueryResponse> {
    Json(QueryResponse {
        multi_addresses: state.swarmer.answer_query(request.target),
    })
}
