//! HTTP surface: session creation and the WebSocket upgrade.

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Path, State};
use axum::response::Response;
use axum::routing::get;
use gambit_protocol::{ParticipantId, SessionId};
use gambit_relay::Relay;
use gambit_rules::RulesEngine;
use gambit_transport::{Connection, WebSocketConnection};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::handler::handle_connection;

/// Body of `GET /new-game`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewGameResponse {
    pub game_id: SessionId,
}

/// Builds the application router over a shared relay.
///
/// - `GET /new-game` hands out a fresh session id
/// - `GET /ws/{game_id}/{player_id}` upgrades to the realtime channel
///
/// CORS is fully permissive so browser clients on any origin can connect.
pub fn router<E: RulesEngine>(relay: Arc<Relay<E>>) -> Router {
    Router::new()
        .route("/new-game", get(new_game::<E>))
        .route("/ws/{game_id}/{player_id}", get(ws_upgrade::<E>))
        .layer(CorsLayer::permissive())
        .with_state(relay)
}

async fn new_game<E: RulesEngine>(
    State(relay): State<Arc<Relay<E>>>,
) -> Json<NewGameResponse> {
    let game_id = relay.create_session_id();
    tracing::debug!(%game_id, "issued session id");
    Json(NewGameResponse { game_id })
}

async fn ws_upgrade<E: RulesEngine>(
    ws: WebSocketUpgrade,
    Path((game_id, player_id)): Path<(String, String)>,
    State(relay): State<Arc<Relay<E>>>,
) -> Response {
    let session_id = SessionId::new(game_id);
    let participant = ParticipantId::new(player_id);

    ws.on_upgrade(move |socket| async move {
        let conn = WebSocketConnection::new(socket);
        let conn_id = conn.id();
        if let Err(e) =
            handle_connection(conn, relay, session_id, participant).await
        {
            tracing::warn!(%conn_id, error = %e, "connection handler error");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_game_response_serializes_game_id() {
        let body = NewGameResponse {
            game_id: SessionId::new("abc"),
        };
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"game_id":"abc"}"#
        );
    }
}
