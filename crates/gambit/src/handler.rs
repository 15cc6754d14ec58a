//! Per-connection endpoint: join, pump messages both ways, leave.
//!
//! Each upgraded WebSocket gets its own Tokio task running
//! [`handle_connection`]. The flow is:
//!   1. Join the session with a fresh outbound channel
//!   2. Loop: forward relay pushes to the socket, feed inbound frames to
//!      the relay
//!   3. Leave, from a drop guard, however the loop ended

use std::sync::Arc;

use gambit_protocol::{
    ClientMessage, Codec, JsonCodec, ParticipantId, ServerMessage, SessionId,
};
use gambit_relay::Relay;
use gambit_rules::RulesEngine;
use gambit_transport::{Connection, ConnectionId, WebSocketConnection};
use tokio::sync::mpsc;

use crate::GambitError;

pub(crate) const MALFORMED_MESSAGE: &str = "Malformed message";
pub(crate) const UNSUPPORTED_MESSAGE: &str = "Unsupported message type";

/// Drop guard that removes the connection from the relay when the handler
/// exits.
///
/// `Drop` is synchronous, so the leave runs on a spawned task.
struct ConnectionGuard<E: RulesEngine> {
    relay: Arc<Relay<E>>,
    session_id: SessionId,
    participant: ParticipantId,
    conn_id: ConnectionId,
}

impl<E: RulesEngine> Drop for ConnectionGuard<E> {
    fn drop(&mut self) {
        let relay = Arc::clone(&self.relay);
        let session_id = self.session_id.clone();
        let participant = self.participant.clone();
        let conn_id = self.conn_id;
        tokio::spawn(async move {
            relay.leave(&session_id, &participant, conn_id).await;
        });
    }
}

/// Serves one participant's connection until either side goes away.
pub(crate) async fn handle_connection<E: RulesEngine>(
    conn: WebSocketConnection,
    relay: Arc<Relay<E>>,
    session_id: SessionId,
    participant: ParticipantId,
) -> Result<(), GambitError> {
    let conn_id = conn.id();
    let codec = JsonCodec;
    let (tx, mut rx) = mpsc::unbounded_channel();

    let joined = relay.join(&session_id, &participant, conn_id, tx).await;
    let _guard = ConnectionGuard {
        relay: Arc::clone(&relay),
        session_id: session_id.clone(),
        participant: participant.clone(),
        conn_id,
    };
    tracing::debug!(
        %conn_id,
        %session_id,
        participant_id = %participant,
        created = joined.created,
        "endpoint running"
    );

    loop {
        tokio::select! {
            inbound = conn.recv() => match inbound {
                Ok(Some(data)) => {
                    handle_frame(&conn, &codec, &relay, &session_id, &participant, &data)
                        .await?;
                }
                Ok(None) => {
                    tracing::info!(%conn_id, "connection closed cleanly");
                    break;
                }
                Err(e) => {
                    tracing::debug!(%conn_id, error = %e, "recv error");
                    break;
                }
            },
            outbound = rx.recv() => match outbound {
                Some(msg) => send_message(&conn, &codec, &msg).await?,
                None => {
                    // The table dropped our sender: a newer connection for
                    // the same participant took over.
                    tracing::info!(%conn_id, "connection superseded, closing");
                    let _ = conn.close().await;
                    break;
                }
            },
        }
    }

    // _guard drops here → leave fires.
    Ok(())
}

/// Decodes one inbound frame and acts on it. Problems with the frame are
/// reported to this connection only; the loop keeps going.
async fn handle_frame<E: RulesEngine>(
    conn: &WebSocketConnection,
    codec: &JsonCodec,
    relay: &Relay<E>,
    session_id: &SessionId,
    participant: &ParticipantId,
    data: &[u8],
) -> Result<(), GambitError> {
    let request: ClientMessage = match codec.decode(data) {
        Ok(request) => request,
        Err(e) => {
            tracing::debug!(
                conn_id = %conn.id(),
                error = %e,
                "failed to decode client message"
            );
            return send_error(conn, codec, MALFORMED_MESSAGE).await;
        }
    };

    match request {
        ClientMessage::Move { token } => {
            // Accepted moves reach us through the broadcast like everyone
            // else's.
            if let Err(e) = relay.submit_move(session_id, participant, &token).await
            {
                send_error(conn, codec, &e.to_string()).await?;
            }
        }
        ClientMessage::Unsupported => {
            send_error(conn, codec, UNSUPPORTED_MESSAGE).await?;
        }
    }
    Ok(())
}

async fn send_error(
    conn: &WebSocketConnection,
    codec: &JsonCodec,
    message: &str,
) -> Result<(), GambitError> {
    send_message(conn, codec, &ServerMessage::error(message)).await
}

async fn send_message(
    conn: &WebSocketConnection,
    codec: &JsonCodec,
    msg: &ServerMessage,
) -> Result<(), GambitError> {
    let bytes = codec.encode(msg)?;
    conn.send(&bytes).await?;
    Ok(())
}
