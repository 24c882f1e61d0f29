use std::sync::Arc;

use axum::{
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
};
use dashmap::DashSet;
use futures::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use quiz_match_app::{
    domain::RoomKey,
    ports::authentication::Identity,
    workflow::{
        gameplay::{end_set::EndSetResult, start_set::StartSetResult},
        room::leave::LeaveOutcome,
    },
};
use serde_json::json;
use tokio::{
    select,
    sync::mpsc::{UnboundedReceiver, UnboundedSender},
};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{
    AppState, ServiceError,
    auth::UpgradeAuth,
    connection::ConnectionId,
    envelope::{Envelope, Status},
    protocol::{
        ClientMessage, ClientMessageWrapper, RoomInfo, ScoreBoardInfo, ServerMessage,
        SetResultInfo, SettlementInfo, TallyInfo,
    },
};

/// Per-socket state. The rooms are the ones this socket created or joined.
/// They are shared with the handler so a dying receive task cannot lose them.
struct Session {
    identity: Identity,
    rooms: Arc<DashSet<RoomKey>>,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    UpgradeAuth(identity): UpgradeAuth,
    State(app): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| async move {
        let (ws_sender, ws_receiver) = socket.split();
        let cancellation_token = CancellationToken::new();
        let conn_id = ConnectionId::new();
        let user_id = identity.user_id;
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

        app.connections.add_connection(user_id, conn_id, tx.clone());
        log::info!("WebSocket connection {} opened for {}", conn_id, identity.username);

        let rooms = Arc::new(DashSet::new());
        let session = Session {
            identity,
            rooms: rooms.clone(),
        };
        let receive_task = tokio::spawn(receive_ws(
            app.clone(),
            session,
            ws_receiver,
            cancellation_token.clone(),
            conn_id,
            tx,
        ));
        let send_task = tokio::spawn(send_ws(ws_sender, rx, cancellation_token.clone()));

        let (receive_res, send_res) = tokio::join!(receive_task, send_task);
        app.connections.remove_connection(user_id, conn_id);

        if let Err(e) = receive_res {
            log::error!("WebSocket receive task failed: {}", e);
        }
        let room_keys: Vec<RoomKey> = rooms.iter().map(|key| key.key().clone()).collect();
        if !room_keys.is_empty() {
            let stuck = app
                .app
                .room_disconnect_use_case
                .disconnect(user_id, room_keys)
                .await;
            if !stuck.is_empty() {
                log::error!(
                    "Connection {} closed with unsettled rooms {:?}",
                    conn_id,
                    stuck
                );
            }
        }
        if let Err(e) = send_res {
            log::error!("WebSocket send task failed: {}", e);
        }
        log::info!("WebSocket connection {} handler finished", conn_id);
    })
}

async fn receive_ws(
    app: AppState,
    mut session: Session,
    mut ws_receiver: SplitStream<WebSocket>,
    cancellation_token: CancellationToken,
    connection_id: ConnectionId,
    sender: UnboundedSender<ServerMessage>,
) {
    while let Some(msg) = select! {
        _ = cancellation_token.cancelled() => None,
        msg = ws_receiver.next() => msg,
    } {
        match msg {
            Ok(Message::Text(text)) => {
                let response = match serde_json::from_str::<ClientMessageWrapper>(&text) {
                    Ok(msg) => {
                        log::debug!("Received WS message from {}: {:?}", connection_id, msg);
                        let envelope =
                            match handle_client_message(&app, &mut session, msg.message).await {
                                Ok(envelope) => envelope,
                                Err(e) => {
                                    log::debug!("WS message from {} rejected: {}", connection_id, e);
                                    e.envelope()
                                }
                            };
                        ServerMessage::Reply {
                            response_id: msg.response_id,
                            envelope,
                        }
                    }
                    Err(e) => {
                        log::debug!("Failed to parse WS message: {}", e);
                        ServerMessage::Reply {
                            response_id: Uuid::new_v4(),
                            envelope: ServiceError::bad_request("Invalid message format")
                                .envelope(),
                        }
                    }
                };
                let _ = sender.send(response);
            }
            Ok(Message::Close(frame)) => {
                log::info!("WS connection {} closed: {:?}", connection_id, frame);
                break;
            }
            Err(e) => {
                log::error!("WS error on {}: {}", connection_id, e);
                break;
            }
            _ => {}
        }
    }
    cancellation_token.cancel();
}

async fn send_ws(
    mut ws_sender: SplitSink<WebSocket, Message>,
    mut channel: UnboundedReceiver<ServerMessage>,
    cancellation_token: CancellationToken,
) -> Result<(), ServiceError> {
    while let Some(msg) = select! {
        _ = cancellation_token.cancelled() => None,
        msg = channel.recv() => msg,
    } {
        let text = match serde_json::to_string(&msg) {
            Ok(text) => text,
            Err(e) => {
                log::error!("Failed to serialize WS message {:?}: {}", msg, e);
                continue;
            }
        };
        if let Err(e) = ws_sender.send(Message::Text(text.into())).await {
            cancellation_token.cancel();
            return Err(ServiceError::Internal(format!(
                "Failed to send WS message: {}",
                e
            )));
        }
    }
    cancellation_token.cancel();
    Ok(())
}

async fn handle_client_message(
    app: &AppState,
    session: &mut Session,
    msg: ClientMessage,
) -> Result<Envelope, ServiceError> {
    let user = session.identity.user_id;
    match msg {
        ClientMessage::CreateRoom { rated } => {
            let room_key = app.app.room_create_use_case.create_room(user, rated);
            session.rooms.insert(room_key.clone());
            Ok(Envelope::ok(json!({ "roomKey": room_key.to_string() })))
        }
        ClientMessage::JoinRoom { room_key } => {
            let room_key = RoomKey::new(room_key);
            let view = app.app.room_join_use_case.join_room(user, &room_key).await?;
            session.rooms.insert(room_key);
            Ok(Envelope::ok(RoomInfo::from_room_view(&view)))
        }
        ClientMessage::LeaveRoom => {
            let settlement = leave_all_rooms(app, session).await?;
            Ok(Envelope::ok(settlement))
        }
        ClientMessage::UserStartSet { room_key, seat } => {
            let room_key = RoomKey::new(room_key);
            let result = app
                .app
                .game_start_set_use_case
                .start_set(user, &room_key, seat)
                .await;
            Ok(match result {
                StartSetResult::Started { round } => Envelope::ok(json!({ "round": round })),
                StartSetResult::WaitingOnOpponent => Envelope::waiting_on_opponent(),
                StartSetResult::NotApplicable => Envelope::not_applicable(),
            })
        }
        ClientMessage::UserSubmit {
            room_key,
            seat,
            set_index,
            delta,
        } => {
            let room_key = RoomKey::new(room_key);
            let tally = app
                .app
                .game_submit_use_case
                .submit(user, &room_key, seat, set_index, delta)
                .await;
            Ok(match tally {
                Some(tally) => Envelope::ok(TallyInfo::from_tally(&tally)),
                None => Envelope::not_applicable(),
            })
        }
        ClientMessage::UserEndSet {
            room_key,
            seat,
            set_index,
        } => {
            let room_key = RoomKey::new(room_key);
            let result = app
                .app
                .game_end_set_use_case
                .end_set(user, &room_key, seat, set_index)
                .await;
            Ok(match result {
                EndSetResult::Decided(result) | EndSetResult::Replayed(result) => {
                    Envelope::ok(SetResultInfo::from_set_result(&result))
                }
                EndSetResult::WaitingOnOpponent => Envelope::waiting_on_opponent(),
                EndSetResult::NotApplicable => Envelope::not_applicable(),
            })
        }
        ClientMessage::DisplayScore { room_key } => {
            let room_key = RoomKey::new(room_key);
            app.app.game_resolve_use_case.resolve_match(&room_key).await?;
            let board = app
                .app
                .game_display_score_use_case
                .display_score(&room_key)
                .await
                .ok_or_else(|| {
                    ServiceError::NotFound(Status::RoomNotFound, "Room not found".to_string())
                })?;
            Ok(Envelope::ok(ScoreBoardInfo::from_score_board(&board)))
        }
    }
}

/// Leaves every room of the session. Rooms that could not be left stay in
/// the session so a later attempt can retry them.
async fn leave_all_rooms(
    app: &AppState,
    session: &mut Session,
) -> Result<Option<SettlementInfo>, ServiceError> {
    let mut settlement = None;
    let mut failure = None;
    let rooms: Vec<RoomKey> = session.rooms.iter().map(|key| key.key().clone()).collect();
    for room_key in rooms {
        match app
            .app
            .room_leave_use_case
            .leave_room(session.identity.user_id, &room_key)
            .await
        {
            Ok(outcome) => {
                session.rooms.remove(&room_key);
                if let LeaveOutcome::Left {
                    settlement: Some(s),
                } = outcome
                {
                    settlement.get_or_insert(SettlementInfo::from_settlement(&s));
                }
            }
            Err(e) => {
                log::error!(
                    "User {} failed to leave room {}: {}",
                    session.identity.username,
                    room_key,
                    e
                );
                failure = Some(ServiceError::from(e));
            }
        }
    }
    match failure {
        Some(e) => Err(e),
        None => Ok(settlement),
    }
}
