use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use sketchduel_shared::{ClientMessage, DrawAction, PlayerId, RoomCode, ServerMessage};
use tokio::sync::{mpsc, RwLock};
use tower_http::services::ServeDir;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::logic::{apply_guess, dispatch, relay_draw, start_game};
use crate::rooms::{check_joinable, create_room, find_room, join_room, leave_room, RoomError};
use crate::state::{AppState, Room, MAX_PLAYERS};

const FALLBACK_PROMPT: &str = "house";

pub fn router(state: AppState) -> Router {
    let public_dir = state.config.public_dir.clone();
    Router::new()
        .route("/game/:room_code", get(game_handler))
        .route("/create_room", post(create_room_handler))
        .route("/join_room", post(join_room_handler))
        .route("/ws", get(ws_handler))
        .fallback_service(ServeDir::new(public_dir).append_index_html_on_directories(true))
        .with_state(state)
}

/// Percent-encodes everything outside the unreserved set.
fn encode_query_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~') {
            out.push(char::from(byte));
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

fn lobby_error(error: &RoomError) -> Redirect {
    Redirect::to(&format!("/?error={}", encode_query_value(&error.to_string())))
}

pub async fn game_handler(
    Path(room_code): Path<String>,
    State(state): State<AppState>,
) -> Response {
    let Ok(code) = RoomCode::parse(&room_code) else {
        return Redirect::to("/").into_response();
    };
    if code.as_str() != room_code {
        return Redirect::to(&format!("/game/{code}")).into_response();
    }
    if find_room(&state, &code).await.is_none() {
        return Redirect::to("/").into_response();
    }
    let page = state.config.public_dir.join("game.html");
    match tokio::fs::read_to_string(&page).await {
        Ok(contents) => Html(contents).into_response(),
        Err(error) => {
            warn!(path = %page.display(), %error, "failed to read game page");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn create_room_handler(State(state): State<AppState>) -> Redirect {
    let code = create_room(&state).await;
    Redirect::to(&format!("/game/{code}"))
}

#[derive(Deserialize)]
pub struct JoinForm {
    room_code: String,
}

pub async fn join_room_handler(State(state): State<AppState>, Form(form): Form<JoinForm>) -> Redirect {
    let result = match RoomCode::parse(&form.room_code) {
        Ok(code) => check_joinable(&state, &code).await.map(|()| code),
        Err(error) => Err(RoomError::from(error)),
    };
    match result {
        Ok(code) => Redirect::to(&format!("/game/{code}")),
        Err(error) => {
            debug!(room = %form.room_code, %error, "lobby join rejected");
            lobby_error(&error)
        }
    }
}

pub async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

struct Seat {
    code: RoomCode,
    room: Arc<RwLock<Room>>,
}

async fn next_prompt(state: &AppState) -> String {
    match state.prompts.generate(&state.config.prompt_category).await {
        Ok(prompt) => prompt,
        Err(error) => {
            warn!(%error, "prompt generation failed, using fallback");
            FALLBACK_PROMPT.to_string()
        }
    }
}

fn seat_for<'a>(seat: &'a Option<Seat>, room_code: &str) -> Option<&'a Seat> {
    let seat = seat.as_ref()?;
    match RoomCode::parse(room_code) {
        Ok(code) if code == seat.code => Some(seat),
        _ => None,
    }
}

async fn handle_join(
    state: &AppState,
    player: PlayerId,
    tx: &mpsc::UnboundedSender<ServerMessage>,
    seat: &mut Option<Seat>,
    room_code: &str,
) {
    if seat.is_some() {
        debug!(%player, "duplicate join ignored");
        return;
    }
    let joined = match RoomCode::parse(room_code) {
        Ok(code) => join_room(state, &code, player, tx.clone())
            .await
            .map(|(room, count)| (code, room, count)),
        Err(error) => Err(RoomError::from(error)),
    };
    let (code, room, count) = match joined {
        Ok(joined) => joined,
        Err(error) => {
            info!(%player, room = room_code, %error, "join rejected");
            let _ = tx.send(ServerMessage::Error {
                message: error.to_string(),
            });
            return;
        }
    };

    if count == MAX_PLAYERS {
        let prompt = next_prompt(state).await;
        let mut guard = room.write().await;
        if guard.players.len() == MAX_PLAYERS {
            let deliveries = start_game(&mut guard, prompt);
            dispatch(&guard, deliveries);
            info!(room = %code, "game started");
        }
    } else {
        let _ = tx.send(ServerMessage::Waiting {
            message: "Waiting for another player...".to_string(),
        });
    }
    *seat = Some(Seat { code, room });
}

async fn handle_client_message(
    state: &AppState,
    player: PlayerId,
    tx: &mpsc::UnboundedSender<ServerMessage>,
    seat: &mut Option<Seat>,
    message: ClientMessage,
) {
    match message {
        ClientMessage::Join { room_code } => {
            handle_join(state, player, tx, seat, &room_code).await;
        }
        ClientMessage::Draw { room_code, action } => {
            let Some(seat) = seat_for(seat, &room_code) else {
                debug!(%player, room = room_code, "draw for a room this socket has not joined");
                return;
            };
            if matches!(action, DrawAction::Clear) {
                debug!(room = %seat.code, %player, "canvas cleared");
            }
            let guard = seat.room.read().await;
            let deliveries = relay_draw(&guard, player, action);
            dispatch(&guard, deliveries);
        }
        ClientMessage::Guess { room_code, guess } => {
            let Some(seat) = seat_for(seat, &room_code) else {
                debug!(%player, room = room_code, "guess for a room this socket has not joined");
                return;
            };
            let correct = seat
                .room
                .read()
                .await
                .game
                .as_ref()
                .is_some_and(|game| game.check_guess(&guess, player));
            let prompt = if correct {
                Some(next_prompt(state).await)
            } else {
                None
            };
            let mut guard = seat.room.write().await;
            let deliveries = apply_guess(&mut guard, player, &guess, prompt);
            dispatch(&guard, deliveries);
        }
    }
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut socket_sender, mut socket_receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    let player = Uuid::new_v4();
    info!(%player, "WS connected");

    let _ = tx.send(ServerMessage::Connected { player_id: player });

    let send_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            match serde_json::to_string(&message) {
                Ok(payload) => {
                    if socket_sender.send(Message::Text(payload)).await.is_err() {
                        break;
                    }
                }
                Err(error) => warn!(kind = message.kind(), %error, "WS serialize failed"),
            }
        }
    });

    let mut seat: Option<Seat> = None;
    let mut close_frame = None;

    while let Some(Ok(message)) = socket_receiver.next().await {
        match message {
            Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(client_message) => {
                    handle_client_message(&state, player, &tx, &mut seat, client_message).await;
                }
                Err(error) => {
                    debug!(%player, %error, "WS message parse failed");
                }
            },
            Message::Close(frame) => {
                close_frame = frame;
                break;
            }
            _ => {}
        }
    }

    if let Some(Seat { code, room }) = seat {
        leave_room(&state, &code, &room, player).await;
    }
    send_task.abort();
    match close_frame {
        Some(frame) => info!(%player, code = frame.code, reason = %frame.reason, "WS disconnected"),
        None => info!(%player, "WS disconnected"),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::http::header::LOCATION;
    use sketchduel_shared::{Role, Segment};
    use tokio::net::TcpStream;
    use tokio::time::timeout;
    use tokio_tungstenite::tungstenite::Message as WsMessage;
    use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

    use super::*;
    use crate::prompts::{PromptError, PromptSource};
    use crate::state::Config;

    type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

    struct FixedPrompt;

    #[async_trait]
    impl PromptSource for FixedPrompt {
        async fn generate(&self, _category: &str) -> Result<String, PromptError> {
            Ok("apple".to_string())
        }
    }

    fn test_state() -> AppState {
        AppState::new(
            Config {
                public_dir: PathBuf::from("public"),
                prompt_category: "food".into(),
                room_ttl: Duration::from_secs(600),
            },
            Arc::new(FixedPrompt),
        )
    }

    async fn serve(state: AppState) -> std::net::SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.unwrap();
        });
        addr
    }

    async fn connect(addr: std::net::SocketAddr) -> (Client, PlayerId) {
        let (mut client, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws"))
            .await
            .unwrap();
        let ServerMessage::Connected { player_id } = recv(&mut client).await else {
            panic!("expected connected first");
        };
        (client, player_id)
    }

    async fn recv(client: &mut Client) -> ServerMessage {
        loop {
            let message = timeout(Duration::from_secs(2), client.next())
                .await
                .expect("receive timed out")
                .expect("socket closed")
                .expect("socket error");
            if message.is_text() {
                return serde_json::from_str(message.to_text().unwrap()).unwrap();
            }
        }
    }

    async fn send(client: &mut Client, message: &ClientMessage) {
        let payload = serde_json::to_string(message).unwrap();
        client.send(WsMessage::text(payload)).await.unwrap();
    }

    fn location(redirect: Redirect) -> String {
        let response = redirect.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        response.headers()[LOCATION].to_str().unwrap().to_string()
    }

    #[test]
    fn query_values_are_percent_encoded() {
        assert_eq!(encode_query_value("Room is full"), "Room%20is%20full");
        assert_eq!(encode_query_value("a-b_c.d~e"), "a-b_c.d~e");
        assert_eq!(encode_query_value("A: ok"), "A%3A%20ok");
    }

    #[tokio::test]
    async fn lobby_join_redirects() {
        let state = test_state();
        let code = create_room(&state).await;

        let ok = join_room_handler(
            State(state.clone()),
            Form(JoinForm {
                room_code: code.as_str().to_lowercase(),
            }),
        )
        .await;
        assert_eq!(location(ok), format!("/game/{code}"));

        let missing = join_room_handler(
            State(state.clone()),
            Form(JoinForm {
                room_code: if code.as_str() == "QQQQ" { "WWWW" } else { "QQQQ" }.into(),
            }),
        )
        .await;
        assert_eq!(location(missing), "/?error=Room%20not%20found");

        let invalid = join_room_handler(
            State(state),
            Form(JoinForm {
                room_code: "AB".into(),
            }),
        )
        .await;
        assert!(location(invalid).starts_with("/?error=Invalid%20room%20code"));
    }

    #[tokio::test]
    async fn create_room_redirects_to_game_page() {
        let state = test_state();
        let target = location(create_room_handler(State(state.clone())).await);
        let code = RoomCode::parse(target.trim_start_matches("/game/")).unwrap();
        assert!(find_room(&state, &code).await.is_some());
    }

    #[tokio::test]
    async fn two_players_draw_and_guess_over_websocket() {
        let state = test_state();
        let code = create_room(&state).await;
        let addr = serve(state.clone()).await;
        let room_code = code.to_string();

        let (mut drawer, drawer_id) = connect(addr).await;
        send(&mut drawer, &ClientMessage::Join { room_code: room_code.clone() }).await;
        assert!(matches!(recv(&mut drawer).await, ServerMessage::Waiting { .. }));

        let (mut guesser, guesser_id) = connect(addr).await;
        send(&mut guesser, &ClientMessage::Join { room_code: room_code.clone() }).await;

        let ServerMessage::GameStart { roles, prompt, .. } = recv(&mut drawer).await else {
            panic!("drawer expected game_start");
        };
        assert_eq!(roles.get(&drawer_id), Some(&Role::Drawer));
        assert_eq!(prompt.as_deref(), Some("apple"));
        let ServerMessage::GameStart { roles, prompt, .. } = recv(&mut guesser).await else {
            panic!("guesser expected game_start");
        };
        assert_eq!(roles.get(&guesser_id), Some(&Role::Guesser));
        assert_eq!(prompt, None);

        let segment = Segment {
            x: 0.1,
            y: 0.1,
            x2: 0.2,
            y2: 0.3,
            color: "#ff0000".into(),
            width: 4.0,
        };
        send(
            &mut drawer,
            &ClientMessage::Draw {
                room_code: room_code.clone(),
                action: DrawAction::Segment(segment.clone()),
            },
        )
        .await;
        assert_eq!(
            recv(&mut guesser).await,
            ServerMessage::DrawUpdate {
                action: DrawAction::Segment(segment)
            }
        );

        for action in [DrawAction::Undo, DrawAction::Clear] {
            send(
                &mut drawer,
                &ClientMessage::Draw {
                    room_code: room_code.clone(),
                    action: action.clone(),
                },
            )
            .await;
            assert_eq!(recv(&mut guesser).await, ServerMessage::DrawUpdate { action });
        }

        send(
            &mut guesser,
            &ClientMessage::Guess {
                room_code: room_code.clone(),
                guess: "pear".into(),
            },
        )
        .await;
        assert_eq!(
            recv(&mut drawer).await,
            ServerMessage::ChatUpdate {
                message: "pear".into(),
                player_id: guesser_id
            }
        );

        send(
            &mut guesser,
            &ClientMessage::Guess {
                room_code,
                guess: " Apple ".into(),
            },
        )
        .await;
        for client in [&mut drawer, &mut guesser] {
            let ServerMessage::CorrectGuess { player_id, scores } = recv(client).await else {
                panic!("expected correct_guess");
            };
            assert_eq!(player_id, guesser_id);
            assert_eq!(scores.get(&guesser_id), Some(&1));
        }
        let ServerMessage::NewRound { roles, prompt } = recv(&mut guesser).await else {
            panic!("expected new_round");
        };
        assert_eq!(roles.get(&guesser_id), Some(&Role::Drawer));
        assert_eq!(prompt.as_deref(), Some("apple"));

        drop(guesser);
        let ServerMessage::NewRound { prompt, .. } = recv(&mut drawer).await else {
            panic!("expected new_round");
        };
        assert_eq!(prompt, None);
        assert!(matches!(recv(&mut drawer).await, ServerMessage::PlayerLeft { .. }));
    }

    #[tokio::test]
    async fn third_player_gets_room_full() {
        let state = test_state();
        let code = create_room(&state).await;
        let addr = serve(state).await;
        let join = ClientMessage::Join {
            room_code: code.to_string(),
        };

        let (mut first, _) = connect(addr).await;
        send(&mut first, &join).await;
        recv(&mut first).await;
        let (mut second, _) = connect(addr).await;
        send(&mut second, &join).await;
        recv(&mut second).await;

        let (mut third, _) = connect(addr).await;
        send(&mut third, &join).await;
        assert_eq!(
            recv(&mut third).await,
            ServerMessage::Error {
                message: "Room is full".into()
            }
        );
    }
}
