use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use hyper::upgrade::Upgraded;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

use super::api::ConnectQuery;
use crate::api::{parse_query, AppResult, Request};
use crate::error::AppError;
use crate::events::context::EventHub;
use crate::events::Event;
use crate::rooms::Room;
use crate::websocket::{establish_web_socket, log_error};
use crate::{database, session, utils};

type Sender = futures::stream::SplitSink<WebSocketStream<Upgraded>, Message>;

async fn push_events(receiver: tokio::sync::broadcast::Receiver<super::context::SyncEvent>, sink: &mut Sender) {
    let mut stream = BroadcastStream::new(receiver);
    while let Some(next) = stream.next().await {
        match next {
            Ok(event) => {
                if let Err(e) = sink.send(Message::text(event.encoded.clone())).await {
                    log_error(&e);
                    break;
                }
            }
            // a slow consumer skipped some events; keep going
            Err(BroadcastStreamRecvError::Lagged(n)) => {
                log::warn!("a connection lagged behind by {} events", n);
            }
        }
    }
}

async fn wait_close(stream: &mut futures::stream::SplitStream<WebSocketStream<Upgraded>>) {
    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Close(_)) | Err(_) => break,
            // inbound chat goes through the HTTP path; everything else
            // on the socket is ignored
            Ok(_) => (),
        }
    }
}

async fn lobby_connection(ws: WebSocketStream<Upgraded>, hub: Arc<EventHub>) {
    let receiver = hub.subscribe(Event::lobby()).await;
    let (mut sink, mut stream) = ws.split();
    tokio::select! {
        _ = push_events(receiver, &mut sink) => {}
        _ = wait_close(&mut stream) => {}
    }
}

async fn chat_connection(mut ws: WebSocketStream<Upgraded>, hub: Arc<EventHub>, room: Room, username: String) {
    let connection = utils::id();
    if hub
        .presence
        .register(room.id, connection, &username, room.capacity)
        .await
        .is_err()
    {
        log::info!("{} was refused to join the full room {}", username, room.id);
        let frame = CloseFrame {
            code: CloseCode::Policy,
            reason: "the room is full".into(),
        };
        if let Err(e) = ws.close(Some(frame)).await {
            log_error(&e);
        }
        return;
    }
    // fire the join notice before subscribing so the joiner does not
    // receive it
    Event::joined(&hub, room.id, &username).await;
    let receiver = hub.subscribe(room.id).await;

    let (mut sink, mut stream) = ws.split();
    tokio::select! {
        _ = push_events(receiver, &mut sink) => {}
        _ = wait_close(&mut stream) => {}
    }

    // cleanup runs on every exit path, including abrupt disconnects
    if hub.presence.unregister(room.id, connection).await.is_some() {
        Event::left(&hub, room.id, &username).await;
    }
}

async fn connect(req: Request, hub: Arc<EventHub>) -> AppResult {
    let ConnectQuery { mailbox, token } = parse_query(req.uri())?;
    let session = session::authenticate_with_token(&req, token.as_deref()).await?;
    let mailbox = match mailbox {
        None => {
            return establish_web_socket(req, move |ws| lobby_connection(ws, hub));
        }
        Some(mailbox) => mailbox,
    };
    let mut db = database::get().await;
    let room = Room::get_by_id(&mut *db, &mailbox)
        .await?
        .ok_or(AppError::NotFound("room"))?;
    drop(db);
    let username = session.username;
    establish_web_socket(req, move |ws| chat_connection(ws, hub, room, username))
}

pub async fn router(req: Request, path: &str, hub: Arc<EventHub>) -> AppResult {
    use hyper::Method;

    match (path, req.method().clone()) {
        ("/connect", Method::GET) => connect(req, hub).await,
        _ => Err(AppError::missing()),
    }
}
