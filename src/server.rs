#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use hyper::server::conn::AddrStream;
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Request, Response, Server};

#[macro_use]
mod error;
#[macro_use]
mod utils;
mod api;
mod chats;
mod context;
mod cors;
mod database;
mod date_format;
mod events;
mod flags;
mod friends;
mod logger;
mod rooms;
mod session;
mod validators;
mod websocket;

use crate::error::AppError;
use crate::events::EventHub;

async fn router(req: Request<Body>, hub: Arc<EventHub>) -> api::AppResult {
    let path = req.uri().path().to_string();

    if let Some(rest) = path.strip_prefix("/api/rooms") {
        return rooms::router(req, rest, hub).await;
    }
    if let Some(rest) = path.strip_prefix("/api/chats") {
        return chats::router(req, rest, hub).await;
    }
    if let Some(rest) = path.strip_prefix("/api/events") {
        return events::router(req, rest, hub).await;
    }
    if let Some(rest) = path.strip_prefix("/api/session") {
        return session::router(req, rest).await;
    }
    Err(AppError::missing())
}

async fn handler(req: Request<Body>, hub: Arc<EventHub>) -> Result<Response<Body>, hyper::Error> {
    use std::time::SystemTime;
    let method = req.method().clone();
    let uri = req.uri().clone();
    let start = SystemTime::now();
    if context::debug() && method == hyper::Method::OPTIONS {
        return Ok(cors::preflight_requests(req));
    }
    let mut response = router(req, hub).await.unwrap_or_else(|e| {
        if e.status_code().is_server_error() {
            log::error!("{}: {}", uri, e);
        }
        api::error_response(&e)
    });
    if context::debug() {
        response = cors::allow_origin(response);
    }
    let elapsed = SystemTime::now()
        .duration_since(start)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default();
    log::debug!("{} {} {}ms", method, uri, elapsed);
    Ok(response)
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    if let Err(e) = logger::setup_logger(context::debug()) {
        eprintln!("failed to initialize the logger: {}", e);
    }
    context::init().await;

    let hub = Arc::new(EventHub::new());
    events::tasks::start(hub.clone());

    let addr = SocketAddr::from(([127, 0, 0, 1], context::port()));
    let make_svc = make_service_fn::<_, AddrStream, _>(move |_| {
        let hub = hub.clone();
        async move {
            Ok::<_, hyper::Error>(service_fn(move |req| handler(req, hub.clone())))
        }
    });

    log::info!("listening on {}", addr);
    let server = Server::bind(&addr).serve(make_svc);
    if let Err(e) = server.await {
        log::error!("server error: {}", e);
    }
}
