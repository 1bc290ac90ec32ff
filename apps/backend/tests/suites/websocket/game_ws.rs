use std::net::TcpListener;
use std::time::Duration;

use actix_web::dev::ServerHandle;
use actix_web::{web, App, HttpServer};
use futures_util::{SinkExt, StreamExt};
use points_backend::state::app_state::AppState;
use points_backend::{routes, RequestTrace, StructuredLogger, TraceSpan};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::support::{Classroom, STUDENT_TOKEN, TEACHER_TOKEN};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

struct Running {
    addr: String,
    handle: ServerHandle,
}

fn serve(state: AppState) -> Running {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr").to_string();
    let data = web::Data::new(state);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(StructuredLogger)
            .wrap(TraceSpan)
            .wrap(RequestTrace)
            .app_data(data.clone())
            .configure(routes::configure)
    })
    .workers(1)
    .listen(listener)
    .expect("listen")
    .run();

    let handle = server.handle();
    actix_web::rt::spawn(server);
    Running { addr, handle }
}

async fn connect(server: &Running, token: &str) -> Client {
    let url = format!("ws://{}/api/game/ws?access_token={token}", server.addr);
    let (client, _) = connect_async(url).await.expect("websocket handshake");
    client
}

/// Next JSON text message, skipping control frames.
async fn next_json(client: &mut Client) -> Value {
    loop {
        let msg = tokio::time::timeout(RECV_TIMEOUT, client.next())
            .await
            .expect("message before timeout")
            .expect("stream still open")
            .expect("valid websocket message");
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).expect("server sends JSON");
        }
    }
}

async fn send(client: &mut Client, body: &str) {
    client
        .send(Message::text(body.to_string()))
        .await
        .expect("send command");
}

#[actix_web::test]
async fn plays_a_full_round() {
    let room = Classroom::new();
    room.backend.set_local_total(room.student, 0);
    let server = serve(room.state_with_tick(Duration::from_millis(5)));
    let mut client = connect(&server, STUDENT_TOKEN).await;

    let ready = next_json(&mut client).await;
    assert_eq!(ready["type"], "frame");
    assert_eq!(ready["status"], "ready");
    assert_eq!(ready["play_seconds"], 20);
    assert_eq!(ready["controls"]["start_enabled"], true);

    send(&mut client, r#"{"type":"start"}"#).await;

    let mut seen = Vec::new();
    let last = loop {
        let frame = next_json(&mut client).await;
        assert_eq!(frame["type"], "frame");
        seen.push(frame["time_left"].as_u64().expect("time_left"));
        if frame["status"] == "finished" {
            break frame;
        }
    };

    assert_eq!(last["time_left"], 0);
    assert_eq!(last["game_over"], true);
    assert_eq!(last["controls"]["start_enabled"], true);
    assert!(last["text"].as_str().unwrap_or_default().ends_with("Game over!"));
    assert!(seen.windows(2).all(|w| w[0] > w[1]), "countdown must decrease: {seen:?}");

    client.close(None).await.ok();
    server.handle.stop(false).await;
}

#[actix_web::test]
async fn stop_ends_without_game_over() {
    let room = Classroom::new();
    room.backend.set_local_total(room.student, 90);
    let server = serve(room.state_with_tick(Duration::from_millis(20)));
    let mut client = connect(&server, STUDENT_TOKEN).await;

    let ready = next_json(&mut client).await;
    assert_eq!(ready["play_seconds"], 180);

    send(&mut client, r#"{"type":"start"}"#).await;
    let playing = next_json(&mut client).await;
    assert_eq!(playing["status"], "playing");
    assert_eq!(playing["controls"]["stop_enabled"], true);

    send(&mut client, r#"{"type":"stop"}"#).await;
    let stopped = loop {
        let frame = next_json(&mut client).await;
        if frame["status"] == "finished" {
            break frame;
        }
    };
    assert_eq!(stopped["game_over"], false);
    assert!(stopped["time_left"].as_u64().unwrap_or_default() > 0);

    client.close(None).await.ok();
    server.handle.stop(false).await;
}

#[actix_web::test]
async fn bad_commands_get_error_messages() {
    let room = Classroom::new();
    room.backend.set_local_total(room.student, 3);
    let server = serve(room.state());
    let mut client = connect(&server, STUDENT_TOKEN).await;
    next_json(&mut client).await;

    send(&mut client, "start please").await;
    let err = next_json(&mut client).await;
    assert_eq!(err["type"], "error");
    assert_eq!(err["code"], "bad_request");

    client
        .send(Message::binary(vec![1u8, 2, 3]))
        .await
        .expect("send binary");
    let err = next_json(&mut client).await;
    assert_eq!(err["code"], "unsupported");

    client.close(None).await.ok();
    server.handle.stop(false).await;
}

/// Status of a refused handshake.
async fn refused_status(url: String) -> u16 {
    match connect_async(url).await {
        Err(tokio_tungstenite::tungstenite::Error::Http(resp)) => resp.status().as_u16(),
        Err(e) => panic!("expected an HTTP refusal, got {e}"),
        Ok(_) => panic!("handshake should have been refused"),
    }
}

#[actix_web::test]
async fn handshake_refused_without_team_or_token() {
    let room = Classroom::new();
    let server = serve(room.state());

    let no_team = format!("ws://{}/api/game/ws?access_token={TEACHER_TOKEN}", server.addr);
    assert_eq!(refused_status(no_team).await, 404);

    let anonymous = format!("ws://{}/api/game/ws", server.addr);
    assert_eq!(refused_status(anonymous).await, 401);

    server.handle.stop(false).await;
}
