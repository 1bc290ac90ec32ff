use std::time::{Duration, Instant};

use actix::prelude::*;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::{GameFrame, UserId};
use crate::error::AppError;
use crate::extractors::current_user::CurrentUser;
use crate::services::LoadedGame;
use crate::state::app_state::AppState;
use crate::ws::protocol::{ClientMsg, ServerMsg, WsErrorCode};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(20);
const CLIENT_TIMEOUT: Duration = Duration::from_secs(40);

/// `GET /api/game/ws`. The local total is read before the upgrade, so a
/// caller without a team gets an ordinary `404 NO_TEAM` response and no socket.
pub async fn upgrade(
    req: HttpRequest,
    stream: web::Payload,
    current_user: CurrentUser,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let game = app_state
        .game
        .load(&current_user.token, &current_user.me.user)
        .await
        .map_err(AppError::from)?;

    let session = GameSession::new(current_user.me.user.id, game);
    ws::start(session, &req, stream)
}

/// One game page: owns its timer and streams every frame to the client.
pub struct GameSession {
    conn_id: Uuid,
    user_id: UserId,
    game: LoadedGame,
    last_heartbeat: Instant,
}

impl GameSession {
    fn new(user_id: UserId, game: LoadedGame) -> Self {
        Self {
            conn_id: Uuid::new_v4(),
            user_id,
            game,
            last_heartbeat: Instant::now(),
        }
    }

    fn send_json(ctx: &mut ws::WebsocketContext<Self>, msg: &ServerMsg) {
        match serde_json::to_string(msg) {
            Ok(payload) => ctx.text(payload),
            Err(err) => warn!(error = %err, "[GAME WS] failed to serialize outbound message"),
        }
    }

    fn send_error(ctx: &mut ws::WebsocketContext<Self>, code: WsErrorCode, message: &str) {
        Self::send_json(
            ctx,
            &ServerMsg::Error {
                code,
                message: message.to_string(),
            },
        );
    }

    fn start_heartbeat(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |actor, ctx| {
            if Instant::now().duration_since(actor.last_heartbeat) > CLIENT_TIMEOUT {
                warn!(
                    conn_id = %actor.conn_id,
                    user_id = %actor.user_id,
                    "[GAME WS] heartbeat timed out"
                );
                ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Normal)));
                ctx.stop();
                return;
            }
            ctx.ping(b"keepalive");
        });
    }

    fn handle_command(&mut self, cmd: ClientMsg) {
        let controller = &self.game.controller;
        let changed = match cmd {
            ClientMsg::Start => controller.start(),
            ClientMsg::Stop => controller.stop(),
        };
        debug!(conn_id = %self.conn_id, ?cmd, changed, "[GAME WS] command");
    }
}

impl Actor for GameSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        info!(
            conn_id = %self.conn_id,
            user_id = %self.user_id,
            points_total = self.game.points_total,
            play_seconds = self.game.controller.frame().play_seconds,
            "[GAME WS] started"
        );

        // Yields the current (ready) frame first, then every change.
        ctx.add_stream(WatchStream::new(self.game.controller.subscribe()));
        self.start_heartbeat(ctx);
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        self.game.controller.stop();
        info!(
            conn_id = %self.conn_id,
            user_id = %self.user_id,
            "[GAME WS] stopped"
        );
    }
}

impl StreamHandler<GameFrame> for GameSession {
    fn handle(&mut self, frame: GameFrame, ctx: &mut Self::Context) {
        Self::send_json(ctx, &ServerMsg::frame(frame));
    }

    // The frame stream only ends with the controller; the socket decides when to stop.
    fn finished(&mut self, _ctx: &mut Self::Context) {}
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for GameSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(payload)) => {
                self.last_heartbeat = Instant::now();
                ctx.pong(&payload);
            }
            Ok(ws::Message::Pong(_)) => {
                self.last_heartbeat = Instant::now();
            }
            Ok(ws::Message::Text(text)) => {
                self.last_heartbeat = Instant::now();
                match serde_json::from_str::<ClientMsg>(&text) {
                    Ok(cmd) => self.handle_command(cmd),
                    Err(_) => Self::send_error(
                        ctx,
                        WsErrorCode::BadRequest,
                        "Expected {\"type\":\"start\"} or {\"type\":\"stop\"}",
                    ),
                }
            }
            Ok(ws::Message::Binary(_)) => {
                self.last_heartbeat = Instant::now();
                Self::send_error(ctx, WsErrorCode::Unsupported, "Binary frames are not supported");
            }
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            Ok(ws::Message::Continuation(_)) | Ok(ws::Message::Nop) => {
                self.last_heartbeat = Instant::now();
            }
            Err(err) => {
                warn!(
                    conn_id = %self.conn_id,
                    error = %err,
                    "[GAME WS] protocol error"
                );
                ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Error)));
                ctx.stop();
            }
        }
    }
}
