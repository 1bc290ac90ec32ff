use serde::{Deserialize, Serialize};

use crate::domain::GameFrame;

/// Commands a game page sends over the socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    Start,
    Stop,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    /// Latest frame, plus its one-line rendering for plain-text clients.
    Frame {
        #[serde(flatten)]
        frame: GameFrame,
        text: String,
    },
    Error {
        code: WsErrorCode,
        message: String,
    },
}

impl ServerMsg {
    pub fn frame(frame: GameFrame) -> Self {
        let text = frame.text();
        ServerMsg::Frame { frame, text }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WsErrorCode {
    BadRequest,
    Unsupported,
}
