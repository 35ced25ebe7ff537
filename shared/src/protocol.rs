use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::Segment;

pub type PlayerId = Uuid;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Drawer,
    Guesser,
}

impl Role {
    pub fn swapped(self) -> Self {
        match self {
            Role::Drawer => Role::Guesser,
            Role::Guesser => Role::Drawer,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    #[default]
    Classic,
}

/// Payload of a `draw` / `draw_update` frame. Flattened next to the other
/// fields: a segment, `clear: true`, or `undo: true`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(try_from = "DrawFields", into = "DrawFields")]
pub enum DrawAction {
    Segment(Segment),
    Clear,
    Undo,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("draw payload is missing field `{0}`")]
    MissingField(&'static str),
}

#[derive(Serialize, Deserialize, Default)]
struct DrawFields {
    #[serde(default, skip_serializing_if = "is_false")]
    clear: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    undo: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    x2: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    y2: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    width: Option<f64>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl TryFrom<DrawFields> for DrawAction {
    type Error = ProtocolError;

    fn try_from(fields: DrawFields) -> Result<Self, Self::Error> {
        if fields.clear {
            return Ok(DrawAction::Clear);
        }
        if fields.undo {
            return Ok(DrawAction::Undo);
        }
        Ok(DrawAction::Segment(Segment {
            x: fields.x.ok_or(ProtocolError::MissingField("x"))?,
            y: fields.y.ok_or(ProtocolError::MissingField("y"))?,
            x2: fields.x2.ok_or(ProtocolError::MissingField("x2"))?,
            y2: fields.y2.ok_or(ProtocolError::MissingField("y2"))?,
            color: fields.color.unwrap_or_default(),
            width: fields.width.unwrap_or(crate::DEFAULT_WIDTH),
        }))
    }
}

impl From<DrawAction> for DrawFields {
    fn from(action: DrawAction) -> Self {
        match action {
            DrawAction::Clear => DrawFields {
                clear: true,
                ..DrawFields::default()
            },
            DrawAction::Undo => DrawFields {
                undo: true,
                ..DrawFields::default()
            },
            DrawAction::Segment(segment) => DrawFields {
                x: Some(segment.x),
                y: Some(segment.y),
                x2: Some(segment.x2),
                y2: Some(segment.y2),
                color: Some(segment.color),
                width: Some(segment.width),
                ..DrawFields::default()
            },
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "join")]
    Join { room_code: String },
    #[serde(rename = "draw")]
    Draw {
        room_code: String,
        #[serde(flatten)]
        action: DrawAction,
    },
    #[serde(rename = "guess")]
    Guess { room_code: String, guess: String },
}

impl ClientMessage {
    pub fn room_code(&self) -> &str {
        match self {
            ClientMessage::Join { room_code }
            | ClientMessage::Draw { room_code, .. }
            | ClientMessage::Guess { room_code, .. } => room_code,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "connected")]
    Connected { player_id: PlayerId },
    #[serde(rename = "waiting")]
    Waiting { message: String },
    #[serde(rename = "game_start")]
    GameStart {
        players: Vec<PlayerId>,
        roles: BTreeMap<PlayerId, Role>,
        prompt: Option<String>,
        mode: GameMode,
    },
    #[serde(rename = "draw_update")]
    DrawUpdate {
        #[serde(flatten)]
        action: DrawAction,
    },
    #[serde(rename = "chat_update")]
    ChatUpdate { message: String, player_id: PlayerId },
    #[serde(rename = "correct_guess")]
    CorrectGuess {
        player_id: PlayerId,
        scores: BTreeMap<PlayerId, u32>,
    },
    #[serde(rename = "new_round")]
    NewRound {
        roles: BTreeMap<PlayerId, Role>,
        prompt: Option<String>,
    },
    #[serde(rename = "player_left")]
    PlayerLeft { message: String },
    #[serde(rename = "error")]
    Error { message: String },
}

impl ServerMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::Connected { .. } => "connected",
            ServerMessage::Waiting { .. } => "waiting",
            ServerMessage::GameStart { .. } => "game_start",
            ServerMessage::DrawUpdate { .. } => "draw_update",
            ServerMessage::ChatUpdate { .. } => "chat_update",
            ServerMessage::CorrectGuess { .. } => "correct_guess",
            ServerMessage::NewRound { .. } => "new_round",
            ServerMessage::PlayerLeft { .. } => "player_left",
            ServerMessage::Error { .. } => "error",
        }
    }
}
