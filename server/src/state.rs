use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use sketchduel_shared::{PlayerId, RoomCode, ServerMessage};
use tokio::sync::{mpsc, RwLock};

use crate::game::GameState;
use crate::prompts::PromptSource;

pub const MAX_PLAYERS: usize = 2;

#[derive(Clone, Debug)]
pub struct Config {
    pub public_dir: PathBuf,
    pub prompt_category: String,
    pub room_ttl: Duration,
}

#[derive(Clone)]
pub struct AppState {
    pub rooms: Arc<RwLock<HashMap<RoomCode, Arc<RwLock<Room>>>>>,
    pub prompts: Arc<dyn PromptSource>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config, prompts: Arc<dyn PromptSource>) -> Self {
        Self {
            rooms: Arc::new(RwLock::new(HashMap::new())),
            prompts,
            config: Arc::new(config),
        }
    }
}

pub struct Room {
    /// Join order; the first player draws first.
    pub players: Vec<PlayerId>,
    pub peers: HashMap<PlayerId, mpsc::UnboundedSender<ServerMessage>>,
    pub game: Option<GameState>,
    pub created_at: Instant,
}

impl Room {
    pub fn new() -> Self {
        Self {
            players: Vec::new(),
            peers: HashMap::new(),
            game: None,
            created_at: Instant::now(),
        }
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= MAX_PLAYERS
    }

    pub fn is_idle(&self, ttl: Duration, now: Instant) -> bool {
        self.players.is_empty() && now.saturating_duration_since(self.created_at) >= ttl
    }
}

impl Default for Room {
    fn default() -> Self {
        Self::new()
    }
}
