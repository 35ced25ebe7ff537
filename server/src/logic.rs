use sketchduel_shared::{DrawAction, PlayerId, Role, ServerMessage};
use tracing::{debug, warn};

use crate::game::GameState;
use crate::state::Room;

/// Who receives a message produced by one of the room operations below.
#[derive(Debug, PartialEq)]
pub enum Delivery {
    To(PlayerId, ServerMessage),
    Except(PlayerId, ServerMessage),
    All(ServerMessage),
}

pub fn dispatch(room: &Room, deliveries: Vec<Delivery>) {
    for delivery in deliveries {
        match delivery {
            Delivery::To(player, message) => send_to(room, player, message),
            Delivery::Except(sender, message) => {
                for player in room.peers.keys().filter(|player| **player != sender) {
                    send_to(room, *player, message.clone());
                }
            }
            Delivery::All(message) => {
                for player in room.peers.keys() {
                    send_to(room, *player, message.clone());
                }
            }
        }
    }
}

fn send_to(room: &Room, player: PlayerId, message: ServerMessage) {
    if let Some(peer) = room.peers.get(&player) {
        if peer.send(message).is_err() {
            debug!(%player, "peer channel closed");
        }
    }
}

pub fn start_game(room: &mut Room, prompt: String) -> Vec<Delivery> {
    let game = GameState::start(&room.players, prompt);
    let deliveries = room
        .players
        .iter()
        .map(|player| Delivery::To(*player, game.start_message_for(*player)))
        .collect();
    room.game = Some(game);
    deliveries
}

/// Forwards a stroke, clear or undo from the drawer to everyone else.
pub fn relay_draw(room: &Room, sender: PlayerId, action: DrawAction) -> Vec<Delivery> {
    let Some(game) = &room.game else {
        debug!(%sender, "draw before game start dropped");
        return Vec::new();
    };
    if game.role(sender) != Some(Role::Drawer) {
        warn!(%sender, "draw from non-drawer dropped");
        return Vec::new();
    }
    let action = match action {
        DrawAction::Segment(segment) => match segment.sanitized() {
            Some(segment) => DrawAction::Segment(segment),
            None => return Vec::new(),
        },
        other => other,
    };
    vec![Delivery::Except(sender, ServerMessage::DrawUpdate { action })]
}

/// `next_prompt` is fetched by the caller when the guess already looked
/// correct; without it a guess is only relayed as chat.
pub fn apply_guess(
    room: &mut Room,
    sender: PlayerId,
    guess: &str,
    next_prompt: Option<String>,
) -> Vec<Delivery> {
    let guess = guess.trim();
    let Some(game) = &mut room.game else {
        return Vec::new();
    };
    if guess.is_empty() || game.role(sender) != Some(Role::Guesser) {
        return Vec::new();
    }
    match next_prompt {
        Some(prompt) if game.check_guess(guess, sender) => {
            let score = game.award(sender);
            debug!(%sender, score, round = game.round, "correct guess");
            let mut deliveries = vec![Delivery::All(ServerMessage::CorrectGuess {
                player_id: sender,
                scores: game.scores.clone(),
            })];
            game.next_round(prompt);
            deliveries.extend(
                game.players
                    .iter()
                    .map(|player| Delivery::To(*player, game.round_message_for(*player))),
            );
            deliveries
        }
        _ => vec![Delivery::Except(
            sender,
            ServerMessage::ChatUpdate {
                message: guess.to_string(),
                player_id: sender,
            },
        )],
    }
}

/// Removes the player and ends any running game.
pub fn leave(room: &mut Room, player: PlayerId) -> Vec<Delivery> {
    room.players.retain(|id| *id != player);
    room.peers.remove(&player);
    room.game = None;
    if room.players.is_empty() {
        return Vec::new();
    }
    vec![Delivery::All(ServerMessage::PlayerLeft {
        message: "Opponent disconnected".to_string(),
    })]
}
