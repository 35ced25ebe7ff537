use std::collections::BTreeMap;

use sketchduel_shared::{PlayerId, Role};

/// What the side panel knows about the match.
#[derive(Default)]
pub struct GameView {
    pub player_id: Option<PlayerId>,
    pub role: Option<Role>,
    pub prompt: Option<String>,
    pub scores: BTreeMap<PlayerId, u32>,
    pub round: u32,
}

impl GameView {
    /// Picks this player's role out of a `game_start` / `new_round` roles map.
    pub fn apply_roles(&mut self, roles: &BTreeMap<PlayerId, Role>, prompt: Option<String>) -> Option<Role> {
        self.role = self.player_id.and_then(|id| roles.get(&id).copied());
        self.prompt = match self.role {
            Some(Role::Drawer) => prompt,
            _ => None,
        };
        self.round += 1;
        for player in roles.keys() {
            self.scores.entry(*player).or_insert(0);
        }
        self.role
    }

    pub fn speaker(&self, player: PlayerId) -> &'static str {
        if Some(player) == self.player_id {
            "You"
        } else {
            "Opponent"
        }
    }

    pub fn own_score(&self) -> u32 {
        self.player_id
            .and_then(|id| self.scores.get(&id).copied())
            .unwrap_or(0)
    }

    pub fn opponent_score(&self) -> u32 {
        self.scores
            .iter()
            .filter(|(id, _)| Some(**id) != self.player_id)
            .map(|(_, score)| *score)
            .sum()
    }

    pub fn score_line(&self) -> String {
        format!("You {} : {} Opponent", self.own_score(), self.opponent_score())
    }

    pub fn role_line(&self) -> String {
        match (self.role, &self.prompt) {
            (Some(Role::Drawer), Some(prompt)) => format!("Round {}: draw \"{prompt}\"", self.round),
            (Some(Role::Drawer), None) => format!("Round {}: you are drawing", self.round),
            (Some(Role::Guesser), _) => format!("Round {}: guess the drawing", self.round),
            (None, _) => "Spectating".to_string(),
        }
    }

    pub fn reset(&mut self) {
        let player_id = self.player_id;
        *self = GameView {
            player_id,
            ..GameView::default()
        };
    }
}
