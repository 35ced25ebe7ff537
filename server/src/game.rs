use std::collections::BTreeMap;

use sketchduel_shared::{GameMode, PlayerId, Role, ServerMessage};

pub struct GameState {
    pub players: Vec<PlayerId>,
    pub roles: BTreeMap<PlayerId, Role>,
    pub scores: BTreeMap<PlayerId, u32>,
    pub prompt: String,
    pub mode: GameMode,
    pub round: u32,
}

fn normalize_guess(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

impl GameState {
    /// The first player in join order draws the first round.
    pub fn start(players: &[PlayerId], prompt: String) -> Self {
        let roles = players
            .iter()
            .enumerate()
            .map(|(index, player)| {
                let role = if index == 0 { Role::Drawer } else { Role::Guesser };
                (*player, role)
            })
            .collect();
        let scores = players.iter().map(|player| (*player, 0)).collect();
        Self {
            players: players.to_vec(),
            roles,
            scores,
            prompt,
            mode: GameMode::default(),
            round: 1,
        }
    }

    pub fn role(&self, player: PlayerId) -> Option<Role> {
        self.roles.get(&player).copied()
    }

    pub fn check_guess(&self, guess: &str, player: PlayerId) -> bool {
        if self.role(player) != Some(Role::Guesser) {
            return false;
        }
        let guess = normalize_guess(guess);
        !guess.is_empty() && guess == normalize_guess(&self.prompt)
    }

    pub fn award(&mut self, player: PlayerId) -> u32 {
        let score = self.scores.entry(player).or_insert(0);
        *score += 1;
        *score
    }

    pub fn next_round(&mut self, prompt: String) {
        for role in self.roles.values_mut() {
            *role = role.swapped();
        }
        self.prompt = prompt;
        self.round += 1;
    }

    pub fn prompt_for(&self, player: PlayerId) -> Option<String> {
        match self.role(player) {
            Some(Role::Drawer) => Some(self.prompt.clone()),
            _ => None,
        }
    }

    pub fn start_message_for(&self, player: PlayerId) -> ServerMessage {
        ServerMessage::GameStart {
            players: self.players.clone(),
            roles: self.roles.clone(),
            prompt: self.prompt_for(player),
            mode: self.mode,
        }
    }

    pub fn round_message_for(&self, player: PlayerId) -> ServerMessage {
        ServerMessage::NewRound {
            roles: self.roles.clone(),
            prompt: self.prompt_for(player),
        }
    }
}
