use std::sync::Mutex;

use async_trait::async_trait;
use rand::seq::IndexedRandom;
use thiserror::Error;

pub const DEFAULT_CATEGORY: &str = "objects";

const OBJECTS: &[&str] = &[
    "umbrella", "bicycle", "lamp", "guitar", "scissors", "kite", "ladder", "clock", "camera",
    "anchor", "key", "candle", "hammer", "balloon", "chair",
];
const ANIMALS: &[&str] = &[
    "giraffe", "penguin", "octopus", "snail", "elephant", "butterfly", "crab", "owl", "rabbit",
    "shark", "turtle", "horse",
];
const FOOD: &[&str] = &[
    "pizza", "banana", "hot dog", "pineapple", "ice cream", "pretzel", "carrot", "cupcake",
    "sandwich", "watermelon", "taco",
];

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("no prompts available for category `{0}`")]
    Exhausted(String),
}

#[async_trait]
pub trait PromptSource: Send + Sync {
    async fn generate(&self, category: &str) -> Result<String, PromptError>;
}

/// Picks from built-in word lists, avoiding an immediate repeat.
#[derive(Default)]
pub struct WordListPrompts {
    last: Mutex<Option<String>>,
}

fn words_for(category: &str) -> &'static [&'static str] {
    match category.trim().to_ascii_lowercase().as_str() {
        "animals" => ANIMALS,
        "food" => FOOD,
        _ => OBJECTS,
    }
}

impl WordListPrompts {
    fn pick(&self, category: &str) -> Result<String, PromptError> {
        let words = words_for(category);
        let mut last = self.last.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let candidates: Vec<&str> = words
            .iter()
            .copied()
            .filter(|word| last.as_deref() != Some(*word))
            .collect();
        let pool = if candidates.is_empty() {
            words.to_vec()
        } else {
            candidates
        };
        let word = pool
            .choose(&mut rand::rng())
            .ok_or_else(|| PromptError::Exhausted(category.to_string()))?
            .to_string();
        *last = Some(word.clone());
        Ok(word)
    }
}

#[async_trait]
impl PromptSource for WordListPrompts {
    async fn generate(&self, category: &str) -> Result<String, PromptError> {
        self.pick(category)
    }
}
