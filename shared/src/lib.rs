use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod protocol;

pub use protocol::{ClientMessage, DrawAction, GameMode, PlayerId, ProtocolError, Role, ServerMessage};

pub const DEFAULT_COLOR: &str = "#000000";
pub const ERASER_COLOR: &str = "#FFFFFF";
pub const DEFAULT_WIDTH: f64 = 5.0;
pub const MIN_WIDTH: f64 = 1.0;
pub const MAX_WIDTH: f64 = 60.0;
const MAX_COLOR_LEN: usize = 32;

pub const ROOM_CODE_LEN: usize = 4;

/// A single line between two points. Normalized to `[0, 1]` fractions of the
/// canvas on the wire, pixel space in the client's history buffer.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Segment {
    pub x: f64,
    pub y: f64,
    pub x2: f64,
    pub y2: f64,
    pub color: String,
    pub width: f64,
}

impl Segment {
    pub fn normalized(self, width: f64, height: f64) -> Option<Self> {
        if !valid_extent(width) || !valid_extent(height) {
            return None;
        }
        Some(Self {
            x: self.x / width,
            y: self.y / height,
            x2: self.x2 / width,
            y2: self.y2 / height,
            ..self
        })
    }

    pub fn to_pixels(self, width: f64, height: f64) -> Self {
        Self {
            x: self.x * width,
            y: self.y * height,
            x2: self.x2 * width,
            y2: self.y2 * height,
            ..self
        }
    }

    /// Rejects non-finite coordinates and clamps everything else into range.
    pub fn sanitized(self) -> Option<Self> {
        let coords = [self.x, self.y, self.x2, self.y2];
        if coords.iter().any(|value| !value.is_finite()) {
            return None;
        }
        Some(Self {
            x: clamp_unit(self.x),
            y: clamp_unit(self.y),
            x2: clamp_unit(self.x2),
            y2: clamp_unit(self.y2),
            color: sanitize_color(self.color),
            width: sanitize_width(self.width),
        })
    }
}

fn valid_extent(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn clamp_unit(value: f64) -> f64 {
    value.max(0.0).min(1.0)
}

pub fn sanitize_color(mut color: String) -> String {
    if color.trim().is_empty() {
        return DEFAULT_COLOR.to_string();
    }
    if color.len() > MAX_COLOR_LEN {
        let mut end = MAX_COLOR_LEN;
        while !color.is_char_boundary(end) {
            end -= 1;
        }
        color.truncate(end);
    }
    color
}

pub fn sanitize_width(width: f64) -> f64 {
    let width = if width.is_finite() { width } else { DEFAULT_WIDTH };
    width.max(MIN_WIDTH).min(MAX_WIDTH)
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoomCodeError {
    #[error("room code must be {ROOM_CODE_LEN} letters")]
    Length,
    #[error("room code may only contain letters A-Z")]
    Alphabet,
}

/// Four uppercase ASCII letters identifying a room.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct RoomCode(String);

impl RoomCode {
    /// Number of distinct codes.
    pub const COUNT: u32 = 26u32.pow(ROOM_CODE_LEN as u32);

    /// Spells `index` (taken modulo [`RoomCode::COUNT`]) in base 26, `A` = 0.
    pub fn from_index(index: u32) -> Self {
        let mut rest = index % Self::COUNT;
        let mut letters = [b'A'; ROOM_CODE_LEN];
        for slot in letters.iter_mut().rev() {
            *slot = b'A' + (rest % 26) as u8;
            rest /= 26;
        }
        Self(letters.iter().map(|byte| char::from(*byte)).collect())
    }

    pub fn parse(value: &str) -> Result<Self, RoomCodeError> {
        let value = value.trim().to_ascii_uppercase();
        if value.chars().count() != ROOM_CODE_LEN {
            return Err(RoomCodeError::Length);
        }
        if !value.chars().all(|ch| ch.is_ascii_uppercase()) {
            return Err(RoomCodeError::Alphabet);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for RoomCode {
    type Err = RoomCodeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl TryFrom<String> for RoomCode {
    type Error = RoomCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> Self {
        code.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(x: f64, y: f64, x2: f64, y2: f64) -> Segment {
        Segment {
            x,
            y,
            x2,
            y2,
            color: "#123456".into(),
            width: 4.0,
        }
    }

    #[test]
    fn normalized_divides_by_canvas_size() {
        let wire = segment(50.0, 25.0, 100.0, 75.0)
            .normalized(200.0, 100.0)
            .unwrap();
        assert_eq!(wire, segment(0.25, 0.25, 0.5, 0.75));
    }

    #[test]
    fn normalized_rejects_empty_canvas() {
        assert!(segment(1.0, 1.0, 2.0, 2.0).normalized(0.0, 100.0).is_none());
        assert!(segment(1.0, 1.0, 2.0, 2.0)
            .normalized(100.0, f64::NAN)
            .is_none());
    }

    #[test]
    fn to_pixels_restores_at_new_size() {
        let pixels = segment(0.25, 0.5, 1.0, 0.0).to_pixels(400.0, 300.0);
        assert_eq!(pixels, segment(100.0, 150.0, 400.0, 0.0));
    }

    #[test]
    fn sanitized_clamps_and_fills_defaults() {
        let raw = Segment {
            x: -0.5,
            y: 1.5,
            x2: 0.3,
            y2: 0.7,
            color: "   ".into(),
            width: 500.0,
        };
        let clean = raw.sanitized().unwrap();
        assert_eq!(clean.x, 0.0);
        assert_eq!(clean.y, 1.0);
        assert_eq!(clean.color, DEFAULT_COLOR);
        assert_eq!(clean.width, MAX_WIDTH);
    }

    #[test]
    fn sanitized_drops_non_finite_points() {
        assert!(segment(f64::INFINITY, 0.0, 0.0, 0.0).sanitized().is_none());
    }

    #[test]
    fn sanitize_color_truncates_on_char_boundary() {
        let long = "é".repeat(20);
        let clean = sanitize_color(long);
        assert!(clean.len() <= 32);
        assert!(clean.chars().all(|ch| ch == 'é'));
    }

    #[test]
    fn sanitize_width_defaults_nan() {
        assert_eq!(sanitize_width(f64::NAN), DEFAULT_WIDTH);
        assert_eq!(sanitize_width(0.2), MIN_WIDTH);
    }

    #[test]
    fn room_code_is_uppercased() {
        let code = RoomCode::parse(" abcd ").unwrap();
        assert_eq!(code.as_str(), "ABCD");
    }

    #[test]
    fn room_code_from_index_spells_base_26() {
        assert_eq!(RoomCode::from_index(0).as_str(), "AAAA");
        assert_eq!(RoomCode::from_index(27).as_str(), "AABB");
        assert_eq!(RoomCode::from_index(RoomCode::COUNT - 1).as_str(), "ZZZZ");
        assert_eq!(RoomCode::from_index(RoomCode::COUNT).as_str(), "AAAA");
    }

    #[test]
    fn room_code_rejects_bad_input() {
        assert_eq!(RoomCode::parse("ABC"), Err(RoomCodeError::Length));
        assert_eq!(RoomCode::parse("AB1D"), Err(RoomCodeError::Alphabet));
        assert_eq!(RoomCode::parse("ÄBCD"), Err(RoomCodeError::Alphabet));
    }
}
