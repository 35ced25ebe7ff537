use sketchduel_shared::{ClientMessage, DrawAction, RoomCode, Role, Segment};

use crate::history::History;
use crate::render::{redraw, Surface};
use crate::tools::Toolbox;

enum Pen {
    Idle,
    Drawing { pointer_id: i32, last_x: f64, last_y: f64 },
}

/// Everything the canvas page does with strokes: input, rendering, history
/// and the messages those produce.
pub struct Board<S: Surface> {
    surface: S,
    width: f64,
    height: f64,
    pen: Pen,
    history: History,
    pub tools: Toolbox,
    room_code: RoomCode,
    can_draw: bool,
}

impl<S: Surface> Board<S> {
    pub fn new(surface: S, room_code: RoomCode) -> Self {
        Self {
            surface,
            width: 0.0,
            height: 0.0,
            pen: Pen::Idle,
            history: History::default(),
            tools: Toolbox::default(),
            room_code,
            can_draw: false,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    #[cfg(test)]
    pub fn room_code(&self) -> &RoomCode {
        &self.room_code
    }

    #[cfg(test)]
    pub fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    #[cfg(test)]
    pub fn can_draw(&self) -> bool {
        self.can_draw
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self.pen, Pen::Drawing { .. })
    }

    pub fn set_role(&mut self, role: Role) {
        self.can_draw = role == Role::Drawer;
        if !self.can_draw {
            self.pen = Pen::Idle;
        }
    }

    /// Pointer capture keeps delivering moves from outside the canvas.
    fn clamp_point(&self, x: f64, y: f64) -> (f64, f64) {
        (x.max(0.0).min(self.width), y.max(0.0).min(self.height))
    }

    /// Returns whether this pointer now owns the pen.
    pub fn pointer_down(&mut self, pointer_id: i32, x: f64, y: f64) -> bool {
        if !self.can_draw || self.is_drawing() {
            return false;
        }
        let (x, y) = self.clamp_point(x, y);
        self.pen = Pen::Drawing {
            pointer_id,
            last_x: x,
            last_y: y,
        };
        true
    }

    pub fn pointer_move(&mut self, pointer_id: i32, x: f64, y: f64) -> Option<ClientMessage> {
        let (x, y) = self.clamp_point(x, y);
        let Pen::Drawing {
            pointer_id: active,
            last_x,
            last_y,
        } = &mut self.pen
        else {
            return None;
        };
        if *active != pointer_id {
            return None;
        }
        let segment = Segment {
            x: *last_x,
            y: *last_y,
            x2: x,
            y2: y,
            color: self.tools.stroke_color().to_string(),
            width: self.tools.width(),
        };
        *last_x = x;
        *last_y = y;

        self.surface.stroke_segment(&segment);
        let wire = segment.clone().normalized(self.width, self.height);
        self.history.push_local(segment);
        wire.map(|segment| self.message(DrawAction::Segment(segment)))
    }

    pub fn pointer_up(&mut self, pointer_id: i32) {
        if let Pen::Drawing { pointer_id: active, .. } = self.pen {
            if active == pointer_id {
                self.pen = Pen::Idle;
            }
        }
    }

    pub fn undo(&mut self) -> Option<ClientMessage> {
        self.history.pop_local()?;
        self.redraw();
        Some(self.message(DrawAction::Undo))
    }

    pub fn clear(&mut self) -> ClientMessage {
        self.history.clear();
        self.surface.clear(self.width, self.height);
        self.message(DrawAction::Clear)
    }

    pub fn start_round(&mut self) {
        self.pen = Pen::Idle;
        self.history.clear();
        self.surface.clear(self.width, self.height);
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.history
            .rescale(self.width, self.height, width, height);
        self.width = width;
        self.height = height;
        self.redraw();
    }

    pub fn apply_update(&mut self, action: DrawAction) {
        match action {
            DrawAction::Segment(segment) => {
                let Some(segment) = segment.sanitized() else {
                    return;
                };
                let segment = segment.to_pixels(self.width, self.height);
                self.surface.stroke_segment(&segment);
                self.history.push_remote(segment);
            }
            DrawAction::Clear => {
                self.history.clear();
                self.surface.clear(self.width, self.height);
            }
            DrawAction::Undo => {
                if self.history.pop_remote().is_some() {
                    self.redraw();
                }
            }
        }
    }

    pub fn guess_message(&self, text: &str) -> Option<ClientMessage> {
        let guess = text.trim();
        if guess.is_empty() {
            return None;
        }
        Some(ClientMessage::Guess {
            room_code: self.room_code.to_string(),
            guess: guess.to_string(),
        })
    }

    pub fn join_message(&self) -> ClientMessage {
        ClientMessage::Join {
            room_code: self.room_code.to_string(),
        }
    }

    fn redraw(&self) {
        redraw(&self.surface, &self.history, self.width, self.height);
    }

    fn message(&self, action: DrawAction) -> ClientMessage {
        ClientMessage::Draw {
            room_code: self.room_code.to_string(),
            action,
        }
    }
}
