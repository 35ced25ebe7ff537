use sketchduel_shared::{sanitize_width, DEFAULT_COLOR, DEFAULT_WIDTH, ERASER_COLOR};

pub struct Toolbox {
    color: String,
    width: f64,
    eraser: bool,
}

impl Default for Toolbox {
    fn default() -> Self {
        Self {
            color: DEFAULT_COLOR.to_string(),
            width: DEFAULT_WIDTH,
            eraser: false,
        }
    }
}

impl Toolbox {
    pub fn stroke_color(&self) -> &str {
        if self.eraser {
            ERASER_COLOR
        } else {
            &self.color
        }
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    #[cfg(test)]
    pub fn eraser(&self) -> bool {
        self.eraser
    }

    /// Returns whether the color input should now be disabled.
    pub fn toggle_eraser(&mut self) -> bool {
        self.eraser = !self.eraser;
        self.eraser
    }

    pub fn set_color(&mut self, color: &str) {
        if !color.trim().is_empty() {
            self.color = color.to_string();
        }
    }

    pub fn set_width_from_input(&mut self, value: &str) {
        let width = value.trim().parse::<f64>().unwrap_or(DEFAULT_WIDTH);
        self.width = sanitize_width(width);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eraser_forces_white_and_disables_color() {
        let mut tools = Toolbox::default();
        tools.set_color("#ff0000");
        assert!(tools.toggle_eraser());
        assert_eq!(tools.stroke_color(), ERASER_COLOR);
        tools.set_color("#00ff00");
        assert_eq!(tools.stroke_color(), ERASER_COLOR);
        assert!(!tools.toggle_eraser());
        assert_eq!(tools.stroke_color(), "#00ff00");
    }

    #[test]
    fn width_input_is_sanitized() {
        let mut tools = Toolbox::default();
        tools.set_width_from_input("12");
        assert_eq!(tools.width(), 12.0);
        tools.set_width_from_input("999");
        assert_eq!(tools.width(), 60.0);
        tools.set_width_from_input("abc");
        assert_eq!(tools.width(), DEFAULT_WIDTH);
    }

    #[test]
    fn blank_color_is_ignored() {
        let mut tools = Toolbox::default();
        tools.set_color("");
        assert_eq!(tools.stroke_color(), DEFAULT_COLOR);
    }
}
