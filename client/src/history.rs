use sketchduel_shared::Segment;

/// Pixel-space segments currently on the canvas. Local strokes are the ones
/// undo can pop; remote strokes came from the other player.
#[derive(Default)]
pub struct History {
    remote: Vec<Segment>,
    local: Vec<Segment>,
}

impl History {
    pub fn push_local(&mut self, segment: Segment) {
        self.local.push(segment);
    }

    pub fn push_remote(&mut self, segment: Segment) {
        self.remote.push(segment);
    }

    pub fn pop_local(&mut self) -> Option<Segment> {
        self.local.pop()
    }

    pub fn pop_remote(&mut self) -> Option<Segment> {
        self.remote.pop()
    }

    pub fn clear(&mut self) {
        self.remote.clear();
        self.local.clear();
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.remote.len() + self.local.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn local(&self) -> &[Segment] {
        &self.local
    }

    /// Redraw order: everything received, then everything drawn here. Only
    /// one side draws per round, so the two never interleave on screen.
    pub fn iter(&self) -> impl Iterator<Item = &Segment> {
        self.remote.iter().chain(self.local.iter())
    }

    pub fn rescale(&mut self, old_width: f64, old_height: f64, new_width: f64, new_height: f64) {
        for segment in self.remote.iter_mut().chain(self.local.iter_mut()) {
            if let Some(unit) = segment.clone().normalized(old_width, old_height) {
                *segment = unit.to_pixels(new_width, new_height);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(x: f64) -> Segment {
        Segment {
            x,
            y: 10.0,
            x2: x + 10.0,
            y2: 20.0,
            color: "#000".into(),
            width: 2.0,
        }
    }

    #[test]
    fn pop_local_removes_newest_only() {
        let mut history = History::default();
        history.push_local(seg(1.0));
        history.push_local(seg(2.0));
        history.push_remote(seg(3.0));
        assert_eq!(history.pop_local(), Some(seg(2.0)));
        assert_eq!(history.local(), &[seg(1.0)]);
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn iter_replays_remote_first() {
        let mut history = History::default();
        history.push_local(seg(1.0));
        history.push_remote(seg(2.0));
        let xs: Vec<f64> = history.iter().map(|segment| segment.x).collect();
        assert_eq!(xs, vec![2.0, 1.0]);
    }

    #[test]
    fn rescale_keeps_relative_position() {
        let mut history = History::default();
        history.push_local(seg(50.0));
        history.rescale(100.0, 100.0, 200.0, 50.0);
        let scaled = &history.local()[0];
        assert_eq!(scaled.x, 100.0);
        assert_eq!(scaled.x2, 120.0);
        assert_eq!(scaled.y, 5.0);
        assert_eq!(scaled.y2, 10.0);
        assert_eq!(scaled.width, 2.0);
    }

    #[test]
    fn rescale_from_empty_canvas_leaves_entries() {
        let mut history = History::default();
        history.push_remote(seg(5.0));
        history.rescale(0.0, 0.0, 300.0, 300.0);
        assert_eq!(history.iter().next(), Some(&seg(5.0)));
    }

    #[test]
    fn clear_empties_both_sides() {
        let mut history = History::default();
        history.push_local(seg(1.0));
        history.push_remote(seg(2.0));
        history.clear();
        assert!(history.is_empty());
    }
}
