/// Platform-agnostic input handling system
use std::collections::HashSet;

/// Input state shared between event callbacks (writer) and the frame loop
/// (reader). Safe without locks under cooperative single-threaded
/// scheduling; a multi-threaded host would need to wrap this in a lock.
pub struct InputState {
    pub pressed_keys: HashSet<String>,
    pub look_delta: (f32, f32),
    pub pointer_locked: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self {
            pressed_keys: HashSet::new(),
            look_delta: (0.0, 0.0),
            pointer_locked: false,
        }
    }

    pub fn is_key_pressed(&self, key: &str) -> bool {
        self.pressed_keys.contains(key)
    }

    pub fn clear_keys(&mut self) {
        self.pressed_keys.clear();
    }

    /// Take and reset the accumulated mouse-look delta. Called once per
    /// frame; samples are never retained across ticks.
    pub fn consume_look(&mut self) -> (f32, f32) {
        let result = self.look_delta;
        self.look_delta = (0.0, 0.0);
        result
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

/// Key mapping configuration
#[derive(Clone)]
pub struct KeyBindings {
    pub forward: String,
    pub backward: String,
    pub left: String,
    pub right: String,
    pub ascend: String,
    pub descend: String,
    pub escape: String,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            forward: "w".to_string(),
            backward: "s".to_string(),
            left: "a".to_string(),
            right: "d".to_string(),
            ascend: " ".to_string(),
            descend: "Shift".to_string(),
            escape: "Escape".to_string(),
        }
    }
}

/// Maps raw key state onto the viewer's logical movement keys.
#[derive(Clone, Default)]
pub struct InputProcessor {
    bindings: KeyBindings,
}

impl InputProcessor {
    pub fn new(bindings: KeyBindings) -> Self {
        Self { bindings }
    }

    pub fn is_moving_forward(&self, input: &InputState) -> bool {
        input.is_key_pressed(&self.bindings.forward)
            || input.is_key_pressed(&self.bindings.forward.to_uppercase())
            || input.is_key_pressed("ArrowUp")
    }

    pub fn is_moving_backward(&self, input: &InputState) -> bool {
        input.is_key_pressed(&self.bindings.backward)
            || input.is_key_pressed(&self.bindings.backward.to_uppercase())
            || input.is_key_pressed("ArrowDown")
    }

    pub fn is_moving_left(&self, input: &InputState) -> bool {
        input.is_key_pressed(&self.bindings.left)
            || input.is_key_pressed(&self.bindings.left.to_uppercase())
            || input.is_key_pressed("ArrowLeft")
    }

    pub fn is_moving_right(&self, input: &InputState) -> bool {
        input.is_key_pressed(&self.bindings.right)
            || input.is_key_pressed(&self.bindings.right.to_uppercase())
            || input.is_key_pressed("ArrowRight")
    }

    pub fn is_ascending(&self, input: &InputState) -> bool {
        input.is_key_pressed(&self.bindings.ascend)
    }

    pub fn is_descending(&self, input: &InputState) -> bool {
        input.is_key_pressed(&self.bindings.descend)
    }

    pub fn is_escape(&self, key: &str) -> bool {
        key == self.bindings.escape
    }

    /// True for keys the browser would otherwise scroll or tab on.
    pub fn is_navigation_key(&self, key: &str) -> bool {
        matches!(
            key,
            "ArrowUp" | "ArrowDown" | "ArrowLeft" | "ArrowRight" | "w" | "a" | "s" | "d" | "W"
                | "A" | "S" | "D" | " " | "Shift"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_release() {
        let mut input = InputState::new();
        input.pressed_keys.insert("w".to_string());
        assert!(input.is_key_pressed("w"));
        input.pressed_keys.remove("w");
        assert!(!input.is_key_pressed("w"));
    }

    #[test]
    fn test_consume_look_resets() {
        let mut input = InputState::new();
        input.look_delta = (3.0, -2.0);
        assert_eq!(input.consume_look(), (3.0, -2.0));
        assert_eq!(input.consume_look(), (0.0, 0.0));
    }

    #[test]
    fn test_clear_keys_on_focus_loss() {
        let mut input = InputState::new();
        input.pressed_keys.insert("w".to_string());
        input.pressed_keys.insert("d".to_string());
        input.clear_keys();
        assert!(input.pressed_keys.is_empty());
    }

    #[test]
    fn test_processor_reads_bindings() {
        let processor = InputProcessor::default();
        let mut input = InputState::new();
        input.pressed_keys.insert("W".to_string());
        input.pressed_keys.insert(" ".to_string());
        assert!(processor.is_moving_forward(&input));
        assert!(processor.is_ascending(&input));
        assert!(!processor.is_descending(&input));
    }
}
