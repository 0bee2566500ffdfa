//! "User is typing" signal: the message input is focused and holds text.

#[derive(Debug, Clone, Default)]
pub struct TypingSignal {
    focused: bool,
    content: String,
}

impl TypingSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn focus(&mut self) {
        self.focused = true;
    }

    pub fn blur(&mut self) {
        self.focused = false;
    }

    /// Replace the input content.
    pub fn input(&mut self, content: &str) {
        self.content = content.to_string();
    }

    pub fn clear(&mut self) {
        self.content.clear();
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Whitespace-only content does not count as typing.
    pub fn is_typing(&self) -> bool {
        self.focused && !self.content.trim().is_empty()
    }
}
