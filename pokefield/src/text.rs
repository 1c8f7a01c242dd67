/// Text that appears one character at a time.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Typewriter {
    text: String,
    total_chars: usize,
    shown_chars: usize,
    carry_ms: u64,
    char_ms: u64,
}

impl Typewriter {
    pub fn new(text: impl Into<String>, char_ms: u64) -> Self {
        let text = text.into();
        Self {
            total_chars: text.chars().count(),
            text,
            shown_chars: 0,
            carry_ms: 0,
            char_ms: char_ms.max(1),
        }
    }

    pub fn advance(&mut self, dt_ms: u64) {
        if self.is_revealed() {
            return;
        }
        self.carry_ms += dt_ms;
        let reveal = (self.carry_ms / self.char_ms) as usize;
        self.carry_ms %= self.char_ms;
        self.shown_chars = (self.shown_chars + reveal).min(self.total_chars);
    }

    pub fn reveal_all(&mut self) {
        self.shown_chars = self.total_chars;
        self.carry_ms = 0;
    }

    pub fn is_revealed(&self) -> bool {
        self.shown_chars >= self.total_chars
    }

    pub fn visible(&self) -> &str {
        match self.text.char_indices().nth(self.shown_chars) {
            Some((byte, _)) => &self.text[..byte],
            None => &self.text,
        }
    }

    pub fn full_text(&self) -> &str {
        &self.text
    }
}
