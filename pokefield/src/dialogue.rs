use crate::text::Typewriter;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DialogueStatus {
    Inactive,
    Revealing,
    AwaitingAdvance,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DialogueAdvance {
    /// The current line was still typing and is now fully shown.
    Revealed,
    NextLine,
    Finished,
    Ignored,
}

/// Modal conversation box. While active the field does not process movement.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DialogueManager {
    lines: Vec<String>,
    index: usize,
    text: Typewriter,
    char_ms: u64,
    speaker: Option<String>,
}

impl DialogueManager {
    pub fn new(char_ms: u64) -> Self {
        Self {
            char_ms,
            ..Self::default()
        }
    }

    /// Starts at line 0, nothing revealed. An empty script leaves the manager inactive.
    pub fn start(&mut self, speaker: Option<String>, lines: Vec<String>) {
        if lines.is_empty() {
            return;
        }
        self.text = Typewriter::new(lines[0].clone(), self.char_ms);
        self.lines = lines;
        self.index = 0;
        self.speaker = speaker;
    }

    pub fn update(&mut self, dt_ms: u64) {
        if self.is_active() {
            self.text.advance(dt_ms);
        }
    }

    pub fn advance(&mut self) -> DialogueAdvance {
        match self.status() {
            DialogueStatus::Inactive => DialogueAdvance::Ignored,
            DialogueStatus::Revealing => {
                self.text.reveal_all();
                DialogueAdvance::Revealed
            }
            DialogueStatus::AwaitingAdvance => {
                self.index += 1;
                match self.lines.get(self.index) {
                    Some(line) => {
                        self.text = Typewriter::new(line.clone(), self.char_ms);
                        DialogueAdvance::NextLine
                    }
                    None => {
                        self.close();
                        DialogueAdvance::Finished
                    }
                }
            }
        }
    }

    pub fn close(&mut self) {
        self.lines.clear();
        self.index = 0;
        self.speaker = None;
        self.text = Typewriter::default();
    }

    pub fn status(&self) -> DialogueStatus {
        if self.lines.is_empty() {
            DialogueStatus::Inactive
        } else if self.text.is_revealed() {
            DialogueStatus::AwaitingAdvance
        } else {
            DialogueStatus::Revealing
        }
    }

    pub fn is_active(&self) -> bool {
        !self.lines.is_empty()
    }

    pub fn visible_text(&self) -> &str {
        self.text.visible()
    }

    pub fn speaker(&self) -> Option<&str> {
        self.speaker.as_deref()
    }

    pub fn has_more_lines(&self) -> bool {
        self.index + 1 < self.lines.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines() -> Vec<String> {
        vec!["Hi!".to_string(), "Bye.".to_string()]
    }

    #[test]
    fn empty_script_stays_inactive() {
        let mut dialogue = DialogueManager::new(50);
        dialogue.start(None, Vec::new());
        assert_eq!(dialogue.status(), DialogueStatus::Inactive);
        assert_eq!(dialogue.advance(), DialogueAdvance::Ignored);
    }

    #[test]
    fn advance_reveals_before_paging() {
        let mut dialogue = DialogueManager::new(50);
        dialogue.start(Some("Oak".into()), lines());
        assert_eq!(dialogue.status(), DialogueStatus::Revealing);
        assert_eq!(dialogue.visible_text(), "");

        assert_eq!(dialogue.advance(), DialogueAdvance::Revealed);
        assert_eq!(dialogue.visible_text(), "Hi!");
        assert_eq!(dialogue.status(), DialogueStatus::AwaitingAdvance);

        assert_eq!(dialogue.advance(), DialogueAdvance::NextLine);
        assert_eq!(dialogue.visible_text(), "");
        assert!(!dialogue.has_more_lines());

        dialogue.update(200);
        assert_eq!(dialogue.visible_text(), "Bye.");
        assert_eq!(dialogue.advance(), DialogueAdvance::Finished);
        assert!(!dialogue.is_active());
        assert_eq!(dialogue.speaker(), None);
    }

    #[test]
    fn update_reveals_at_fixed_rate() {
        let mut dialogue = DialogueManager::new(50);
        dialogue.start(None, lines());
        dialogue.update(100);
        assert_eq!(dialogue.visible_text(), "Hi");
        dialogue.update(50);
        assert_eq!(dialogue.status(), DialogueStatus::AwaitingAdvance);
    }
}
