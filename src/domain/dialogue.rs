/// Typewriter dialogue box.
///
/// State machine: Inactive → Typing → WaitingClose → Inactive.
/// Text is revealed one character per tick once the reveal delay has been
/// strictly exceeded; confirm skips to the full text, a second confirm
/// closes the box.

use log::debug;

pub const CHAR_DELAY_MS: u64 = 35;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DialogueState {
    Inactive,
    Typing,
    WaitingClose,
}

pub struct DialogueSession {
    state: DialogueState,
    speaker: String,
    portrait: String,
    text: Vec<char>,
    revealed: usize,
    last_reveal_ms: u64,
    char_delay_ms: u64,
}

impl DialogueSession {
    pub fn new(char_delay_ms: u64) -> Self {
        DialogueSession {
            state: DialogueState::Inactive,
            speaker: String::new(),
            portrait: String::new(),
            text: Vec::new(),
            revealed: 0,
            last_reveal_ms: 0,
            char_delay_ms,
        }
    }

    pub fn state(&self) -> DialogueState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state != DialogueState::Inactive
    }

    pub fn speaker(&self) -> &str {
        &self.speaker
    }

    pub fn portrait(&self) -> &str {
        &self.portrait
    }

    pub fn revealed_text(&self) -> String {
        self.text[..self.revealed].iter().collect()
    }

    pub fn revealed_len(&self) -> usize {
        self.revealed
    }

    pub fn start(&mut self, speaker: &str, text: &str, portrait: &str, now_ms: u64) {
        debug!("Dialogue: {} says {:?}", speaker, text);
        self.speaker = speaker.to_string();
        self.portrait = portrait.to_string();
        self.text = text.chars().collect();
        self.revealed = 0;
        self.last_reveal_ms = now_ms;
        self.state = if self.text.is_empty() {
            DialogueState::WaitingClose
        } else {
            DialogueState::Typing
        };
    }

    /// Reveal at most one character. Returns true if one was revealed.
    pub fn tick(&mut self, now_ms: u64) -> bool {
        if self.state != DialogueState::Typing {
            return false;
        }
        if now_ms.saturating_sub(self.last_reveal_ms) <= self.char_delay_ms {
            return false;
        }
        self.last_reveal_ms = now_ms;
        self.revealed += 1;
        if self.revealed >= self.text.len() {
            self.revealed = self.text.len();
            self.state = DialogueState::WaitingClose;
        }
        true
    }

    pub fn handle_confirm(&mut self) {
        match self.state {
            DialogueState::Typing => {
                self.revealed = self.text.len();
                self.state = DialogueState::WaitingClose;
            }
            DialogueState::WaitingClose => {
                debug!("Dialogue: {} closed", self.speaker);
                self.state = DialogueState::Inactive;
            }
            DialogueState::Inactive => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reveal_needs_delay_strictly_exceeded() {
        let mut d = DialogueSession::new(CHAR_DELAY_MS);
        d.start("TA Navid", "Hi!", "", 1000);
        assert!(!d.tick(1035));
        assert_eq!(d.revealed_len(), 0);
        assert!(d.tick(1036));
        assert_eq!(d.revealed_text(), "H");
        // one character per tick even after a long stall
        assert!(d.tick(5000));
        assert_eq!(d.revealed_text(), "Hi");
    }

    #[test]
    fn reveal_is_monotonic_and_finishes() {
        let mut d = DialogueSession::new(CHAR_DELAY_MS);
        let text = "Five bears, please.";
        d.start("TA Soroush", text, "", 0);
        let mut last = 0;
        let mut now = 0;
        while d.state() == DialogueState::Typing {
            now += 10;
            d.tick(now);
            assert!(d.revealed_len() >= last);
            assert!(text.starts_with(&d.revealed_text()));
            last = d.revealed_len();
        }
        assert_eq!(d.state(), DialogueState::WaitingClose);
        assert_eq!(d.revealed_text(), text);
    }

    #[test]
    fn confirm_skips_then_closes() {
        let mut d = DialogueSession::new(CHAR_DELAY_MS);
        d.start("Basement Janitor", "Mop.", "", 0);
        d.tick(100);
        d.handle_confirm();
        assert_eq!(d.state(), DialogueState::WaitingClose);
        assert_eq!(d.revealed_text(), "Mop.");
        assert!(d.is_active());
        d.handle_confirm();
        assert_eq!(d.state(), DialogueState::Inactive);
        d.handle_confirm();
        assert_eq!(d.state(), DialogueState::Inactive);
    }

    #[test]
    fn empty_text_waits_for_close() {
        let mut d = DialogueSession::new(CHAR_DELAY_MS);
        d.start("x", "", "", 0);
        assert_eq!(d.state(), DialogueState::WaitingClose);
        assert!(!d.tick(1000));
    }

    #[test]
    fn multibyte_text_reveals_by_char() {
        let mut d = DialogueSession::new(CHAR_DELAY_MS);
        d.start("x", "é!", "", 0);
        d.tick(36);
        assert_eq!(d.revealed_text(), "é");
    }
}
