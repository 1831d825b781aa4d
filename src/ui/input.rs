/// Keyboard state tracker.
///
/// Turns the terminal's key event stream into the two shapes the game
/// needs: held keys (walking continues while an arrow is down) and fresh
/// presses (catch, talk, reset fire once per press).
///
/// Release events are honoured once the renderer has enabled crossterm's
/// keyboard enhancement (`honor_release`). Otherwise a key counts as
/// released after `HOLD_TIMEOUT` without a Press/Repeat event.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Keys that went from "not held" to "held" during the most recent
    /// `drain_events()`.
    fresh_presses: Vec<KeyCode>,

    /// Raw key events collected during drain, for Ctrl-C detection.
    raw_events: Vec<KeyEvent>,

    /// Honor Release events. Only true once keyboard enhancement is on.
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            honor_release: false,
        }
    }

    /// Drain all pending terminal events. Call once per frame.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.register(key, Instant::now());
            }
        }

        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    fn register(&mut self, key: KeyEvent, at: Instant) {
        self.raw_events.push(key);
        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&key.code);
            }
            KeyEventKind::Release => {}
            _ => {
                let was_held = self.is_held(key.code);
                self.last_active.insert(key.code, at);
                if !was_held {
                    self.fresh_presses.push(key.code);
                }
            }
        }
    }

    pub fn is_held(&self, code: KeyCode) -> bool {
        self.last_active.get(&code)
            .map(|t| t.elapsed() < HOLD_TIMEOUT)
            .unwrap_or(false)
    }

    pub fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.is_held(*c))
    }

    /// Edge trigger: pressed this frame.
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.fresh_presses.contains(&code)
    }

    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }

    #[cfg(test)]
    fn begin_frame(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, kind: KeyEventKind) -> KeyEvent {
        KeyEvent::new_with_kind(code, KeyModifiers::NONE, kind)
    }

    #[test]
    fn repeat_events_do_not_retrigger() {
        let mut kb = InputState::new();
        let now = Instant::now();
        kb.register(key(KeyCode::Char(' '), KeyEventKind::Press), now);
        assert!(kb.was_pressed(KeyCode::Char(' ')));

        kb.begin_frame();
        kb.register(key(KeyCode::Char(' '), KeyEventKind::Repeat), now);
        assert!(!kb.was_pressed(KeyCode::Char(' ')));
        assert!(kb.is_held(KeyCode::Char(' ')));
    }

    #[test]
    fn release_only_counts_when_enhanced() {
        let mut kb = InputState::new();
        let now = Instant::now();
        kb.register(key(KeyCode::Up, KeyEventKind::Press), now);
        kb.register(key(KeyCode::Up, KeyEventKind::Release), now);
        assert!(kb.is_held(KeyCode::Up));

        kb.honor_release = true;
        kb.register(key(KeyCode::Up, KeyEventKind::Release), now);
        assert!(!kb.is_held(KeyCode::Up));
    }

    #[test]
    fn ctrl_c_detected() {
        let mut kb = InputState::new();
        kb.register(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL), Instant::now());
        assert!(kb.ctrl_c_pressed());
    }
}
