//! Segmented OTP Input
//!
//! One digit per segment. Typing advances focus, backspace on an empty
//! segment walks back, a paste of exactly N digits fills everything at once.
//! Invalid keystrokes and pastes are ignored without touching state.

/// Segments in the default 4-digit input
pub const DEFAULT_SEGMENTS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputOutcome {
    /// Nothing changed
    Ignored,
    Updated,
    /// The final segment was filled; carries the joined digits
    Submit(String),
}

/// Raw UI events, for dispatch from an event loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Digit { index: usize, ch: char },
    Backspace { index: usize },
    Paste(String),
    Focus(usize),
}

#[derive(Debug, Clone)]
pub struct OtpInputController {
    digits: Vec<Option<char>>,
    focus: usize,
}

impl Default for OtpInputController {
    fn default() -> Self {
        Self::new(DEFAULT_SEGMENTS)
    }
}

impl OtpInputController {
    /// At least one segment is always created.
    pub fn new(segments: usize) -> Self {
        Self {
            digits: vec![None; segments.max(1)],
            focus: 0,
        }
    }

    pub fn segments(&self) -> usize {
        self.digits.len()
    }

    pub fn focus(&self) -> usize {
        self.focus
    }

    pub fn digits(&self) -> &[Option<char>] {
        &self.digits
    }

    /// Segment contents as displayed: one digit or empty
    pub fn values(&self) -> Vec<String> {
        self.digits
            .iter()
            .map(|d| d.map(String::from).unwrap_or_default())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.digits.iter().all(Option::is_some)
    }

    pub fn joined(&self) -> String {
        self.digits.iter().flatten().collect()
    }

    fn last(&self) -> usize {
        self.digits.len() - 1
    }

    pub fn type_char(&mut self, index: usize, ch: char) -> InputOutcome {
        if index >= self.digits.len() || !ch.is_ascii_digit() {
            return InputOutcome::Ignored;
        }

        self.digits[index] = Some(ch);
        if index < self.last() {
            self.focus = index + 1;
            return InputOutcome::Updated;
        }

        self.focus = index;
        // A partial code is never submitted
        if self.is_complete() {
            InputOutcome::Submit(self.joined())
        } else {
            InputOutcome::Updated
        }
    }

    pub fn backspace(&mut self, index: usize) -> InputOutcome {
        if index >= self.digits.len() {
            return InputOutcome::Ignored;
        }

        if self.digits[index].take().is_some() {
            self.focus = index;
            InputOutcome::Updated
        } else if index > 0 {
            self.focus = index - 1;
            InputOutcome::Updated
        } else {
            InputOutcome::Ignored
        }
    }

    /// Accepts exactly `segments()` ASCII digits. Does not submit.
    pub fn paste(&mut self, text: &str) -> InputOutcome {
        if text.chars().count() != self.digits.len() || !text.chars().all(|c| c.is_ascii_digit()) {
            return InputOutcome::Ignored;
        }

        for (slot, ch) in self.digits.iter_mut().zip(text.chars()) {
            *slot = Some(ch);
        }
        self.focus = self.last();
        InputOutcome::Updated
    }

    pub fn set_focus(&mut self, index: usize) -> InputOutcome {
        if index >= self.digits.len() || index == self.focus {
            return InputOutcome::Ignored;
        }
        self.focus = index;
        InputOutcome::Updated
    }

    pub fn reset(&mut self) {
        self.digits.fill(None);
        self.focus = 0;
    }

    pub fn apply(&mut self, event: InputEvent) -> InputOutcome {
        match event {
            InputEvent::Digit { index, ch } => self.type_char(index, ch),
            InputEvent::Backspace { index } => self.backspace(index),
            InputEvent::Paste(text) => self.paste(&text),
            InputEvent::Focus(index) => self.set_focus(index),
        }
    }
}
