//! The login view: a four-cell PIN pad that submits itself when full.

use crate::routes::Route;
use crate::session::{SessionError, SessionStore, PIN_LENGTH};

pub const LOGIN_SUCCESS_MESSAGE: &str = "Login successful";

const LAST: usize = PIN_LENGTH - 1;

/// One input event on the pad.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PinInput {
    /// A value typed into the focused cell. An empty value clears the cell;
    /// more than one character is treated as a paste.
    Text(String),
    Backspace,
    Paste(String),
    FocusPrev,
    FocusNext,
}

impl PinInput {
    pub fn key(c: char) -> Self {
        Self::Text(c.to_string())
    }
}

/// Four single-digit cells and a focus index.
///
/// After any sequence of inputs the focus is in `0..PIN_LENGTH` and each cell
/// holds at most one ASCII digit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PinPad {
    cells: [Option<char>; PIN_LENGTH],
    focus: usize,
}

impl PinPad {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cells(&self) -> &[Option<char>; PIN_LENGTH] {
        &self.cells
    }

    pub fn focus(&self) -> usize {
        self.focus
    }

    pub fn is_complete(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    /// The digits entered so far, in cell order, skipping empty cells.
    pub fn code(&self) -> String {
        self.cells.iter().flatten().collect()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn apply(&mut self, input: &PinInput) {
        match input {
            PinInput::Text(value) => self.change(value),
            PinInput::Backspace => self.backspace(),
            PinInput::Paste(text) => self.paste(text),
            PinInput::FocusPrev => self.focus = self.focus.saturating_sub(1),
            PinInput::FocusNext => self.focus = (self.focus + 1).min(LAST),
        }
    }

    fn change(&mut self, value: &str) {
        let mut chars = value.chars();
        match (chars.next(), chars.next()) {
            (None, _) => self.cells[self.focus] = None,
            (Some(c), None) => {
                if c.is_ascii_digit() {
                    self.cells[self.focus] = Some(c);
                    if self.focus < LAST {
                        self.focus += 1;
                    }
                }
            }
            (Some(_), Some(_)) => self.paste(value),
        }
    }

    fn backspace(&mut self) {
        if self.cells[self.focus].is_some() {
            self.cells[self.focus] = None;
        } else if self.focus > 0 {
            self.focus -= 1;
        }
    }

    fn paste(&mut self, text: &str) {
        let digits = text.chars().filter(char::is_ascii_digit);
        let mut written = false;
        for (index, digit) in (self.focus..PIN_LENGTH).zip(digits) {
            self.cells[index] = Some(digit);
            written = true;
        }
        if !written {
            return;
        }
        // Last cell with content; a full pad ends on the final cell.
        self.focus = if self.is_complete() {
            LAST
        } else {
            self.cells.iter().rposition(Option::is_some).unwrap_or(self.focus)
        };
    }
}

/// What a login input led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Still collecting digits, or the code did not change.
    Editing,
    /// The PIN was accepted; navigate to `landing`.
    Authenticated { landing: Route },
    /// The PIN was rejected; `message` is shown next to the cells.
    Rejected { message: String },
}

/// The login view state: the pad plus the last submission.
#[derive(Debug, Clone, Default)]
pub struct LoginFlow {
    pad: PinPad,
    error: Option<String>,
}

impl LoginFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pad(&self) -> &PinPad {
        &self.pad
    }

    /// Error shown next to the cells.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Apply one input. When it changes the code and every cell is filled, the
    /// code is submitted to `store`.
    pub async fn handle(
        &mut self,
        input: PinInput,
        store: &mut SessionStore,
    ) -> Result<LoginOutcome, SessionError> {
        let before = self.pad.cells;
        self.pad.apply(&input);

        if self.pad.cells != before && self.pad.is_complete() {
            self.submit(store).await
        } else {
            Ok(LoginOutcome::Editing)
        }
    }

    /// Submit whatever is entered, complete or not.
    ///
    /// A rejected PIN is an outcome, not an error; the cells keep their
    /// contents so the operator can correct a single digit.
    pub async fn submit(&mut self, store: &mut SessionStore) -> Result<LoginOutcome, SessionError> {
        let code = self.pad.code();
        match store.login(&code).await {
            Ok(()) => {
                self.error = None;
                Ok(LoginOutcome::Authenticated {
                    landing: Route::LANDING,
                })
            }
            Err(SessionError::InvalidCredential) => {
                let message = store
                    .session()
                    .last_error
                    .clone()
                    .unwrap_or_else(|| SessionError::InvalidCredential.to_string());
                self.error = Some(message.clone());
                Ok(LoginOutcome::Rejected { message })
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(keys: &str) -> PinPad {
        let mut pad = PinPad::new();
        for c in keys.chars() {
            pad.apply(&PinInput::key(c));
        }
        pad
    }

    #[test]
    fn digits_advance_focus_until_last_cell() {
        let pad = typed("54");
        assert_eq!(pad.cells(), &[Some('5'), Some('4'), None, None]);
        assert_eq!(pad.focus(), 2);

        let pad = typed("5434");
        assert!(pad.is_complete());
        assert_eq!(pad.focus(), 3);
        assert_eq!(pad.code(), "5434");
    }

    #[test]
    fn typing_into_full_last_cell_overwrites_it() {
        let pad = typed("54349");
        assert_eq!(pad.code(), "5439");
        assert_eq!(pad.focus(), 3);
    }

    #[test]
    fn non_digits_are_ignored() {
        let pad = typed("a5-");
        assert_eq!(pad.cells(), &[Some('5'), None, None, None]);
        assert_eq!(pad.focus(), 1);
    }

    #[test]
    fn backspace_clears_filled_cell_then_moves_back() {
        let mut pad = typed("5434");
        pad.apply(&PinInput::Backspace);
        assert_eq!(pad.cells(), &[Some('5'), Some('4'), Some('3'), None]);
        assert_eq!(pad.focus(), 3);

        pad.apply(&PinInput::Backspace);
        assert_eq!(pad.focus(), 2);
        assert_eq!(pad.cells()[2], Some('3'));
    }

    #[test]
    fn backspace_stops_at_first_cell() {
        let mut pad = PinPad::new();
        pad.apply(&PinInput::Backspace);
        pad.apply(&PinInput::Backspace);
        assert_eq!(pad.focus(), 0);
    }

    #[test]
    fn empty_text_clears_focused_cell() {
        let mut pad = typed("5");
        pad.apply(&PinInput::FocusPrev);
        pad.apply(&PinInput::Text(String::new()));
        assert_eq!(pad.cells(), &[None; PIN_LENGTH]);
        assert_eq!(pad.focus(), 0);
    }

    #[test]
    fn paste_fills_from_focused_cell() {
        let mut pad = typed("9");
        pad.apply(&PinInput::Paste("12345".to_string()));
        assert_eq!(pad.code(), "9123");
        assert_eq!(pad.focus(), 3);
    }

    #[test]
    fn short_paste_focuses_last_cell_with_content() {
        let mut pad = PinPad::new();
        pad.apply(&PinInput::Paste("5 4".to_string()));
        assert_eq!(pad.cells(), &[Some('5'), Some('4'), None, None]);
        assert_eq!(pad.focus(), 1);
    }

    #[test]
    fn multi_character_text_is_a_paste() {
        let mut pad = PinPad::new();
        pad.apply(&PinInput::Text("5434".to_string()));
        assert_eq!(pad.code(), "5434");
    }

    #[test]
    fn paste_without_digits_changes_nothing() {
        let mut pad = typed("5");
        pad.apply(&PinInput::Paste("abc".to_string()));
        assert_eq!(pad, typed("5"));
    }

    #[test]
    fn focus_moves_stay_in_bounds() {
        let mut pad = PinPad::new();
        for _ in 0..6 {
            pad.apply(&PinInput::FocusNext);
        }
        assert_eq!(pad.focus(), LAST);
        for _ in 0..6 {
            pad.apply(&PinInput::FocusPrev);
        }
        assert_eq!(pad.focus(), 0);
    }
}
