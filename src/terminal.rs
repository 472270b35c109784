//! Terminal front-end for the login view.
//!
//! Raw mode with bracketed paste, so each keystroke reaches the PIN pad as it
//! happens and a pasted code arrives as one paste event.

use std::io::{self, IsTerminal, Write};

use anyhow::{Context, Result};
use crossterm::cursor::MoveToColumn;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::Print;
use crossterm::terminal::{self, ClearType};
use crossterm::{execute, queue};

use crate::login::{LoginFlow, LoginOutcome, PinInput, PinPad};
use crate::session::SessionStore;

/// Whether stdin and stdout are both attached to a terminal.
pub fn is_interactive() -> bool {
    io::stdin().is_terminal() && io::stdout().is_terminal()
}

/// Terminal width for table rendering, if stdout is a terminal.
pub fn width() -> Option<u16> {
    if !io::stdout().is_terminal() {
        return None;
    }
    terminal::size().ok().map(|(cols, _)| cols)
}

/// What a key press means to the login prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Action {
    Input(PinInput),
    Submit,
    Abort,
    Ignore,
}

fn action_for(event: Event) -> Action {
    match event {
        Event::Paste(text) => Action::Input(PinInput::Paste(text)),
        Event::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            ..
        }) => match code {
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => Action::Abort,
            KeyCode::Esc => Action::Abort,
            KeyCode::Enter => Action::Submit,
            KeyCode::Backspace => Action::Input(PinInput::Backspace),
            KeyCode::Delete => Action::Input(PinInput::Text(String::new())),
            KeyCode::Left => Action::Input(PinInput::FocusPrev),
            KeyCode::Right => Action::Input(PinInput::FocusNext),
            KeyCode::Char(c) => Action::Input(PinInput::key(c)),
            _ => Action::Ignore,
        },
        _ => Action::Ignore,
    }
}

/// One line showing the four cells, the focused one in brackets.
pub fn render_pad(pad: &PinPad) -> String {
    pad.cells()
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            let c = cell.unwrap_or('·');
            if i == pad.focus() {
                format!("[{c}]")
            } else {
                format!(" {c} ")
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Restores the terminal when dropped.
struct RawMode;

impl RawMode {
    fn enter() -> Result<Self> {
        terminal::enable_raw_mode().context("Failed to enable raw mode")?;
        execute!(io::stdout(), event::EnableBracketedPaste)?;
        Ok(Self)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), event::DisableBracketedPaste);
        let _ = terminal::disable_raw_mode();
    }
}

fn draw(flow: &LoginFlow) -> Result<()> {
    let mut stdout = io::stdout();
    let mut line = format!("PIN  {}", render_pad(flow.pad()));
    if let Some(error) = flow.error() {
        line.push_str("   ");
        line.push_str(error);
    }
    queue!(
        stdout,
        MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(line)
    )?;
    stdout.flush()?;
    Ok(())
}

/// Collect the PIN interactively. Returns `None` if the operator aborts.
pub async fn prompt_login(store: &mut SessionStore) -> Result<Option<LoginOutcome>> {
    let mut flow = LoginFlow::new();
    let raw = RawMode::enter()?;
    draw(&flow)?;

    let outcome = loop {
        let input = match action_for(event::read().context("Failed to read terminal event")?) {
            Action::Input(input) => input,
            Action::Submit => {
                let outcome = flow.submit(store).await?;
                draw(&flow)?;
                if matches!(outcome, LoginOutcome::Authenticated { .. }) {
                    break Some(outcome);
                }
                continue;
            }
            Action::Abort => break None,
            Action::Ignore => continue,
        };

        let outcome = flow.handle(input, store).await?;
        draw(&flow)?;
        if matches!(outcome, LoginOutcome::Authenticated { .. }) {
            break Some(outcome);
        }
    };

    drop(raw);
    println!();
    Ok(outcome)
}

/// Feed a code supplied on the command line through the login view, as if it
/// had been pasted into the first cell.
pub async fn login_with_code(store: &mut SessionStore, code: &str) -> Result<LoginOutcome> {
    let mut flow = LoginFlow::new();
    let outcome = flow.handle(PinInput::Paste(code.to_string()), store).await?;
    if outcome != LoginOutcome::Editing {
        return Ok(outcome);
    }
    // Too few digits to auto-submit.
    Ok(flow.submit(store).await?)
}

/// Ask a yes/no question on the terminal. Anything but `y` or `yes` is a no.
pub fn confirm(question: &str) -> Result<bool> {
    let mut stdout = io::stdout();
    write!(stdout, "{question}")?;
    stdout.flush()?;
    let mut answer = String::new();
    io::stdin()
        .read_line(&mut answer)
        .context("Failed to read answer")?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
