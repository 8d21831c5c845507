use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use std::io;
use std::time::Duration;

pub(crate) enum Action {
    Quit,
    Resize(u16, u16),
}

/// Drain everything pending without blocking; the frame pacing sleep does
/// the waiting.
pub(crate) fn drain_actions() -> io::Result<Vec<Action>> {
    let mut out = Vec::new();
    while event::poll(Duration::from_millis(0))? {
        match event::read()? {
            Event::Key(k) if k.kind == KeyEventKind::Press => match k.code {
                KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                    out.push(Action::Quit);
                }
                KeyCode::Char('c') if k.modifiers.contains(KeyModifiers::CONTROL) => {
                    out.push(Action::Quit);
                }
                _ => {}
            },
            Event::Resize(cols, rows) => out.push(Action::Resize(cols, rows)),
            _ => {}
        }
    }
    Ok(out)
}
