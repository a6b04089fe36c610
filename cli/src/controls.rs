use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use grokparty_core::ConversationHandle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// What a key press asks the running conversation to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    TogglePause,
    Stop,
}

/// `p` toggles pause, `s` or Ctrl-C stops. Everything else is ignored.
pub fn map_key(key: &KeyEvent) -> Option<KeyAction> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(KeyAction::Stop)
        }
        KeyCode::Char('p') | KeyCode::Char('P') => Some(KeyAction::TogglePause),
        KeyCode::Char('s') | KeyCode::Char('S') => Some(KeyAction::Stop),
        _ => None,
    }
}

/// Keeps the terminal in raw mode while alive.
pub struct RawModeGuard;

impl RawModeGuard {
    pub fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(e) = terminal::disable_raw_mode() {
            warn!(error = %e, "Failed to restore terminal mode");
        }
    }
}

/// Reads key presses on a blocking thread and forwards them to `handle`.
///
/// The listener waits at most `poll` for each key so it notices promptly when
/// the conversation stops on its own.
pub fn spawn_key_listener(handle: ConversationHandle, poll: Duration) -> JoinHandle<io::Result<()>> {
    tokio::task::spawn_blocking(move || {
        let _raw = RawModeGuard::enable()?;
        while !handle.state().is_stopped() {
            if !event::poll(poll)? {
                continue;
            }
            let Event::Key(key) = event::read()? else {
                continue;
            };
            match map_key(&key) {
                Some(KeyAction::TogglePause) => {
                    handle.toggle_pause();
                }
                Some(KeyAction::Stop) => {
                    debug!("Stop requested from keyboard");
                    handle.stop();
                }
                None => {}
            }
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_control_keys() {
        assert_eq!(
            map_key(&press(KeyCode::Char('p'), KeyModifiers::NONE)),
            Some(KeyAction::TogglePause)
        );
        assert_eq!(
            map_key(&press(KeyCode::Char('P'), KeyModifiers::SHIFT)),
            Some(KeyAction::TogglePause)
        );
        assert_eq!(
            map_key(&press(KeyCode::Char('s'), KeyModifiers::NONE)),
            Some(KeyAction::Stop)
        );
        assert_eq!(
            map_key(&press(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(KeyAction::Stop)
        );
    }

    #[test]
    fn test_other_keys_ignored() {
        assert_eq!(map_key(&press(KeyCode::Char('c'), KeyModifiers::NONE)), None);
        assert_eq!(map_key(&press(KeyCode::Enter, KeyModifiers::NONE)), None);
        assert_eq!(map_key(&press(KeyCode::Char('q'), KeyModifiers::NONE)), None);
    }

    #[test]
    fn test_release_events_ignored() {
        let mut key = press(KeyCode::Char('s'), KeyModifiers::NONE);
        key.kind = KeyEventKind::Release;
        assert_eq!(map_key(&key), None);
    }
}
