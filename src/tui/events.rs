use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::core::tracker::TrackerEvent;

/// Events flowing through the Elm-architecture event loop.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// Periodic tick for notification TTLs.
    Tick,
    /// Raw terminal input (keyboard/mouse).
    Input(Event),
    /// State change published by the tracker.
    Tracker(TrackerEvent),
}

/// What a key press asks the tracker to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    NextTurn,
    PreviousTurn,
    SelectNext,
    SelectPrevious,
    Damage,
    Heal,
    EndCombat,
    QuickStart,
    Save,
    LoadLatest,
    ToggleHelp,
    Quit,
}

impl Action {
    pub fn from_key(key: &KeyEvent) -> Option<Self> {
        if key.kind != KeyEventKind::Press {
            return None;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('s') => Some(Self::Save),
                KeyCode::Char('o') => Some(Self::LoadLatest),
                KeyCode::Char('c') => Some(Self::Quit),
                _ => None,
            };
        }
        match key.code {
            KeyCode::Char(' ') | KeyCode::Char('n') => Some(Self::NextTurn),
            KeyCode::Char('p') => Some(Self::PreviousTurn),
            KeyCode::Down | KeyCode::Char('j') => Some(Self::SelectNext),
            KeyCode::Up | KeyCode::Char('k') => Some(Self::SelectPrevious),
            KeyCode::Char('-') | KeyCode::Char('d') => Some(Self::Damage),
            KeyCode::Char('+') | KeyCode::Char('=') | KeyCode::Char('h') => Some(Self::Heal),
            KeyCode::Char('e') => Some(Self::EndCombat),
            KeyCode::Char('s') => Some(Self::QuickStart),
            KeyCode::Char('?') => Some(Self::ToggleHelp),
            KeyCode::Char('q') | KeyCode::Esc => Some(Self::Quit),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A timed notification shown in the overlay.
#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
    /// Ticks remaining before auto-dismiss.
    pub ttl_ticks: u32,
}
