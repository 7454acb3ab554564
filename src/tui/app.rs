use std::io;
use std::time::Duration;

use crossterm::event::{Event, EventStream};
use futures::StreamExt;
use rand::Rng;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame, Terminal,
};
use tokio::sync::broadcast;

use super::combat::CombatView;
use super::events::{Action, AppEvent, Notification, NotificationLevel};
use super::theme;
use crate::core::combat::{CombatSelection, HpChange};
use crate::core::commands::{self, CommandResult};
use crate::core::initiative::{roll_d20, roll_monster_groups};
use crate::core::roster::Roster;
use crate::core::tracker::{CombatTracker, TrackerEvent};

const MAX_NOTIFICATIONS: usize = 3;
const NOTIFICATION_TTL_TICKS: u32 = 60;

/// Central application state (Elm architecture).
pub struct AppState {
    pub running: bool,
    pub show_help: bool,
    pub notifications: Vec<Notification>,
    view: CombatView,
    tracker: CombatTracker,
    tracker_rx: broadcast::Receiver<TrackerEvent>,
}

impl AppState {
    pub fn new(tracker: CombatTracker) -> Self {
        let tracker_rx = tracker.subscribe();
        Self {
            running: true,
            show_help: false,
            notifications: Vec::new(),
            view: CombatView::new(),
            tracker,
            tracker_rx,
        }
    }

    // ── Elm event loop ──────────────────────────────────────────────────

    /// Main event loop: render → select → update → loop.
    pub async fn run(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        tick_rate: Duration,
    ) -> io::Result<()> {
        let mut tick_interval = tokio::time::interval(tick_rate);
        let mut event_stream = EventStream::new();

        self.refresh().await;

        while self.running {
            terminal.draw(|frame| self.render(frame))?;

            tokio::select! {
                _ = tick_interval.tick() => {
                    self.handle_event(AppEvent::Tick).await;
                }
                Ok(event) = self.tracker_rx.recv() => {
                    self.handle_event(AppEvent::Tracker(event)).await;
                }
                Some(Ok(crossterm_event)) = event_stream.next() => {
                    self.handle_event(AppEvent::Input(crossterm_event)).await;
                }
            }
        }

        Ok(())
    }

    // ── Event handling ──────────────────────────────────────────────────

    async fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Tick => self.on_tick(),
            AppEvent::Input(Event::Key(key)) => {
                if let Some(action) = Action::from_key(&key) {
                    self.handle_action(action).await;
                }
            }
            AppEvent::Input(_) => {}
            AppEvent::Tracker(event) => self.on_tracker_event(event).await,
        }
    }

    async fn on_tracker_event(&mut self, event: TrackerEvent) {
        match event {
            TrackerEvent::EncounterEnded => {
                self.push_notification("All monsters down".into(), NotificationLevel::Warning);
            }
            TrackerEvent::CombatReset {
                summary,
                automatic: true,
            } => {
                self.push_notification(
                    format!("Encounter over after {} rounds", summary.rounds),
                    NotificationLevel::Info,
                );
            }
            _ => {}
        }
        self.refresh().await;
    }

    pub async fn handle_action(&mut self, action: Action) {
        match action {
            Action::NextTurn => {
                if let Some(result) = self.tracker.next_turn().await {
                    for effect in result.expired_effects {
                        self.push_notification(
                            format!("{} wore off", effect.name),
                            NotificationLevel::Info,
                        );
                    }
                }
            }
            Action::PreviousTurn => {
                self.tracker.previous_turn().await;
            }
            Action::SelectNext => self.view.select_next(),
            Action::SelectPrevious => self.view.select_previous(),
            Action::Damage => self.adjust_selected_hp(-1).await,
            Action::Heal => self.adjust_selected_hp(1).await,
            Action::EndCombat => {
                if let Some(summary) = self.tracker.end_combat().await {
                    self.push_notification(
                        format!("Combat ended after {} rounds", summary.rounds),
                        NotificationLevel::Success,
                    );
                }
            }
            Action::QuickStart => {
                let selection = quick_selection(self.view.roster(), &mut rand::thread_rng());
                if let Err(e) = self.tracker.start_combat(&selection).await {
                    self.push_notification(e.to_string(), NotificationLevel::Error);
                }
            }
            Action::Save => match commands::save_game_state(&self.tracker).await {
                CommandResult::Ok(saved) => self.push_notification(
                    format!("Saved {}", saved.filename),
                    NotificationLevel::Success,
                ),
                CommandResult::Err(e) => self.push_notification(e, NotificationLevel::Error),
            },
            Action::LoadLatest => match commands::load_game_state(&self.tracker).await {
                CommandResult::Ok(loaded) => self.push_notification(
                    format!("Loaded {}", loaded.filename),
                    NotificationLevel::Success,
                ),
                CommandResult::Err(e) => self.push_notification(e, NotificationLevel::Error),
            },
            Action::ToggleHelp => self.show_help = !self.show_help,
            Action::Quit => self.running = false,
        }
        self.refresh().await;
    }

    async fn adjust_selected_hp(&mut self, delta: i32) {
        if let Some(target) = self.view.selected() {
            self.tracker.modify_hp(&target, HpChange::Delta(delta)).await;
        }
    }

    async fn refresh(&mut self) {
        let roster = self.tracker.roster().await;
        let combat = self.tracker.combat().await;
        self.view.refresh(roster, combat);
    }

    // ── Notifications ───────────────────────────────────────────────────

    /// Push a notification (dedup by message, max 3).
    pub fn push_notification(&mut self, message: String, level: NotificationLevel) {
        if self.notifications.iter().any(|n| n.message == message) {
            return;
        }
        self.notifications.push(Notification {
            message,
            level,
            ttl_ticks: NOTIFICATION_TTL_TICKS,
        });
        while self.notifications.len() > MAX_NOTIFICATIONS {
            self.notifications.remove(0);
        }
    }

    fn on_tick(&mut self) {
        for n in &mut self.notifications {
            n.ttl_ticks = n.ttl_ticks.saturating_sub(1);
        }
        self.notifications.retain(|n| n.ttl_ticks > 0);
    }

    // ── Rendering ───────────────────────────────────────────────────────

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        let chunks = Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).split(area);

        self.view.render(frame, chunks[0]);
        self.render_status_bar(frame, chunks[1]);
        self.render_notifications(frame, area);

        if self.show_help {
            self.render_help_modal(frame, area);
        }
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let status = Line::from(vec![
            Span::styled(" COMBAT PAD ", theme::brand_badge()),
            Span::raw(" "),
            Span::styled(
                format!("{:?}", self.view.phase()),
                Style::default()
                    .fg(theme::PRIMARY_LIGHT)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(" | "),
            Span::styled("Ctrl+S", theme::key_hint()),
            Span::raw(":save "),
            Span::styled("Ctrl+O", theme::key_hint()),
            Span::raw(":load "),
            Span::styled("?", theme::key_hint()),
            Span::raw(":help "),
            Span::styled("q", theme::key_hint()),
            Span::raw(":quit"),
        ]);
        frame.render_widget(Paragraph::new(status), area);
    }

    fn render_notifications(&self, frame: &mut Frame, area: Rect) {
        if self.notifications.is_empty() {
            return;
        }

        let width = 50.min(area.width.saturating_sub(2));
        let height = self.notifications.len() as u16;
        let notification_area = Rect::new(area.width.saturating_sub(width + 1), 1, width, height);

        let lines: Vec<Line> = self
            .notifications
            .iter()
            .map(|n| {
                let (prefix, color) = match n.level {
                    NotificationLevel::Info => ("i", theme::INFO),
                    NotificationLevel::Success => ("+", theme::SUCCESS),
                    NotificationLevel::Warning => ("!", theme::WARNING),
                    NotificationLevel::Error => ("x", theme::ERROR),
                };
                Line::from(vec![
                    Span::styled(
                        format!(" {prefix} "),
                        Style::default().fg(color).add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(n.message.clone()),
                ])
            })
            .collect();

        frame.render_widget(Clear, notification_area);
        frame.render_widget(Paragraph::new(lines), notification_area);
    }

    fn render_help_modal(&self, frame: &mut Frame, area: Rect) {
        let modal = centered_rect(50, 60, area);
        let keybindings = [
            ("s", "Start encounter with the whole roster"),
            ("Space / n", "Next turn"),
            ("p", "Previous turn"),
            ("j / k", "Select participant"),
            ("- / +", "Damage / heal selected by 1"),
            ("e", "End combat"),
            ("Ctrl+S", "Save roster"),
            ("Ctrl+O", "Load latest save"),
            ("q", "Quit"),
        ];

        let lines: Vec<Line> = keybindings
            .iter()
            .map(|(key, desc)| {
                Line::from(vec![
                    Span::styled(format!(" {key:<12}"), theme::key_hint()),
                    Span::styled(*desc, Style::default().fg(theme::TEXT)),
                ])
            })
            .collect();

        let block = Block::default()
            .title(" Help ")
            .borders(Borders::ALL)
            .border_style(theme::border_focused());

        frame.render_widget(Clear, modal);
        frame.render_widget(Paragraph::new(lines).block(block), modal);
    }
}

/// Every roster character and one copy of every monster. Characters get a
/// plain d20, monster groups roll d20 plus perception.
fn quick_selection<R: Rng + ?Sized>(roster: &Roster, rng: &mut R) -> CombatSelection {
    let mut selection = CombatSelection::new();
    for character in roster.characters() {
        selection = selection.with_character(&character.id, roll_d20(rng));
    }
    for monster in roster.monsters() {
        selection = selection.with_monsters(&monster.id, 1, None);
    }
    roll_monster_groups(&mut selection, roster, rng, true);
    selection
}

/// Calculate a centered rect using percentage of parent area.
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .split(area);

    Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::combat::CombatPhase;
    use crate::core::roster::{CharacterType, NewCharacter, NewMonster};
    use crate::core::saves::SaveStore;
    use crate::core::tracker::TrackerOptions;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::TempDir;

    async fn app_with_roster(temp: &TempDir) -> AppState {
        let tracker = CombatTracker::new(SaveStore::new(temp.path()), TrackerOptions::default());
        tracker
            .add_character(NewCharacter {
                name: "Seelah".into(),
                kind: CharacterType::Player,
                ac: 18,
                hp: 20,
                max_hp: 20,
            })
            .await;
        tracker
            .add_monster(NewMonster {
                name: "Goblin".into(),
                max_hp: 6,
                ac: 15,
                perception: 2,
                ..Default::default()
            })
            .await;
        let mut app = AppState::new(tracker);
        app.refresh().await;
        app
    }

    #[test]
    fn test_quick_selection_covers_roster() {
        let mut roster = Roster::new();
        let pc = roster.add_character(NewCharacter {
            name: "Valeros".into(),
            ..Default::default()
        });
        let wolf = roster.add_monster(NewMonster {
            name: "Wolf".into(),
            perception: 3,
            ..Default::default()
        });

        let mut rng = StdRng::seed_from_u64(9);
        let selection = quick_selection(&roster, &mut rng);
        assert_eq!(selection.characters, vec![pc.clone()]);
        assert_eq!(selection.monsters.len(), 1);
        assert!((1..=20).contains(&selection.initiatives[&pc]));
        assert!((4..=23).contains(&selection.initiatives[&wolf]));
    }

    #[tokio::test]
    async fn test_quick_start_then_end() {
        let temp = TempDir::new().unwrap();
        let mut app = app_with_roster(&temp).await;

        app.handle_action(Action::QuickStart).await;
        assert_eq!(app.view.phase(), CombatPhase::Active);

        app.handle_action(Action::EndCombat).await;
        assert_eq!(app.view.phase(), CombatPhase::Setup);
        assert_eq!(app.notifications.len(), 1);
    }

    #[tokio::test]
    async fn test_quick_start_on_empty_roster_notifies() {
        let temp = TempDir::new().unwrap();
        let tracker = CombatTracker::new(SaveStore::new(temp.path()), TrackerOptions::default());
        let mut app = AppState::new(tracker);

        app.handle_action(Action::QuickStart).await;
        assert_eq!(app.notifications[0].level, NotificationLevel::Error);
    }

    #[test]
    fn test_notifications_dedup_and_cap() {
        let temp = TempDir::new().unwrap();
        let tracker = CombatTracker::new(SaveStore::new(temp.path()), TrackerOptions::default());
        let mut app = AppState::new(tracker);
        for i in 0..5 {
            app.push_notification(format!("n{i}"), NotificationLevel::Info);
        }
        app.push_notification("n4".into(), NotificationLevel::Info);
        assert_eq!(app.notifications.len(), MAX_NOTIFICATIONS);
        assert_eq!(app.notifications[0].message, "n2");
    }

    #[test]
    fn test_centered_rect() {
        let area = Rect::new(0, 0, 100, 50);
        let rect = centered_rect(50, 60, area);
        assert_eq!(rect.width, 50);
        assert_eq!(rect.height, 30);
    }
}
