//! Encounter view.
//!
//! Renders a copy of the tracker state: the roster while no encounter is
//! running, the initiative list with detail and log during one.

use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::core::combat::{CombatParticipant, CombatPhase, CombatSession, ParticipantKind, ParticipantRef};
use crate::core::roster::{CharacterType, MonsterType, Roster};
use crate::tui::theme;

const LOG_LINES: usize = 8;

#[derive(Debug, Default)]
pub struct CombatView {
    roster: Roster,
    combat: CombatSession,
    selected_idx: usize,
}

impl CombatView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the displayed state, keeping the selection in range.
    pub fn refresh(&mut self, roster: Roster, combat: CombatSession) {
        self.roster = roster;
        self.combat = combat;
        let len = self.combat.participants().len();
        if len == 0 {
            self.selected_idx = 0;
        } else if self.selected_idx >= len {
            self.selected_idx = len - 1;
        }
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn phase(&self) -> CombatPhase {
        self.combat.phase()
    }

    pub fn select_next(&mut self) {
        let len = self.combat.participants().len();
        if len > 0 {
            self.selected_idx = (self.selected_idx + 1) % len;
        }
    }

    pub fn select_previous(&mut self) {
        let len = self.combat.participants().len();
        if len > 0 {
            self.selected_idx = (self.selected_idx + len - 1) % len;
        }
    }

    pub fn selected(&self) -> Option<ParticipantRef> {
        self.combat
            .participants()
            .get(self.selected_idx)
            .map(CombatParticipant::reference)
    }

    // ────────────────────────────────────────────────────────────────────
    // Rendering
    // ────────────────────────────────────────────────────────────────────

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        match self.combat.phase() {
            CombatPhase::Setup => self.render_roster(frame, area),
            CombatPhase::Active | CombatPhase::Ended => self.render_active(frame, area),
        }
    }

    fn render_roster(&self, frame: &mut Frame, area: Rect) {
        let block = theme::block_default("Roster");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::vertical([Constraint::Length(2), Constraint::Min(1)]).split(inner);

        let hint = Line::from(vec![
            Span::raw(" Press "),
            Span::styled("s", theme::key_hint()),
            Span::raw(" to start an encounter with the whole roster"),
        ]);
        frame.render_widget(Paragraph::new(hint), chunks[0]);

        if self.roster.is_empty() {
            frame.render_widget(
                Paragraph::new(Span::styled("No characters or monsters yet", theme::dim()))
                    .alignment(Alignment::Center),
                chunks[1],
            );
            return;
        }

        let mut lines = vec![Line::from(Span::styled(" Characters", theme::title()))];
        for c in self.roster.characters() {
            lines.push(Line::from(vec![
                Span::styled(
                    format!("  {} ", character_label(c.kind)),
                    Style::default().fg(character_color(c.kind)),
                ),
                Span::styled(c.name.clone(), Style::default().fg(theme::TEXT)),
                Span::styled(
                    format!(" {}/{}", c.hp, c.max_hp),
                    Style::default().fg(theme::hp_color(c.hp, c.max_hp)),
                ),
                Span::styled(format!("  AC {}", c.ac), theme::muted()),
            ]));
        }
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled(" Monsters", theme::title())));
        for m in self.roster.monsters() {
            let color = match m.kind {
                MonsterType::Monster => theme::MONSTER,
                MonsterType::Environment => theme::ENVIRONMENT,
            };
            lines.push(Line::from(vec![
                Span::styled("  MON ", Style::default().fg(color)),
                Span::styled(m.name.clone(), Style::default().fg(theme::TEXT)),
                Span::styled(format!(" {}HP", m.max_hp), theme::muted()),
                Span::styled(format!("  AC {}", m.ac), theme::muted()),
                Span::styled(format!("  Per {:+}", m.perception), theme::muted()),
            ]));
        }

        frame.render_widget(Paragraph::new(lines), chunks[1]);
    }

    fn render_active(&self, frame: &mut Frame, area: Rect) {
        let title = if self.combat.is_ended() {
            "Encounter Over"
        } else {
            "Combat"
        };
        let block = theme::block_focused(title);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let h_chunks =
            Layout::horizontal([Constraint::Percentage(45), Constraint::Percentage(55)]).split(inner);

        self.render_initiative_list(frame, h_chunks[0]);

        let v_chunks = Layout::vertical([
            Constraint::Length(2),
            Constraint::Min(5),
            Constraint::Length(LOG_LINES as u16 + 2),
        ])
        .split(h_chunks[1]);

        self.render_round_header(frame, v_chunks[0]);
        self.render_detail(frame, v_chunks[1]);
        self.render_log(frame, v_chunks[2]);
    }

    fn render_round_header(&self, frame: &mut Frame, area: Rect) {
        let current = self
            .combat
            .current_participant()
            .map(CombatParticipant::display_name)
            .unwrap_or_default();

        let mut line = vec![
            Span::styled(
                format!(" Round {} ", self.combat.round()),
                Style::default().fg(theme::ACCENT).add_modifier(Modifier::BOLD),
            ),
            Span::styled("| ", theme::dim()),
            Span::styled("Turn: ", theme::muted()),
            Span::styled(
                current,
                Style::default()
                    .fg(theme::PRIMARY_LIGHT)
                    .add_modifier(Modifier::BOLD),
            ),
        ];
        if self.combat.is_ended() {
            line.push(Span::styled(
                "  all monsters down, resetting",
                Style::default().fg(theme::WARNING),
            ));
        }

        let hint = Line::from(vec![
            Span::styled("Space", theme::key_hint()),
            Span::styled(":next ", theme::dim()),
            Span::styled("p", theme::key_hint()),
            Span::styled(":prev ", theme::dim()),
            Span::styled("-/+", theme::key_hint()),
            Span::styled(":hp ", theme::dim()),
            Span::styled("e", theme::key_hint()),
            Span::styled(":end", theme::dim()),
        ]);

        frame.render_widget(Paragraph::new(vec![Line::from(line), hint]), area);
    }

    fn render_initiative_list(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" Initiative ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::PRIMARY));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let name_width = (inner.width as usize).saturating_sub(16);
        let lines: Vec<Line> = self
            .combat
            .participants()
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let is_current = i == self.combat.current_turn();
                let is_selected = i == self.selected_idx;

                let prefix = match (is_current, is_selected) {
                    (true, true) => ">*",
                    (true, false) => " *",
                    (false, true) => "> ",
                    (false, false) => "  ",
                };

                let name_style = if p.is_down() {
                    Style::default()
                        .fg(theme::TEXT_DIM)
                        .add_modifier(Modifier::CROSSED_OUT)
                } else if is_current {
                    Style::default().fg(theme::ACCENT).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(theme::TEXT)
                };

                let mut spans = vec![
                    Span::styled(prefix, Style::default().fg(theme::ACCENT)),
                    Span::styled(
                        format!("{:>3} ", p.initiative),
                        Style::default().fg(theme::PRIMARY_LIGHT),
                    ),
                    Span::styled(truncate_name(&p.display_name(), name_width), name_style),
                    Span::styled(
                        format!(" {}/{}", p.hp, p.max_hp),
                        Style::default().fg(theme::hp_color(p.hp, p.max_hp)),
                    ),
                ];
                if !p.effects.is_empty() {
                    spans.push(Span::styled(
                        format!(" [{}]", p.effects.len()),
                        Style::default().fg(theme::WARNING),
                    ));
                }
                Line::from(spans)
            })
            .collect();

        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn render_detail(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" Detail ")
            .borders(Borders::ALL)
            .border_style(theme::border_default());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let Some(p) = self.combat.participants().get(self.selected_idx) else {
            return;
        };

        let (kind_label, kind_color) = match p.kind {
            ParticipantKind::Character => ("Character", theme::PLAYER),
            ParticipantKind::Monster => ("Monster", theme::MONSTER),
        };

        let color = theme::hp_color(p.hp, p.max_hp);
        let pct = if p.max_hp > 0 {
            (p.hp as f64 / p.max_hp as f64).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let bar_width = (inner.width as usize).saturating_sub(14).min(30);
        let filled = (pct * bar_width as f64) as usize;

        let mut lines = vec![
            Line::from(vec![
                Span::styled(p.display_name(), theme::title()),
                Span::styled(format!("  ({kind_label})"), Style::default().fg(kind_color)),
            ]),
            Line::from(vec![
                Span::styled(" HP: ", theme::muted()),
                Span::styled(
                    format!("{}/{}", p.hp, p.max_hp),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ),
                Span::raw(" "),
                Span::styled("#".repeat(filled), Style::default().fg(color)),
                Span::styled(".".repeat(bar_width - filled), theme::dim()),
            ]),
            Line::from(vec![
                Span::styled(" AC: ", theme::muted()),
                Span::styled(p.ac.to_string(), Style::default().fg(theme::INFO)),
                Span::styled("  Init: ", theme::muted()),
                Span::styled(p.initiative.to_string(), Style::default().fg(theme::PRIMARY_LIGHT)),
            ]),
        ];

        if !p.effects.is_empty() {
            lines.push(Line::raw(""));
            lines.push(Line::from(Span::styled(
                " Effects:",
                Style::default().fg(theme::WARNING).add_modifier(Modifier::BOLD),
            )));
            for effect in p.effects.effects() {
                lines.push(Line::from(vec![
                    Span::styled(format!("  - {}", effect.name), Style::default().fg(theme::TEXT)),
                    Span::styled(format!(" ({} turns)", effect.duration), theme::muted()),
                ]));
            }
        }

        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn render_log(&self, frame: &mut Frame, area: Rect) {
        let events = self.combat.events();
        let block = Block::default()
            .title(format!(" Log ({}) ", events.len()))
            .borders(Borders::ALL)
            .border_style(theme::border_default());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let lines: Vec<Line> = events
            .iter()
            .rev()
            .take(LOG_LINES)
            .map(|e| {
                Line::from(vec![
                    Span::styled(format!("R{}.{} ", e.round, e.turn + 1), theme::dim()),
                    Span::styled(e.description.clone(), theme::muted()),
                ])
            })
            .collect();

        frame.render_widget(Paragraph::new(lines), inner);
    }
}

fn character_label(kind: CharacterType) -> &'static str {
    match kind {
        CharacterType::Player => "PC ",
        CharacterType::Npc => "NPC",
    }
}

fn character_color(kind: CharacterType) -> ratatui::style::Color {
    match kind {
        CharacterType::Player => theme::PLAYER,
        CharacterType::Npc => theme::NPC,
    }
}

fn truncate_name(name: &str, max: usize) -> String {
    if name.chars().count() <= max {
        name.to_string()
    } else if max > 1 {
        let head: String = name.chars().take(max - 1).collect();
        format!("{head}…")
    } else {
        name.chars().take(max).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::combat::CombatSelection;
    use crate::core::roster::{NewCharacter, NewMonster};

    fn active_view() -> CombatView {
        let mut roster = Roster::new();
        let fighter = roster.add_character(NewCharacter {
            name: "Fighter".into(),
            kind: CharacterType::Player,
            ac: 18,
            hp: 50,
            max_hp: 50,
        });
        let goblin = roster.add_monster(NewMonster {
            name: "Goblin".into(),
            max_hp: 6,
            ac: 15,
            perception: 2,
            ..Default::default()
        });
        let mut combat = CombatSession::new();
        combat
            .start(
                &roster,
                &CombatSelection::new()
                    .with_character(&fighter, 18)
                    .with_monsters(&goblin, 2, Some(12)),
            )
            .unwrap();

        let mut view = CombatView::new();
        view.refresh(roster, combat);
        view
    }

    #[test]
    fn test_selection_wraps() {
        let mut view = active_view();
        assert_eq!(view.selected_idx, 0);
        for _ in 0..3 {
            view.select_next();
        }
        assert_eq!(view.selected_idx, 0);
        view.select_previous();
        assert_eq!(view.selected_idx, 2);
        assert_eq!(view.selected().unwrap().instance, Some(1));
    }

    #[test]
    fn test_refresh_clamps_selection() {
        let mut view = active_view();
        view.select_previous();
        view.refresh(Roster::new(), CombatSession::new());
        assert_eq!(view.selected_idx, 0);
        assert!(view.selected().is_none());
        assert_eq!(view.phase(), CombatPhase::Setup);
    }

    #[test]
    fn test_truncate_name() {
        assert_eq!(truncate_name("Goblin", 10), "Goblin");
        assert_eq!(truncate_name("Goblin King of the Mountain", 10), "Goblin Ki…");
        assert_eq!(truncate_name("AB", 2), "AB");
    }
}
