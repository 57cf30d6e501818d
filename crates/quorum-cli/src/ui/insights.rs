//! Right-hand panes: decisions in flight and insights reached so far.

use quorum_core::visual::insight_to_visual_hint;
use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};

use super::accent_color;
use crate::{app::App, report::format_ms};

fn pane(title: String) -> Block<'static> {
  Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray))
}

/// Decision tracks active under the play-head.
pub fn draw_tracks(f: &mut Frame, area: Rect, app: &App) {
  let active = app.active_tracks();
  let block = pane(format!(" Decisions in flight ({}) ", active.len()));

  if active.is_empty() {
    f.render_widget(
      Paragraph::new(Span::styled(
        "No open decisions at this point.",
        Style::default().fg(Color::DarkGray),
      ))
      .block(block),
      area,
    );
    return;
  }

  let now = app.now_ms();
  let items: Vec<ListItem> = active
    .iter()
    .map(|track| {
      let open_for = now.saturating_sub(track.proposed_at_ms);
      ListItem::new(Line::from(vec![
        Span::styled(
          format!("{:<16}", track.decision_id),
          Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(" open {}", format_ms(open_for))),
        Span::styled(
          format!("  → {}", track.outcome),
          Style::default().fg(Color::DarkGray),
        ),
      ]))
    })
    .collect();
  f.render_widget(List::new(items).block(block), area);
}

/// Insights whose timestamp the play-head has passed.
pub fn draw_insights(f: &mut Frame, area: Rect, app: &App) {
  let visible = app.visible_insights();
  let block = pane(format!(
    " Insights ({}/{}) ",
    visible.len(),
    app.insights.len()
  ));

  let lines: Vec<Line> = visible
    .iter()
    .flat_map(|insight| {
      let hint = insight_to_visual_hint(insight);
      let accent = Style::default().fg(accent_color(hint.accent));
      [
        Line::from(vec![
          Span::styled(
            format!("{:<8}", insight.severity),
            accent.add_modifier(Modifier::BOLD),
          ),
          Span::styled(format!(" {}", insight.kind), accent),
        ]),
        Line::from(Span::raw(format!("  {}", insight.description))),
      ]
    })
    .collect();

  f.render_widget(
    Paragraph::new(lines)
      .block(block)
      .wrap(Wrap { trim: false }),
    area,
  );
}
