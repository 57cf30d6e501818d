//! Event list pane — left panel, follows the play-head.

use quorum_core::visual::event_to_visual_hint;
use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, List, ListItem, ListState},
};

use super::accent_color;
use crate::{app::App, report::format_ms};

/// Render the event list into `area`.
pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let timeline = app.controller.timeline();
  let current = app.state().current_event_index;
  let current_hint = app.controller.current_event().map(event_to_visual_hint);
  let dim_others = current_hint.is_some_and(|h| h.dim_others);

  let block = Block::default()
    .title(format!(" Events ({}) ", timeline.len()))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));

  let items: Vec<ListItem> = timeline
    .events()
    .iter()
    .enumerate()
    .map(|(i, event)| {
      let hint = event_to_visual_hint(event);
      let reached = current.is_some_and(|c| i <= c);
      let is_current = current == Some(i);

      let style = if is_current {
        Style::default()
          .fg(Color::Black)
          .bg(accent_color(hint.accent))
          .add_modifier(Modifier::BOLD)
      } else if !reached || dim_others {
        Style::default().fg(Color::DarkGray)
      } else {
        Style::default().fg(accent_color(hint.accent))
      };

      let mut marks = String::new();
      if hint.show_guard {
        marks.push('⚑');
      }
      if hint.show_violation {
        marks.push('!');
      }
      if hint.show_timeline_write {
        marks.push('✎');
      }

      let decision = event
        .decision_id
        .as_deref()
        .map(|d| format!("  [{d}]"))
        .unwrap_or_default();

      ListItem::new(Line::from(vec![
        Span::styled(format!("{:>9} ", format_ms(event.timestamp)), style),
        Span::styled(format!("{:<12} ", event.author_label()), style),
        Span::styled(format!("{:<18}", event.kind.as_ref()), style),
        Span::styled(format!("{marks:<2}{decision}"), style),
      ]))
    })
    .collect();

  let mut state = ListState::default();
  state.select(current);

  f.render_stateful_widget(
    List::new(items).block(block).highlight_symbol("▶ "),
    area,
    &mut state,
  );
}
