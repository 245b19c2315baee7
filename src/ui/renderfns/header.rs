use crate::context::AppContext;
use crate::ui::view::ShortcutInfo;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Draw the header bar: API host, service health, identity and shortcuts
pub fn draw_header(frame: &mut Frame, area: Rect, ctx: &AppContext, shortcuts: &[ShortcutInfo]) {
  let sep = || Span::styled("│", Style::default().fg(Color::DarkGray));

  let mut spans = vec![
    Span::styled(" elder ", Style::default().fg(Color::Cyan).bold()),
    sep(),
    Span::styled(
      format!(" {} ", extract_host(ctx.client.base_url().as_str())),
      Style::default().fg(Color::White),
    ),
    sep(),
    health_span(ctx),
    sep(),
    identity_span(ctx),
    Span::raw("  "),
  ];

  let mut sorted: Vec<&ShortcutInfo> = shortcuts.iter().collect();
  sorted.sort_by_key(|s| s.priority);
  for (i, shortcut) in sorted.into_iter().enumerate() {
    if i > 0 {
      spans.push(Span::raw("  "));
    }
    spans.push(Span::styled(
      format!("<{}>", shortcut.key),
      Style::default().fg(Color::Cyan),
    ));
    spans.push(Span::styled(
      format!(" {}", shortcut.label),
      Style::default().fg(Color::DarkGray),
    ));
  }

  let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
  frame.render_widget(paragraph, area);
}

fn health_span(ctx: &AppContext) -> Span<'static> {
  let health = ctx.health();
  match (health.data(), health.error()) {
    (Some(h), _) => {
      let color = if h.status.eq_ignore_ascii_case("healthy") || h.status.eq_ignore_ascii_case("ok")
      {
        Color::Green
      } else {
        Color::Yellow
      };
      Span::styled(
        format!(" {} {} ", h.service, h.status),
        Style::default().fg(color),
      )
    }
    (None, Some(_)) => Span::styled(" unreachable ", Style::default().fg(Color::Red)),
    (None, None) => Span::styled(" ... ", Style::default().fg(Color::DarkGray)),
  }
}

fn identity_span(ctx: &AppContext) -> Span<'static> {
  let profile = ctx.profile();
  match profile.data() {
    Some(p) if p.is_admin() => Span::styled(
      format!(" {} (admin) ", p.username),
      Style::default().fg(Color::Yellow).bold(),
    ),
    Some(p) => Span::styled(
      format!(" {} ", p.username),
      Style::default().fg(Color::Yellow),
    ),
    None if profile.is_error() => {
      Span::styled(" not signed in ", Style::default().fg(Color::DarkGray))
    }
    None => Span::styled(" ... ", Style::default().fg(Color::DarkGray)),
  }
}

/// Host (and port) part of the API URL
fn extract_host(url: &str) -> &str {
  url
    .strip_prefix("https://")
    .or_else(|| url.strip_prefix("http://"))
    .unwrap_or(url)
    .split('/')
    .next()
    .unwrap_or(url)
}
