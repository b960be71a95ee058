//! Overlay widgets — error history and key help.

use ratatui::layout::Rect;
use ratatui::style::Modifier;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

use crate::app::AppState;
use crate::theme;
use crate::ui::centered_rect;

/// Error history overlay.
pub fn render_error_history(f: &mut Frame, area: Rect, app: &AppState) {
    let popup = centered_rect(80, 70, area);
    f.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::negative())
        .title(format!(
            " Error History ({}) [Esc]close [j/k]scroll ",
            app.error_history.len()
        ))
        .title_style(theme::negative());

    let inner = block.inner(popup);
    f.render_widget(block, popup);

    if app.error_history.is_empty() {
        let text = Paragraph::new(Span::styled("No errors recorded.", theme::muted()));
        f.render_widget(text, inner);
        return;
    }

    let mut lines: Vec<Line> = Vec::new();
    for (i, err) in app
        .error_history
        .iter()
        .enumerate()
        .skip(app.error_scroll)
        .take(inner.height as usize)
    {
        let style = if i == app.error_scroll {
            theme::negative().add_modifier(Modifier::BOLD)
        } else {
            theme::muted()
        };

        lines.push(Line::from(vec![
            Span::styled(
                format!("[{}] ", err.timestamp.format("%H:%M:%S")),
                theme::muted(),
            ),
            Span::styled(format!("[{}] ", err.category.label()), theme::warning()),
            Span::styled(err.message.as_str(), style),
        ]));

        if !err.context.is_empty() {
            lines.push(Line::from(vec![
                Span::raw("  "),
                Span::styled(err.context.as_str(), theme::muted()),
            ]));
        }
    }

    f.render_widget(Paragraph::new(lines), inner);
}

const HELP_KEYS: &[(&str, &str)] = &[
    ("j / k", "move between bundles"),
    ("Enter", "open the highlighted bundle"),
    ("0-9 .", "type a pledge amount on the bundle page"),
    ("Enter", "record the pledge and return"),
    ("Esc", "back to selection, or cancel a load"),
    ("e", "error history"),
    ("q", "quit"),
];

/// Key reference overlay.
pub fn render_help(f: &mut Frame, area: Rect) {
    let popup = centered_rect(60, 60, area);
    f.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::accent())
        .title(" Keys ")
        .title_style(theme::accent_bold());

    let mut lines = vec![Line::from("")];
    for (key, action) in HELP_KEYS {
        lines.push(Line::from(vec![
            Span::styled(format!("  {key:<8}"), theme::accent_bold()),
            Span::styled(*action, theme::text()),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Press any key to dismiss...",
        theme::neutral(),
    )));

    let para = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    f.render_widget(para, popup);
}

#[cfg(test)]
mod tests {
    use crate::app::test_support::test_app;
    use crate::app::{ErrorCategory, Overlay};
    use crate::ui::test_render::render_text;

    #[test]
    fn error_history_shows_category_and_context() {
        let (mut app, _rx, _tx) = test_app();
        app.push_error(
            ErrorCategory::Data,
            "no rows for GOVT".into(),
            "load Bundle 3".into(),
        );
        app.overlay = Overlay::ErrorHistory;
        let text = render_text(&app, 120, 40);
        assert!(text.contains("Error History (1)"));
        assert!(text.contains("[DATA] no rows for GOVT"));
        assert!(text.contains("load Bundle 3"));
    }

    #[test]
    fn empty_history_message() {
        let (mut app, _rx, _tx) = test_app();
        app.overlay = Overlay::ErrorHistory;
        assert!(render_text(&app, 120, 40).contains("No errors recorded."));
    }
}
