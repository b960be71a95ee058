//! Bottom status bar — page hints and the last status message.

use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use pledgeboard_runner::NavigationState;

use crate::app::{AppState, StatusLevel};
use crate::theme;

fn hints(page: NavigationState) -> &'static str {
    match page {
        NavigationState::BundleSelection => " j/k:Move Enter:Select e:Errors ?:Help q:Quit",
        NavigationState::BundleDetail => " 0-9:Amount Enter:Pledge Esc:Back e:Errors q:Quit",
    }
}

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let mut spans: Vec<Span> = vec![Span::styled(hints(app.page()), theme::muted())];

    if let Some((msg, level)) = &app.status_message {
        spans.push(Span::raw(" | "));
        let style = match level {
            StatusLevel::Info => theme::accent(),
            StatusLevel::Warning => theme::warning(),
            StatusLevel::Error => theme::negative(),
        };
        spans.push(Span::styled(msg.as_str(), style));
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}
