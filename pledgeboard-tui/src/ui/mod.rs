//! Top-level UI layout — one page at a time with a status bar.

pub mod detail_page;
pub mod overlays;
pub mod selection_page;
pub mod status_bar;

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::widgets::{Block, Borders};
use ratatui::Frame;

use pledgeboard_runner::NavigationState;

use crate::app::{AppState, Overlay};
use crate::theme;

/// Draw the entire UI.
pub fn draw(f: &mut Frame, app: &AppState) {
    // Split: main area + 1-line status bar.
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(f.area());

    let main_area = chunks[0];
    let status_area = chunks[1];

    draw_page(f, main_area, app);
    status_bar::render(f, status_area, app);

    match app.overlay {
        Overlay::ErrorHistory => overlays::render_error_history(f, main_area, app),
        Overlay::Help => overlays::render_help(f, main_area),
        Overlay::None => {}
    }
}

fn draw_page(f: &mut Frame, area: Rect, app: &AppState) {
    let title = match (app.page(), app.dashboard.active_bundle()) {
        (NavigationState::BundleDetail, Some(name)) => format!(" PledgeBoard › {name} "),
        _ => " PledgeBoard › Choose a bundle ".to_string(),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::panel_border(true))
        .title(title)
        .title_style(theme::panel_title(true));

    let inner = block.inner(area);
    f.render_widget(block, area);

    match app.page() {
        NavigationState::BundleSelection => selection_page::render(f, inner, app),
        NavigationState::BundleDetail => detail_page::render(f, inner, app),
    }
}

/// Compute a centered rect for overlays.
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}


#[cfg(test)]
mod tests {
    use super::test_render::render_text;
    use super::*;
    use crate::app::test_support::{run_load, test_app};

    #[test]
    fn centered_rect_is_inside_area() {
        let area = Rect::new(0, 0, 100, 50);
        let popup = centered_rect(60, 40, area);
        assert_eq!(popup.width, 60);
        assert_eq!(popup.height, 20);
        assert_eq!(popup.x, 20);
        assert_eq!(popup.y, 15);
    }

    #[test]
    fn selection_page_lists_bundles() {
        let (app, _rx, _tx) = test_app();
        let text = render_text(&app, 120, 30);
        assert!(text.contains("Choose a bundle"));
        for name in ["Bundle 1", "Bundle 2", "Bundle 3"] {
            assert!(text.contains(name), "{name} missing:\n{text}");
        }
        assert!(text.contains("DBC, GSG"));
    }

    #[test]
    fn detail_page_shows_metrics() {
        let (mut app, rx, _tx) = test_app();
        app.request_selection();
        run_load(&mut app, &rx);
        let text = render_text(&app, 140, 45);
        assert!(text.contains("PledgeBoard › Bundle 1"));
        assert!(text.contains("Trailing Returns"));
        assert!(text.contains("Risk Statistics"));
        assert!(text.contains("Dividends"));
        assert!(text.contains("Pledge amount"));
    }

    #[test]
    fn help_overlay_draws_over_page() {
        let (mut app, _rx, _tx) = test_app();
        app.overlay = Overlay::Help;
        let text = render_text(&app, 120, 40);
        assert!(text.contains("Keys"));
    }

    #[test]
    fn tiny_terminal_does_not_panic() {
        let (mut app, rx, _tx) = test_app();
        render_text(&app, 10, 4);
        app.request_selection();
        run_load(&mut app, &rx);
        render_text(&app, 10, 4);
    }
}
