//! Bundle selection page — catalog table with cost and pledge progress.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Cell, Gauge, Paragraph, Row, Table};
use ratatui::Frame;

use pledgeboard_core::ledger::{format_cents, format_currency};

use crate::app::AppState;
use crate::theme::{self, Theme};

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let rows = app.dashboard.selection_rows();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(rows.len() as u16 + 2),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(area);

    let theme = Theme::default();
    let header = Row::new(vec!["", "Bundle", "Symbols", "Est. Cost", "Pledged", "Goal", "Progress"])
        .style(theme::accent_bold());

    let table_rows: Vec<Row> = rows
        .iter()
        .map(|row| {
            let selected = row.index == app.cursor;
            let loading = app
                .loading
                .as_ref()
                .is_some_and(|t| t.index == row.index);
            let marker = match (selected, loading) {
                (_, true) => "…",
                (true, false) => "▶",
                _ => " ",
            };
            let cost = match &row.estimated_cost {
                Ok(cost) => Cell::from(format!("${}", format_currency(*cost))),
                Err(_) => Cell::from("unavailable").style(theme::warning()),
            };
            let percent = row.progress.percent_achieved();
            let cells = vec![
                Cell::from(marker),
                Cell::from(row.name.as_str()),
                Cell::from(row.symbols.as_str()),
                cost,
                Cell::from(format!("${}", format_cents(row.progress.pledged_cents))),
                Cell::from(format!("${}", format_currency(row.progress.goal))),
                Cell::from(format!("{percent:.2}%"))
                    .style(Style::default().fg(theme.progress_color(percent))),
            ];
            let style = if selected {
                theme::selected_row()
            } else {
                theme::text()
            };
            Row::new(cells).style(style)
        })
        .collect();

    let widths = [
        Constraint::Length(2),
        Constraint::Length(12),
        Constraint::Min(12),
        Constraint::Length(14),
        Constraint::Length(14),
        Constraint::Length(14),
        Constraint::Length(10),
    ];
    let table = Table::new(table_rows, widths).header(header).column_spacing(1);
    f.render_widget(table, chunks[0]);

    // Gauge for the highlighted bundle.
    if let Some(row) = rows.get(app.cursor) {
        let percent = row.progress.percent_achieved();
        let ratio = if percent.is_finite() {
            (percent / 100.0).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(theme.progress_color(percent)))
            .ratio(ratio)
            .label(format!("{} {percent:.2}% of goal", row.name));
        f.render_widget(gauge, chunks[1]);
    }

    // Why a cost is unavailable, for the highlighted bundle.
    if let Some(Err(reason)) = rows.get(app.cursor).map(|r| &r.estimated_cost) {
        let line = Line::from(vec![
            Span::styled(" cost: ", theme::muted()),
            Span::styled(reason.as_str(), theme::warning()),
        ]);
        f.render_widget(Paragraph::new(line), chunks[2]);
    }

    let summary: Vec<Line> = std::iter::once(Line::from(Span::styled(
        "Pledge summary",
        theme::neutral(),
    )))
    .chain(
        app.dashboard
            .pledge_summary()
            .into_iter()
            .map(|s| Line::from(Span::styled(format!("  {s}"), theme::muted()))),
    )
    .collect();
    f.render_widget(Paragraph::new(summary), chunks[3]);
}

#[cfg(test)]
mod tests {
    use crate::app::test_support::test_app;
    use crate::ui::test_render::render_text;

    #[test]
    fn summary_lines_follow_ledger() {
        let (app, _rx, _tx) = test_app();
        app.dashboard.ledger().pledge("Bundle 2", Some(2500.0)).unwrap();
        let text = render_text(&app, 120, 30);
        assert!(text.contains("Bundle 2: $2,500.00 pledged out of $10,000.00 (25.00% achieved)"));
        assert!(text.contains("25.00%"));
    }

    #[test]
    fn costs_are_rendered_with_currency() {
        let (app, _rx, _tx) = test_app();
        let cost = app.dashboard.costs().estimated_cost("Bundle 1").unwrap();
        let text = render_text(&app, 120, 30);
        let expected = format!("${}", pledgeboard_core::ledger::format_currency(cost));
        assert!(text.contains(&expected), "{expected} not in:\n{text}");
    }
}
