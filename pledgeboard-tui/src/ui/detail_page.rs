//! Bundle detail page — metrics tables, return chart and the pledge box.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Bar, BarChart, BarGroup, Block, Borders, Cell, Paragraph, Row, Table};
use ratatui::Frame;

use pledgeboard_core::ledger::format_currency;
use pledgeboard_runner::metrics::ChartSeries;
use pledgeboard_runner::{BundleMetrics, BundleView, MetricValue};

use crate::app::AppState;
use crate::theme::{self, Theme};

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let Some(view) = app.dashboard.view() else {
        f.render_widget(Paragraph::new(Span::styled("No bundle loaded.", theme::muted())), area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(6), Constraint::Length(4)])
        .split(area);

    render_header(f, chunks[0], app, view);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(chunks[1]);
    render_tables(f, body[0], &view.metrics);
    render_chart(f, body[1], &view.metrics.chart);

    render_pledge_box(f, chunks[2], app, view);
}

fn render_header(f: &mut Frame, area: Rect, app: &AppState, view: &BundleView) {
    let cost = match app.dashboard.costs().estimated_cost(&view.bundle.name) {
        Ok(c) => Span::styled(format!("${}", format_currency(c)), theme::accent()),
        Err(_) => Span::styled("unavailable", theme::warning()),
    };
    let range = match (view.first_date, view.last_date) {
        (Some(a), Some(b)) => format!("{a} → {b}"),
        _ => "no dates".to_string(),
    };
    let lines = vec![
        Line::from(vec![
            Span::styled("Symbols: ", theme::muted()),
            Span::styled(view.bundle.symbol_list(), theme::accent_bold()),
            Span::styled("  Benchmark: ", theme::muted()),
            Span::styled(view.benchmark.as_deref().unwrap_or("none"), theme::neutral()),
            Span::styled("  Est. cost: ", theme::muted()),
            cost,
        ]),
        Line::from(Span::styled(
            format!("{range} ({} trading days)", view.rows),
            theme::muted(),
        )),
    ];
    f.render_widget(Paragraph::new(lines), area);
}

fn titled(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::TOP)
        .border_style(theme::panel_border(false))
        .title(format!(" {title} "))
        .title_style(theme::panel_title(true))
}

fn percent_cell(value: MetricValue, theme: &Theme) -> Cell<'static> {
    match value.value() {
        Some(v) => Cell::from(value.as_percent()).style(Style::default().fg(theme.return_color(v))),
        None => Cell::from(value.as_percent()).style(theme::muted()),
    }
}

fn render_tables(f: &mut Frame, area: Rect, metrics: &BundleMetrics) {
    let theme = Theme::default();
    let returns = &metrics.trailing_returns;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(returns.rows.len() as u16 + 2),
            Constraint::Length(metrics.risk.rows.len() as u16 + 2),
            Constraint::Min(3),
        ])
        .split(area);

    // Trailing returns: one row per period, one column per symbol.
    let mut header = vec![Cell::from("Period")];
    header.extend(returns.symbols.iter().map(|s| Cell::from(s.as_str())));
    let rows = returns.rows.iter().map(|row| {
        let mut cells = vec![Cell::from(row.period.label())];
        cells.extend(row.values.iter().map(|v| percent_cell(*v, &theme)));
        Row::new(cells)
    });
    let mut widths = vec![Constraint::Length(9)];
    widths.extend(returns.symbols.iter().map(|_| Constraint::Length(10)));
    let table = Table::new(rows, widths)
        .header(Row::new(header).style(theme::accent_bold()))
        .block(titled("Trailing Returns"));
    f.render_widget(table, chunks[0]);

    // Risk statistics: one row per symbol.
    let rows = metrics.risk.rows.iter().map(|row| {
        let sharpe = match row.sharpe_ratio.value() {
            Some(s) => Cell::from(format!("{:.2}", row.sharpe_ratio))
                .style(Style::default().fg(theme.sharpe_color(s))),
            None => Cell::from(row.sharpe_ratio.to_string()).style(theme::muted()),
        };
        Row::new(vec![
            Cell::from(row.symbol.as_str()),
            Cell::from(row.annualized_volatility.as_percent()),
            sharpe,
            percent_cell(row.max_drawdown, &theme),
        ])
    });
    let table = Table::new(
        rows,
        [
            Constraint::Length(8),
            Constraint::Length(12),
            Constraint::Length(8),
            Constraint::Length(14),
        ],
    )
    .header(Row::new(vec!["Symbol", "Volatility", "Sharpe", "Max Drawdown"]).style(theme::accent_bold()))
    .block(titled("Risk Statistics"));
    f.render_widget(table, chunks[1]);

    let rows = metrics.dividends.rows.iter().map(|row| {
        Row::new(vec![
            Cell::from(row.symbol.as_str()),
            Cell::from(row.yield_percent.map(|y| y / 100.0).as_percent()),
            Cell::from(format!("${:.2}", row.annual_payout)),
        ])
    });
    let table = Table::new(
        rows,
        [Constraint::Length(8), Constraint::Length(10), Constraint::Length(10)],
    )
    .header(Row::new(vec!["Symbol", "Yield", "Payout"]).style(theme::accent_bold()))
    .block(titled("Dividends"));
    f.render_widget(table, chunks[2]);
}

/// Bars are magnitudes in basis points; the sign shows in color and label.
fn bar_height(value: MetricValue) -> u64 {
    value
        .value()
        .filter(|v| v.is_finite())
        .map(|v| (v.abs() * 10_000.0).round() as u64)
        .unwrap_or(0)
}

fn render_chart(f: &mut Frame, area: Rect, chart: &ChartSeries) {
    let theme = Theme::default();
    let mut barchart = BarChart::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme::panel_border(false))
                .title(format!(" {} ", chart.title))
                .title_style(theme::panel_title(true))
                .title_bottom(Line::from(format!(" {} ", chart.x_axis)).style(theme::muted())),
        )
        .bar_width(6)
        .bar_gap(1)
        .group_gap(2)
        .value_style(theme::text());

    for group in &chart.groups {
        let bars: Vec<Bar> = group
            .bars
            .iter()
            .map(|bar| {
                let color = bar
                    .value
                    .value()
                    .map(|v| theme.return_color(v))
                    .unwrap_or(theme.muted);
                Bar::default()
                    .value(bar_height(bar.value))
                    .text_value(bar.value.as_percent())
                    .label(Line::from(bar.symbol.clone()))
                    .style(Style::default().fg(color))
            })
            .collect();
        barchart = barchart.data(
            BarGroup::default()
                .label(Line::from(group.label.clone()))
                .bars(&bars),
        );
    }

    f.render_widget(barchart, area);
}

fn render_pledge_box(f: &mut Frame, area: Rect, app: &AppState, view: &BundleView) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::panel_border(true))
        .title(" Pledge amount [Enter]pledge [Esc]back ")
        .title_style(theme::panel_title(true));

    let progress = match app.dashboard.ledger().progress(&view.bundle.name) {
        Ok(p) => Span::styled(p.to_string(), theme::muted()),
        Err(e) => Span::styled(e.to_string(), theme::negative()),
    };
    let lines = vec![
        Line::from(vec![
            Span::styled("$ ", theme::accent_bold()),
            Span::styled(app.pledge_input.as_str(), theme::text()),
            Span::styled("▏", theme::accent()),
        ]),
        Line::from(progress),
    ];
    f.render_widget(Paragraph::new(lines).block(block), area);
}
