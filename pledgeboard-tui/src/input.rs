//! Keyboard input dispatch — overlays → global keys → page-specific handlers.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use pledgeboard_runner::NavigationState;

use crate::app::{AppState, Overlay, MAX_PLEDGE_INPUT};

pub fn handle_key(app: &mut AppState, key: KeyEvent) {
    // Only handle key press events (Windows sends both Press and Release).
    if key.kind != KeyEventKind::Press {
        return;
    }

    // 1. Overlays consume input first.
    match app.overlay {
        Overlay::ErrorHistory => {
            handle_error_overlay(app, key);
            return;
        }
        Overlay::Help => {
            app.overlay = Overlay::None;
            return;
        }
        Overlay::None => {}
    }

    // 2. Global keys.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.running = false;
        return;
    }
    match key.code {
        KeyCode::Char('q') => {
            app.running = false;
            return;
        }
        KeyCode::Char('e') => {
            app.error_scroll = 0;
            app.overlay = Overlay::ErrorHistory;
            return;
        }
        KeyCode::Char('?') => {
            app.overlay = Overlay::Help;
            return;
        }
        _ => {}
    }

    // 3. Page keys.
    match app.page() {
        NavigationState::BundleSelection => handle_selection_key(app, key),
        NavigationState::BundleDetail => handle_detail_key(app, key),
    }
}

fn handle_error_overlay(app: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('e') => {
            app.overlay = Overlay::None;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            if app.error_scroll + 1 < app.error_history.len() {
                app.error_scroll += 1;
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.error_scroll = app.error_scroll.saturating_sub(1);
        }
        _ => {}
    }
}

fn handle_selection_key(app: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.cursor_down(),
        KeyCode::Char('k') | KeyCode::Up => app.cursor_up(),
        KeyCode::Char('g') | KeyCode::Home => app.cursor = 0,
        KeyCode::Char('G') | KeyCode::End => {
            app.cursor = app.bundle_count().saturating_sub(1);
        }
        KeyCode::Enter => app.request_selection(),
        KeyCode::Esc => app.go_back(),
        _ => {}
    }
}

fn handle_detail_key(app: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Char(c) if c.is_ascii_digit() || c == '.' => {
            if c == '.' && app.pledge_input.contains('.') {
                return;
            }
            if app.pledge_input.len() < MAX_PLEDGE_INPUT {
                app.pledge_input.push(c);
            }
        }
        KeyCode::Backspace => {
            app.pledge_input.pop();
        }
        KeyCode::Enter => app.submit_pledge(),
        KeyCode::Esc => app.go_back(),
        _ => {}
    }
}
