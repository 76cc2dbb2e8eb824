use anyhow::Result;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use ratatui::Terminal;
use ratatui::backend::Backend;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;

use crate::app::keymap::KeyAction;
use crate::app::{AppState, InputMode, ModalState, UiAction};
use crate::ui;

const TICK: Duration = Duration::from_millis(100);

/// What the loop should do after an input event.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
    Reload,
}

pub fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut AppState, runtime: &Handle) -> Result<()> {
    app.start_load(runtime);

    loop {
        terminal.draw(|f| {
            ui::render(f, app);
        })?;

        let timeout = app.next_wakeup(Instant::now(), TICK);
        if event::poll(timeout)? {
            let flow = match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    handle_key(app, key, Instant::now())
                }
                Event::Mouse(mouse) => handle_mouse(app, mouse),
                _ => Flow::Continue,
            };
            match flow {
                Flow::Continue => {}
                Flow::Quit => break,
                Flow::Reload => app.start_load(runtime),
            }
        }
        app.tick(Instant::now());
    }

    if let Some(load) = app.pending_load.take() {
        load.cancel();
    }
    tracing::info!(uptime_s = app.started_at.elapsed().as_secs(), "exiting");
    Ok(())
}

/// Route one key press according to the current input mode.
pub fn handle_key(app: &mut AppState, key: KeyEvent, now: Instant) -> Flow {
    match app.input_mode {
        InputMode::Modal => {
            handle_modal_key(app, key);
            Flow::Continue
        }
        InputMode::Search => {
            handle_search_key(app, key, now);
            Flow::Continue
        }
        InputMode::Normal => match app.keymap.resolve(&key) {
            Some(action) => handle_key_action(app, action),
            None => Flow::Continue,
        },
    }
}

fn handle_search_key(app: &mut AppState, key: KeyEvent, now: Instant) {
    match key.code {
        KeyCode::Enter => {
            if let Some(query) = app.debouncer.flush() {
                app.apply_search(query);
            }
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Backspace => {
            app.search_input.pop();
            app.debouncer.push(app.search_input.clone(), now);
        }
        // Ctrl/Alt chords are commands, not text
        KeyCode::Char(c) if !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
            app.search_input.push(c);
            app.debouncer.push(app.search_input.clone(), now);
        }
        _ => {}
    }
}

fn handle_modal_key(app: &mut AppState, key: KeyEvent) {
    let max = app.help_scroll_max;
    if let Some(ModalState::Help { scroll }) = app.modal.as_mut() {
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => {
                *scroll = scroll.saturating_add(1).min(max);
                return;
            }
            KeyCode::Up | KeyCode::Char('k') => {
                *scroll = scroll.saturating_sub(1);
                return;
            }
            _ => {}
        }
    }
    if matches!(
        key.code,
        KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') | KeyCode::Backspace
    ) {
        app.modal = None;
        app.input_mode = InputMode::Normal;
    }
}

fn handle_key_action(app: &mut AppState, action: KeyAction) -> Flow {
    match action {
        KeyAction::Quit => return Flow::Quit,
        KeyAction::Reload => return Flow::Reload,
        KeyAction::Ignore => {}
        KeyAction::StartSearch => dispatch(app, UiAction::FocusSearch),
        KeyAction::OpenHelp => {
            app.modal = Some(ModalState::Help { scroll: 0 });
            app.input_mode = InputMode::Modal;
        }
        KeyAction::MoveUp => app.list.move_cursor_up(),
        KeyAction::MoveDown => app.list.move_cursor_down(),
        KeyAction::PrevPage => dispatch(app, UiAction::PrevPage),
        KeyAction::NextPage => dispatch(app, UiAction::NextPage),
        KeyAction::ToggleSelectAll => dispatch(app, UiAction::ToggleSelectAll),
        KeyAction::ToggleRow | KeyAction::EditRow | KeyAction::DeleteRow => {
            if let Some(id) = app.list.cursor_user().map(|u| u.id) {
                let row_action = match action {
                    KeyAction::ToggleRow => UiAction::ToggleRow(id),
                    KeyAction::EditRow => UiAction::EditUser(id),
                    _ => UiAction::DeleteUser(id),
                };
                dispatch(app, row_action);
            }
        }
        KeyAction::EditSelected => dispatch(app, UiAction::EditSelected),
        KeyAction::DeleteSelected => dispatch(app, UiAction::DeleteSelected),
        KeyAction::ConnectUsers => dispatch(app, UiAction::ConnectUsers),
    }
    Flow::Continue
}

/// Clicks land on whatever the last frame registered under the pointer.
pub fn handle_mouse(app: &mut AppState, mouse: MouseEvent) -> Flow {
    if app.input_mode == InputMode::Modal {
        if let MouseEventKind::Down(MouseButton::Left) = mouse.kind {
            app.modal = None;
            app.input_mode = InputMode::Normal;
        }
        return Flow::Continue;
    }
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            match app.hits.hit(mouse.column, mouse.row) {
                Some(action) => dispatch(app, action),
                None if app.input_mode == InputMode::Search => {
                    app.input_mode = InputMode::Normal;
                }
                None => {}
            }
        }
        MouseEventKind::ScrollDown => app.list.move_cursor_down(),
        MouseEventKind::ScrollUp => app.list.move_cursor_up(),
        _ => {}
    }
    Flow::Continue
}

/// Apply a UI action to the list screen.
pub fn dispatch(app: &mut AppState, action: UiAction) {
    match action {
        UiAction::PrevPage => {
            if app.list.prev_page() {
                app.row_offset = 0;
            }
        }
        UiAction::NextPage => {
            if app.list.next_page() {
                app.row_offset = 0;
            }
        }
        UiAction::ToggleSelectAll => {
            app.list.select_all_checked = !app.list.select_all_checked;
            let checked = app.list.select_all_checked;
            app.list.toggle_select_all_visible(checked);
        }
        UiAction::ToggleRow(id) => {
            app.list.toggle_one(id);
            app.list.focus_user(id);
        }
        UiAction::FocusSearch => {
            app.input_mode = InputMode::Search;
        }
        UiAction::EditUser(id) | UiAction::DeleteUser(id) => {
            let verb = if matches!(action, UiAction::EditUser(_)) { "Editing" } else { "Deleting" };
            let name = app
                .list
                .all()
                .iter()
                .find(|u| u.id == id)
                .map(|u| u.name.clone())
                .unwrap_or_else(|| format!("user {id}"));
            tracing::info!(?action, "row action requested; no backend configured");
            show_unavailable(app, format!("{verb} {name} is not available: no backend is configured."));
        }
        UiAction::EditSelected | UiAction::DeleteSelected => {
            let verb = if action == UiAction::EditSelected { "Editing" } else { "Deleting" };
            let count = app.list.selected_count();
            tracing::info!(?action, count, "bulk action requested; no backend is configured");
            let message = if count == 0 {
                "No users selected.".to_string()
            } else {
                format!("{verb} {count} selected users is not available: no backend is configured.")
            };
            show_unavailable(app, message);
        }
        UiAction::ConnectUsers => {
            tracing::info!("connect users requested; no backend configured");
            show_unavailable(app, "Connecting users is not available: no backend is configured.".to_string());
        }
    }
}

fn show_unavailable(app: &mut AppState, message: String) {
    app.modal = Some(ModalState::Info { message });
    app.input_mode = InputMode::Modal;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Theme;
    use crate::app::keymap::Keymap;
    use crate::list::UserListState;
    use crate::remote::{Role, UserRecord};

    fn app_with(n: u64) -> AppState {
        let users = (1..=n)
            .map(|i| UserRecord {
                id: i,
                name: format!("U{i}"),
                email: format!("u{i}@example.com"),
                avatar: String::new(),
                role: Role::Admin,
            })
            .collect();
        AppState::from_parts(
            UserListState::with_users(25, users),
            Theme::indigo(),
            Keymap::default(),
            Duration::from_millis(1000),
        )
    }

    fn press(app: &mut AppState, code: KeyCode, now: Instant) -> Flow {
        handle_key(app, KeyEvent::new(code, KeyModifiers::NONE), now)
    }

    #[test]
    fn typing_is_debounced_until_quiet() {
        let mut app = app_with(30);
        let t0 = Instant::now();
        press(&mut app, KeyCode::Char('/'), t0);
        assert_eq!(app.input_mode, InputMode::Search);
        press(&mut app, KeyCode::Char('u'), t0);
        press(&mut app, KeyCode::Char('3'), t0 + Duration::from_millis(300));
        app.tick(t0 + Duration::from_millis(1000));
        assert_eq!(app.list.query(), "");
        app.tick(t0 + Duration::from_millis(1300));
        assert_eq!(app.list.query(), "u3");
        assert_eq!(app.list.visible().len(), 2);
    }

    #[test]
    fn enter_applies_search_immediately() {
        let mut app = app_with(30);
        let t0 = Instant::now();
        press(&mut app, KeyCode::Char('/'), t0);
        for c in "zzz".chars() {
            press(&mut app, KeyCode::Char(c), t0);
        }
        press(&mut app, KeyCode::Enter, t0);
        assert_eq!(app.input_mode, InputMode::Normal);
        assert!(app.list.no_results());
    }

    #[test]
    fn chords_do_not_type_into_search() {
        let mut app = app_with(3);
        let t0 = Instant::now();
        press(&mut app, KeyCode::Char('/'), t0);
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(handle_key(&mut app, ctrl_c, t0), Flow::Continue);
        let alt_x = KeyEvent::new(KeyCode::Char('x'), KeyModifiers::ALT);
        handle_key(&mut app, alt_x, t0);
        assert_eq!(app.search_input, "");
        assert!(!app.debouncer.is_pending());
        let shifted = KeyEvent::new(KeyCode::Char('U'), KeyModifiers::SHIFT);
        handle_key(&mut app, shifted, t0);
        assert_eq!(app.search_input, "U");
    }

    #[test]
    fn help_scroll_stops_at_the_last_line() {
        let mut app = app_with(3);
        app.help_scroll_max = 4;
        press(&mut app, KeyCode::Char('?'), Instant::now());
        for _ in 0..50 {
            press(&mut app, KeyCode::Down, Instant::now());
        }
        assert_eq!(app.modal, Some(ModalState::Help { scroll: 4 }));
        press(&mut app, KeyCode::Up, Instant::now());
        assert_eq!(app.modal, Some(ModalState::Help { scroll: 3 }));
    }

    #[test]
    fn stub_actions_open_info_modal() {
        let mut app = app_with(3);
        press(&mut app, KeyCode::Char('e'), Instant::now());
        assert!(matches!(app.modal, Some(ModalState::Info { ref message }) if message.contains("U1")));
        press(&mut app, KeyCode::Esc, Instant::now());
        assert_eq!(app.input_mode, InputMode::Normal);
        assert!(app.modal.is_none());
    }

    #[test]
    fn quit_and_reload_flow() {
        let mut app = app_with(3);
        assert_eq!(press(&mut app, KeyCode::Char('r'), Instant::now()), Flow::Reload);
        assert_eq!(press(&mut app, KeyCode::Char('q'), Instant::now()), Flow::Quit);
    }
}
