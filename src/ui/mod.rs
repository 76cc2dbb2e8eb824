pub mod components;
pub mod users;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::app::{AppState, InputMode, ModalState, UiAction};
use components::{ActionButton, ButtonSize, ButtonVariant};

/// Draw the account users screen. Clickable regions are re-registered every frame.
pub fn render(f: &mut Frame, app: &mut AppState) {
    app.hits.clear();

    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Length(1),
                Constraint::Min(3),
                Constraint::Length(1),
                Constraint::Length(1),
            ]
            .as_ref(),
        )
        .split(f.area());

    render_header(f, root[0], app);
    users::render_selection_bar(f, root[1], app);
    users::render_users_table(f, root[2], app);
    users::render_pagination(f, root[3], app);
    components::render_status_bar(f, root[4], app);

    if let Some(modal) = app.modal.clone() {
        // Modal owns the input; stale hit regions under it must not fire
        app.hits.clear();
        let area = f.area();
        match modal {
            ModalState::Info { message } => {
                components::render_info_modal(f, area, &app.theme, &message)
            }
            ModalState::Help { scroll } => {
                let max = components::render_help_modal(f, area, app, scroll);
                app.help_scroll_max = max;
                if scroll > max {
                    app.modal = Some(ModalState::Help { scroll: max });
                }
            }
        }
    }
}

/// Title on the left; search bar and "Connect users" on the right.
fn render_header(f: &mut Frame, area: Rect, app: &mut AppState) {
    let block = Block::default()
        .title("account-users")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.border))
        .style(Style::default().bg(app.theme.header_bg));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)].as_ref())
        .split(inner);

    let title = Paragraph::new(Span::styled(
        "Account users",
        Style::default().fg(app.theme.header_fg).add_modifier(Modifier::BOLD),
    ));
    f.render_widget(title, halves[0]);

    let connect = ActionButton::new()
        .variant(ButtonVariant::Outlined)
        .size(ButtonSize::Large)
        .label("Connect users")
        .on_click(UiAction::ConnectUsers);
    let right = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(10), Constraint::Length(1), Constraint::Length(connect.width())].as_ref())
        .split(halves[1]);

    let searching = app.input_mode == InputMode::Search;
    let mut spans = vec![Span::styled("⌕ ", Style::default().fg(app.theme.muted))];
    if app.search_input.is_empty() && !searching {
        spans.push(Span::styled("Search", Style::default().fg(app.theme.muted)));
    } else {
        spans.push(Span::styled(app.search_input.clone(), Style::default().fg(app.theme.text)));
    }
    if searching {
        spans.push(Span::styled("▏", Style::default().fg(app.theme.accent)));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), right[0]);
    app.hits.register(right[0], UiAction::FocusSearch);

    connect.render(f, right[2], &app.theme, &mut app.hits);
}
