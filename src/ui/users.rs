use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::app::{AppState, UiAction};
use crate::remote::{Role, UserRecord};
use crate::ui::components::{ActionButton, ButtonSize, checkbox_span, render_button_row};

/// Text and background colour of each role chip.
pub const fn role_colors(role: Role) -> (Color, Color) {
    match role {
        Role::Admin => (Color::Rgb(0x57, 0x41, 0x95), Color::Rgb(0xEF, 0xE2, 0xFE)),
        Role::Agent => (Color::Rgb(0x2C, 0x52, 0x82), Color::Rgb(0xC8, 0xE7, 0xF9)),
        Role::AccountManager => (Color::Rgb(0x92, 0x2B, 0x6C), Color::Rgb(0xFE, 0xDD, 0xE6)),
        Role::ExternalReviewer => (Color::Rgb(0x91, 0x47, 0x2C), Color::Rgb(0xFE, 0xEB, 0xC8)),
        Role::Unknown => (Color::Reset, Color::Reset),
    }
}

fn row_columns(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(4),
            Constraint::Length(4),
            Constraint::Percentage(30),
            Constraint::Min(16),
            Constraint::Length(19),
            Constraint::Length(18),
        ])
        .split(area)
}

/// "N users selected" with the bulk Edit/Delete buttons.
pub fn render_selection_bar(f: &mut Frame, area: Rect, app: &mut AppState) {
    let count = app.list.selected_count();
    let noun = if count == 1 { "user" } else { "users" };
    let text = format!(" {count} {noun} selected");
    let label_w = (text.chars().count() as u16 + 2).min(area.width);
    let p = Paragraph::new(text).style(Style::default().fg(app.theme.text).add_modifier(Modifier::BOLD));
    f.render_widget(p, Rect { width: label_w, ..area });

    let buttons = [
        ActionButton::new()
            .size(ButtonSize::Small)
            .icon("✎")
            .label("Edit")
            .on_click(UiAction::EditSelected),
        ActionButton::new()
            .size(ButtonSize::Small)
            .icon("✖")
            .label("Delete")
            .style(Style::default().fg(Color::Red))
            .on_click(UiAction::DeleteSelected),
    ];
    let rest = Rect {
        x: area.x + label_w,
        width: area.width.saturating_sub(label_w),
        ..area
    };
    render_button_row(f, rest, &buttons, false, &app.theme, &mut app.hits);
}

/// The bordered user table: column header, rows, and empty states.
pub fn render_users_table(f: &mut Frame, area: Rect, app: &mut AppState) {
    let block = Block::default()
        .title("Users")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.border));
    let inner = block.inner(area);
    f.render_widget(block, area);
    if inner.height == 0 {
        return;
    }

    let header = Rect { height: 1, ..inner };
    render_column_header(f, header, app);

    let body = Rect {
        y: inner.y + 1,
        height: inner.height.saturating_sub(1),
        ..inner
    };
    if body.height == 0 {
        return;
    }

    let visible: Vec<UserRecord> = app.list.visible().into_iter().cloned().collect();
    if visible.is_empty() {
        let msg = if app.list.is_loading() {
            "Loading users…".to_string()
        } else if app.list.no_results() {
            format!("No users match \"{}\"", app.list.query())
        } else {
            "no user".to_string()
        };
        let p = Paragraph::new(msg).style(Style::default().fg(app.theme.muted));
        f.render_widget(p, body);
        return;
    }

    // Keep the cursor row on screen when the page is taller than the terminal
    let capacity = body.height as usize;
    let cursor = app.list.cursor();
    if cursor < app.row_offset {
        app.row_offset = cursor;
    }
    if cursor >= app.row_offset.saturating_add(capacity) {
        app.row_offset = cursor + 1 - capacity;
    }
    let start = app.row_offset.min(visible.len());
    let end = (start + capacity).min(visible.len());

    for (i, user) in visible[start..end].iter().enumerate() {
        let row = Rect {
            y: body.y + i as u16,
            height: 1,
            ..body
        };
        render_user_row(f, row, app, user, start + i == cursor);
    }
}

fn render_column_header(f: &mut Frame, area: Rect, app: &mut AppState) {
    let cols = row_columns(area);
    let title = Style::default().fg(app.theme.title).add_modifier(Modifier::BOLD);

    f.render_widget(
        Paragraph::new(Line::from(checkbox_span(app.list.select_all_checked, &app.theme))),
        cols[1],
    );
    app.hits.register(Rect { width: 3.min(cols[1].width), ..cols[1] }, UiAction::ToggleSelectAll);
    f.render_widget(Paragraph::new(Span::styled("User", title)), cols[3]);
    f.render_widget(Paragraph::new(Span::styled("Email", title)), cols[4]);
    f.render_widget(Paragraph::new(Span::styled("Permission ▾", title)), cols[5]);
}

fn render_user_row(f: &mut Frame, area: Rect, app: &mut AppState, user: &UserRecord, is_cursor: bool) {
    let cols = row_columns(area);
    let selected = app.list.is_selected(user.id);
    let base = if is_cursor {
        Style::default()
            .fg(app.theme.highlight_fg)
            .bg(app.theme.highlight_bg)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(app.theme.text)
    };

    let marker = if selected {
        Span::styled("▌", Style::default().fg(app.theme.selected_marker))
    } else {
        Span::raw(" ")
    };
    f.render_widget(Paragraph::new(marker), cols[0]);

    f.render_widget(Paragraph::new(Line::from(checkbox_span(selected, &app.theme))), cols[1]);
    app.hits.register(Rect { width: 3.min(cols[1].width), ..cols[1] }, UiAction::ToggleRow(user.id));

    let avatar = Span::styled(
        format!("{:^3}", user.initials()),
        Style::default().fg(Color::White).bg(app.theme.muted),
    );
    f.render_widget(Paragraph::new(avatar), cols[2]);

    f.render_widget(Paragraph::new(user.name.as_str()).style(base), cols[3]);
    f.render_widget(
        Paragraph::new(user.email.as_str()).style(base.fg(app.theme.muted)),
        cols[4],
    );

    let (fg, bg) = role_colors(user.role);
    let chip = Span::styled(format!(" {} ", user.role.label()), Style::default().fg(fg).bg(bg));
    f.render_widget(Paragraph::new(chip), cols[5]);

    let buttons = [
        ActionButton::new()
            .size(ButtonSize::Small)
            .icon("✎")
            .label("Edit")
            .on_click(UiAction::EditUser(user.id)),
        ActionButton::new()
            .size(ButtonSize::Small)
            .icon("✖")
            .on_click(UiAction::DeleteUser(user.id)),
    ];
    render_button_row(f, cols[6], &buttons, false, &app.theme, &mut app.hits);
}

/// Previous / page indicator / Next.
pub fn render_pagination(f: &mut Frame, area: Rect, app: &mut AppState) {
    let pages = app.list.page_count();
    let current = if pages == 0 { 0 } else { app.list.current_page() };
    let range = app.list.visible_range();
    let total = app.list.filtered().len();
    let indicator = if total == 0 {
        format!("  Page {current} of {pages}  ")
    } else {
        format!("  Page {current} of {pages} · {}-{} of {total}  ", range.start + 1, range.end)
    };
    let buttons = [
        ActionButton::new()
            .size(ButtonSize::Small)
            .icon("◀")
            .label("Previous")
            .disabled(!app.list.can_prev())
            .on_click(UiAction::PrevPage),
    ];
    let next = [
        ActionButton::new()
            .size(ButtonSize::Small)
            .label("Next")
            .icon("▶")
            .disabled(!app.list.can_next())
            .on_click(UiAction::NextPage),
    ];

    let prev_w = buttons[0].width();
    let ind_w = indicator.chars().count() as u16;
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(prev_w),
            Constraint::Length(ind_w),
            Constraint::Min(0),
        ])
        .split(area);
    render_button_row(f, chunks[0], &buttons, false, &app.theme, &mut app.hits);
    f.render_widget(
        Paragraph::new(indicator).style(Style::default().fg(app.theme.muted)),
        chunks[1],
    );
    render_button_row(f, chunks[2], &next, false, &app.theme, &mut app.hits);
}
