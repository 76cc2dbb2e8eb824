//! Shared UI components: action buttons, checkboxes, status bar and modals.
//!
use std::collections::BTreeMap;

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::app::keymap::{KeyAction, Keymap, describe_action};
use crate::app::{AppState, HitMap, InputMode, Theme, UiAction};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ButtonVariant {
    Text,
    #[default]
    Outlined,
    Contained,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ButtonSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl ButtonSize {
    fn padding(self) -> usize {
        match self {
            ButtonSize::Small => 0,
            ButtonSize::Medium => 1,
            ButtonSize::Large => 2,
        }
    }
}

/// Stateless clickable button.
///
/// Rendering is a pure function of the fields; the click action is handed to
/// the frame's [`HitMap`] untouched and dispatched by the event loop.
#[derive(Clone, Debug, Default)]
pub struct ActionButton<'a> {
    pub variant: ButtonVariant,
    pub size: ButtonSize,
    pub icon: Option<&'a str>,
    pub label: Option<&'a str>,
    /// Extra style patched over the variant's style.
    pub style: Style,
    pub on_click: Option<UiAction>,
    pub disabled: bool,
}

impl<'a> ActionButton<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn variant(mut self, variant: ButtonVariant) -> Self {
        self.variant = variant;
        self
    }

    pub fn size(mut self, size: ButtonSize) -> Self {
        self.size = size;
        self
    }

    pub fn icon(mut self, icon: &'a str) -> Self {
        self.icon = Some(icon);
        self
    }

    pub fn label(mut self, label: &'a str) -> Self {
        self.label = Some(label);
        self
    }

    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn on_click(mut self, action: UiAction) -> Self {
        self.on_click = Some(action);
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// Text as drawn, including brackets and padding.
    pub fn text(&self) -> String {
        let inner = [self.icon, self.label]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        let pad = " ".repeat(self.size.padding());
        match self.variant {
            ButtonVariant::Text => format!("{pad}{inner}{pad}"),
            ButtonVariant::Outlined => format!("[{pad}{inner}{pad}]"),
            ButtonVariant::Contained => format!(" {pad}{inner}{pad} "),
        }
    }

    pub fn width(&self) -> u16 {
        u16::try_from(self.text().chars().count()).unwrap_or(u16::MAX)
    }

    fn base_style(&self, theme: &Theme) -> Style {
        if self.disabled {
            return Style::default().fg(theme.muted);
        }
        match self.variant {
            ButtonVariant::Text => Style::default().fg(theme.accent),
            ButtonVariant::Outlined => Style::default().fg(theme.text),
            ButtonVariant::Contained => Style::default()
                .fg(Color::White)
                .bg(theme.accent)
                .add_modifier(Modifier::BOLD),
        }
    }

    /// Draw at the top-left of `area` and register the click region; returns the rect used.
    pub fn render(&self, f: &mut Frame, area: Rect, theme: &Theme, hits: &mut HitMap) -> Rect {
        let rect = Rect {
            x: area.x,
            y: area.y,
            width: self.width().min(area.width),
            height: area.height.min(1),
        };
        let p = Paragraph::new(self.text()).style(self.base_style(theme).patch(self.style));
        f.render_widget(p, rect);
        if let (Some(action), false) = (self.on_click, self.disabled) {
            hits.register(rect, action);
        }
        rect
    }
}

/// Lay buttons out left to right (or flush right) with a one-cell gap.
pub fn render_button_row(
    f: &mut Frame,
    area: Rect,
    buttons: &[ActionButton<'_>],
    align_right: bool,
    theme: &Theme,
    hits: &mut HitMap,
) {
    let total: u16 = buttons
        .iter()
        .map(|b| b.width().saturating_add(1))
        .sum::<u16>()
        .saturating_sub(1);
    let mut x = if align_right {
        area.right().saturating_sub(total).max(area.x)
    } else {
        area.x
    };
    for button in buttons {
        if x >= area.right() {
            break;
        }
        let slot = Rect {
            x,
            y: area.y,
            width: area.right() - x,
            height: area.height,
        };
        let used = button.render(f, slot, theme, hits);
        x = used.right().saturating_add(1);
    }
}

/// `[x]` / `[ ]` in the theme's checkbox colours.
pub fn checkbox_span(checked: bool, theme: &Theme) -> Span<'static> {
    if checked {
        Span::styled("[x]", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))
    } else {
        Span::styled("[ ]", Style::default().fg(theme.checkbox))
    }
}

/// Render the bottom status bar with mode and counts.
pub fn render_status_bar(f: &mut Frame, area: Rect, app: &AppState) {
    let mode = match app.input_mode {
        InputMode::Normal => "NORMAL",
        InputMode::Search => "SEARCH",
        InputMode::Modal => "MODAL",
    };
    let pending = if app.debouncer.is_pending() { " (typing…)" } else { "" };
    let msg = format!(
        "mode: {mode}{pending}  users:{}  matches:{}  rows/page:{}  selected:{}  — /: search; Space: select; a: select page; ←/→: page; ?: help; q: quit",
        app.list.all().len(),
        app.list.filtered().len(),
        app.list.page_size(),
        app.list.selected_count(),
    );
    let p = Paragraph::new(msg).style(
        Style::default()
            .fg(app.theme.status_fg)
            .bg(app.theme.status_bg),
    );
    f.render_widget(p, area);
}

/// Compute a rectangle centered within `area` with a maximum size.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

/// Render a generic informational modal dialog.
pub fn render_info_modal(f: &mut Frame, area: Rect, theme: &Theme, message: &str) {
    let max_w = area.width.saturating_sub(6).max(30);
    let width = 56u16.min(max_w);
    let text_w = width.saturating_sub(4).max(10) as usize;
    let approx_lines = message.chars().count().div_ceil(text_w).max(1) as u16;
    let max_h = area.height.saturating_sub(4).max(5);
    // borders, blank line and the close hint
    let height = (approx_lines + 4).min(max_h).max(5);
    let rect = centered_rect(width, height, area);
    let lines = vec![
        Line::raw(message.to_string()),
        Line::raw(""),
        Line::from(Span::styled(
            "Esc / Enter to close",
            Style::default().fg(theme.muted).add_modifier(Modifier::ITALIC),
        )),
    ];
    let p = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
        Block::default()
            .title("Info")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.border)),
    );
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
}

/// Keys bound to each action, formatted for display and sorted.
pub fn keys_by_action(keymap: &Keymap) -> BTreeMap<KeyAction, Vec<String>> {
    let mut grouped: BTreeMap<KeyAction, Vec<String>> = BTreeMap::new();
    for ((mods, code), action) in keymap.all_bindings() {
        if action == KeyAction::Ignore {
            continue;
        }
        grouped
            .entry(action)
            .or_default()
            .push(Keymap::format_key(mods, code));
    }
    for keys in grouped.values_mut() {
        keys.sort();
        keys.dedup();
    }
    grouped
}

/// Render the help modal listing the active keybindings.
///
/// Returns the largest scroll offset at which the last line is still in view.
pub fn render_help_modal(f: &mut Frame, area: Rect, app: &AppState, scroll: u16) -> u16 {
    let width = 72u16.min(area.width.saturating_sub(4)).max(40);
    let height = 24u16.min(area.height.saturating_sub(4)).max(10);
    let rect = centered_rect(width, height, area);

    let label_w = 22usize;
    let mut lines: Vec<Line> = vec![
        Line::from(Span::styled(
            "Keybindings",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::raw(""),
    ];
    for (action, keys) in keys_by_action(&app.keymap) {
        lines.push(Line::from(vec![
            Span::raw(format!("  {:>label_w$} │ ", describe_action(action))),
            Span::styled(keys.join(", "), Style::default().add_modifier(Modifier::ITALIC)),
        ]));
    }
    lines.push(Line::raw(""));
    lines.push(Line::from(vec![
        Span::raw("Search box: "),
        Span::styled("type", Style::default().add_modifier(Modifier::ITALIC)),
        Span::raw(" to filter by name (applied after a pause); Enter applies now; Esc leaves"),
    ]));
    lines.push(Line::from(vec![
        Span::raw("Mouse: "),
        Span::raw("click checkboxes, buttons and the search bar"),
    ]));
    lines.push(Line::raw(""));
    lines.push(Line::from(vec![
        Span::raw("Close help: "),
        Span::styled("Esc / Enter", Style::default().add_modifier(Modifier::ITALIC)),
    ]));

    let max_scroll = help_scroll_limit(&lines, rect);
    let p = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((scroll.min(max_scroll), 0))
        .block(
            Block::default()
                .title("Help")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border)),
        );
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
    max_scroll
}

/// Wrapped line count minus the bordered pane height, floored at zero.
fn help_scroll_limit(lines: &[Line<'_>], rect: Rect) -> u16 {
    let inner_w = usize::from(rect.width.saturating_sub(2)).max(1);
    let wrapped: usize = lines
        .iter()
        .map(|line| line.width().div_ceil(inner_w).max(1))
        .sum();
    let inner_h = usize::from(rect.height.saturating_sub(2));
    u16::try_from(wrapped.saturating_sub(inner_h)).unwrap_or(u16::MAX)
}
