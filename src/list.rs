//! Paging, search and selection state for the user list.
//!
//! The full list is loaded once. Everything shown on screen (filtered list,
//! visible slice, page count) is recomputed from `(full, query, window, selection)`
//! on demand rather than cached, so a filter change can never leave a stale
//! page behind.
//!
use std::collections::BTreeSet;
use std::ops::Range;

use crate::remote::UserRecord;
use crate::search::filter_by_name;

/// Rows per page unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: usize = 25;

/// Offsets `(start, end)` into the filtered list; `end - start` is always the page size.
///
/// The window may extend past the end of the filtered list on the last page;
/// [`PageWindow::clamp`] gives the range actually shown.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PageWindow {
    pub start: usize,
    pub end: usize,
}

impl PageWindow {
    pub fn first(page_size: usize) -> Self {
        Self {
            start: 0,
            end: page_size,
        }
    }

    pub fn clamp(&self, len: usize) -> Range<usize> {
        self.start.min(len)..self.end.min(len)
    }
}

#[derive(Clone, Debug)]
pub struct UserListState {
    full: Vec<UserRecord>,
    query: String,
    page_size: usize,
    window: PageWindow,
    selection: BTreeSet<u64>,
    loading: bool,
    no_results: bool,
    /// Header "select all" checkbox; only the user flips it.
    pub select_all_checked: bool,
    /// Highlighted row within the visible slice.
    cursor: usize,
}

impl UserListState {
    /// `page_size` of zero is bumped to one.
    pub fn new(page_size: usize) -> Self {
        let page_size = page_size.max(1);
        Self {
            full: Vec::new(),
            query: String::new(),
            page_size,
            window: PageWindow::first(page_size),
            selection: BTreeSet::new(),
            loading: false,
            no_results: false,
            select_all_checked: false,
            cursor: 0,
        }
    }

    pub fn with_users(page_size: usize, users: Vec<UserRecord>) -> Self {
        let mut state = Self::new(page_size);
        state.finish_load(users);
        state
    }

    pub fn begin_load(&mut self) {
        self.loading = true;
    }

    /// Install a freshly fetched list. A failed fetch arrives as an empty list.
    pub fn finish_load(&mut self, users: Vec<UserRecord>) {
        self.loading = false;
        self.full = users;
        self.selection
            .retain(|id| self.full.iter().any(|u| u.id == *id));
        if self.selection.is_empty() {
            self.select_all_checked = false;
        }
        self.reset_window();
        self.refresh_no_results();
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// True when a non-empty query matches nobody.
    pub fn no_results(&self) -> bool {
        self.no_results
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn window(&self) -> PageWindow {
        self.window
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn all(&self) -> &[UserRecord] {
        &self.full
    }

    /// Replace the active filter and go back to the first page.
    pub fn set_search(&mut self, query: impl Into<String>) {
        self.query = query.into();
        self.reset_window();
        self.refresh_no_results();
        tracing::debug!(query = %self.query, matches = self.filtered().len(), "search applied");
    }

    pub fn filtered(&self) -> Vec<&UserRecord> {
        filter_by_name(&self.full, &self.query)
    }

    pub fn visible_range(&self) -> Range<usize> {
        self.window.clamp(self.filtered().len())
    }

    /// Rows on the current page.
    pub fn visible(&self) -> Vec<&UserRecord> {
        let filtered = self.filtered();
        let range = self.window.clamp(filtered.len());
        filtered[range].to_vec()
    }

    pub fn page_count(&self) -> usize {
        self.filtered().len().div_ceil(self.page_size)
    }

    /// One-based index of the current page.
    pub fn current_page(&self) -> usize {
        self.window.start / self.page_size + 1
    }

    pub fn can_next(&self) -> bool {
        self.current_page() < self.page_count()
    }

    pub fn can_prev(&self) -> bool {
        self.current_page() > 1
    }

    /// Advance one page; returns whether the window moved.
    pub fn next_page(&mut self) -> bool {
        if !self.can_next() {
            return false;
        }
        self.window.start += self.page_size;
        self.window.end += self.page_size;
        self.cursor = 0;
        tracing::debug!(page = self.current_page(), "next page");
        true
    }

    /// Go back one page, never before the first; returns whether the window moved.
    pub fn prev_page(&mut self) -> bool {
        if !self.can_prev() {
            return false;
        }
        let start = self.window.start.saturating_sub(self.page_size);
        self.window = PageWindow {
            start,
            end: start + self.page_size,
        };
        self.cursor = 0;
        tracing::debug!(page = self.current_page(), "previous page");
        true
    }

    /// Checked selects exactly the visible rows; unchecked clears the selection.
    pub fn toggle_select_all_visible(&mut self, checked: bool) {
        if checked {
            self.selection = self.visible().iter().map(|u| u.id).collect();
        } else {
            self.selection.clear();
        }
    }

    pub fn toggle_one(&mut self, id: u64) {
        if !self.selection.remove(&id) {
            self.selection.insert(id);
        }
    }

    pub fn is_selected(&self, id: u64) -> bool {
        self.selection.contains(&id)
    }

    pub fn selected_count(&self) -> usize {
        self.selection.len()
    }

    pub fn selected_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.selection.iter().copied()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn cursor_user(&self) -> Option<&UserRecord> {
        self.visible().get(self.cursor).copied()
    }

    pub fn move_cursor_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_cursor_down(&mut self) {
        if self.cursor + 1 < self.visible_range().len() {
            self.cursor += 1;
        }
    }

    /// Point the cursor at `id` if it is on the current page.
    pub fn focus_user(&mut self, id: u64) {
        if let Some(pos) = self.visible().iter().position(|u| u.id == id) {
            self.cursor = pos;
        }
    }

    fn reset_window(&mut self) {
        self.window = PageWindow::first(self.page_size);
        self.cursor = 0;
    }

    fn refresh_no_results(&mut self) {
        self.no_results = !self.query.is_empty() && self.filtered().is_empty();
    }
}
