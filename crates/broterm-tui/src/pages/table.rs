//! Selectable table shared by the list pages.

use broterm_core::RowIndex;
use broterm_core::rows::FIRST_ROW;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use ratatui::text::Line;
use ratatui::widgets::{Paragraph, Row, Table, TableState};

use super::Palette;

/// Rows plus the selected row number. Row numbers follow [`RowIndex`]:
/// the header is row 0.
#[derive(Debug)]
pub struct TableView<T> {
    rows: RowIndex<T>,
    selected: Option<usize>,
}

impl<T> Default for TableView<T> {
    fn default() -> Self {
        Self {
            rows: RowIndex::default(),
            selected: None,
        }
    }
}

impl<T> TableView<T> {
    /// Replaces the rows, keeping the selection when that row still exists.
    pub fn populate(&mut self, items: impl IntoIterator<Item = T>) {
        self.rows.rebuild(items);
        self.selected = self
            .selected
            .filter(|row| self.rows.get(*row).is_some())
            .or_else(|| self.rows.next_row(None));
    }

    pub fn clear(&mut self) {
        self.rows.clear();
        self.selected = None;
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn items(&self) -> impl Iterator<Item = &T> {
        self.rows.iter().map(|(_, item)| item)
    }

    pub fn selected(&self) -> Option<(usize, &T)> {
        let row = self.selected?;
        self.rows.get(row).map(|item| (row, item))
    }

    /// Removes `row` if it still holds an item matching `expected`.
    pub fn remove_if(&mut self, row: usize, expected: impl FnOnce(&T) -> bool) -> Option<T> {
        if !self.rows.get(row).is_some_and(expected) {
            return None;
        }
        let removed = self.rows.remove(row);
        if self.rows.get(row).is_none() {
            self.selected = self.rows.prev_row(None);
        }
        removed
    }

    /// Moves the selection for Tab/BackTab and the arrow keys.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Tab | KeyCode::Down => {
                self.selected = self.rows.next_row(self.selected);
                true
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.selected = self.rows.prev_row(self.selected);
                true
            }
            _ => false,
        }
    }

    pub fn render<const N: usize>(
        &self,
        frame: &mut Frame,
        area: Rect,
        columns: [(&str, Constraint); N],
        cells: impl Fn(&T) -> [String; N],
        palette: &Palette,
        empty: &str,
    ) {
        if self.rows.is_empty() {
            let text = Paragraph::new(Line::styled(empty, palette.muted())).style(palette.text());
            frame.render_widget(text, area);
            return;
        }

        let header = Row::new(columns.iter().map(|(title, _)| *title)).style(palette.header());
        let rows = self.rows.iter().map(|(_, item)| Row::new(cells(item)));
        let widths = columns.map(|(_, width)| width);
        let table = Table::new(rows, widths)
            .header(header)
            .style(palette.text())
            .row_highlight_style(palette.selected())
            .column_spacing(2);

        let mut state = TableState::default().with_selected(self.selected.map(|r| r - FIRST_ROW));
        frame.render_stateful_widget(table, area, &mut state);
    }
}
