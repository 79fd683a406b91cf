use serde::{Deserialize, Serialize};
use unicode_width::UnicodeWidthStr;

use crate::model::{MIN_TABLE_SIZE, TABLE_MINIMIZED_FIELDS, Table};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TableMetrics {
    pub header_height: f64,
    pub field_height: f64,
    pub footer_height: f64,
    pub minimized_fields: usize,
    pub min_width: f64,
    pub fallback_width: f64,
    pub fallback_height: f64,
    pub char_width: f64,
}

impl Default for TableMetrics {
    fn default() -> Self {
        Self {
            header_height: 42.0,
            field_height: 32.0,
            footer_height: 32.0,
            minimized_fields: TABLE_MINIMIZED_FIELDS,
            min_width: MIN_TABLE_SIZE,
            fallback_width: 200.0,
            fallback_height: 300.0,
            char_width: 8.0,
        }
    }
}

impl TableMetrics {
    /// Fields drawn for the table; collapsed tables show at most `minimized_fields`.
    pub fn visible_fields(&self, table: &Table) -> usize {
        if table.is_expanded() {
            table.fields.len()
        } else {
            table.fields.len().min(self.minimized_fields)
        }
    }

    /// Whether the collapsed table shows a "show more" footer row.
    pub fn has_footer(&self, table: &Table) -> bool {
        !table.is_expanded() && table.fields.len() > self.minimized_fields
    }

    pub fn table_height(&self, table: Option<&Table>) -> f64 {
        let Some(table) = table else {
            return self.fallback_height;
        };

        let fields_height = self.visible_fields(table) as f64 * self.field_height;
        let footer_height = if self.has_footer(table) {
            self.footer_height
        } else {
            0.0
        };

        self.header_height + fields_height + footer_height
    }

    pub fn table_width(&self, table: Option<&Table>) -> f64 {
        match table {
            Some(table) => table
                .width
                .filter(|w| w.is_finite() && *w > 0.0)
                .unwrap_or(self.min_width),
            None => self.fallback_width,
        }
    }

    pub fn table_size(&self, table: Option<&Table>) -> Size {
        Size {
            width: self.table_width(table),
            height: self.table_height(table),
        }
    }

    pub fn text_width(&self, text: &str) -> f64 {
        let width = UnicodeWidthStr::width(text);
        width as f64 * self.char_width
    }

    /// Cut `text` so that it renders within `max_width`, marking the cut with "…".
    pub fn truncate(&self, text: &str, max_width: f64) -> String {
        if self.text_width(text) <= max_width {
            return text.to_string();
        }

        let budget = max_width - self.char_width;
        let mut out = String::new();
        for c in text.chars() {
            let mut next = out.clone();
            next.push(c);
            if self.text_width(&next) > budget {
                break;
            }
            out = next;
        }
        out.push('…');
        out
    }
}
