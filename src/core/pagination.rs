//! Pagination and sort state of a resource table

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Page sizes offered by every table
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum RowsPerPage {
    #[default]
    Twenty,
    Fifty,
    Hundred,
    FiveHundred,
    Thousand,
}

impl RowsPerPage {
    pub fn all() -> &'static [RowsPerPage] {
        &[
            RowsPerPage::Twenty,
            RowsPerPage::Fifty,
            RowsPerPage::Hundred,
            RowsPerPage::FiveHundred,
            RowsPerPage::Thousand,
        ]
    }

    pub fn get(&self) -> u32 {
        match self {
            RowsPerPage::Twenty => 20,
            RowsPerPage::Fifty => 50,
            RowsPerPage::Hundred => 100,
            RowsPerPage::FiveHundred => 500,
            RowsPerPage::Thousand => 1000,
        }
    }
}

impl TryFrom<u32> for RowsPerPage {
    type Error = String;

    fn try_from(n: u32) -> Result<Self, Self::Error> {
        RowsPerPage::all()
            .iter()
            .copied()
            .find(|r| r.get() == n)
            .ok_or_else(|| format!("Unsupported page size: {} (use 20, 50, 100, 500 or 1000)", n))
    }
}

impl FromStr for RowsPerPage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let n: u32 = s
            .trim()
            .parse()
            .map_err(|_| format!("Unsupported page size: {}", s))?;
        RowsPerPage::try_from(n)
    }
}

impl fmt::Display for RowsPerPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

impl Serialize for RowsPerPage {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.get())
    }
}

impl<'de> Deserialize<'de> for RowsPerPage {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let n = u32::deserialize(deserializer)?;
        RowsPerPage::try_from(n).map_err(serde::de::Error::custom)
    }
}

/// Sort direction of the active sort column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    pub fn is_ascending(self) -> bool {
        self == SortDirection::Ascending
    }

    /// Query-string form
    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Pagination metadata as returned by the server
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageMeta {
    pub page: u32,
    pub rows_per_page: u32,
    pub total_rows: u64,
    pub total_pages: u32,
    pub from: u64,
    pub to: u64,
}

/// Client-side pagination and sort state of one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub rows_per_page: RowsPerPage,
    pub sort_by: Option<String>,
    pub sort_direction: SortDirection,
    pub total_rows: u64,
    pub total_pages: u32,
    pub from: u64,
    pub to: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(RowsPerPage::default())
    }
}

impl Pagination {
    pub fn new(rows_per_page: RowsPerPage) -> Self {
        Self {
            page: 1,
            rows_per_page,
            sort_by: None,
            sort_direction: SortDirection::Ascending,
            total_rows: 0,
            total_pages: 0,
            from: 0,
            to: 0,
        }
    }

    /// Request a page; values below 1 are treated as 1
    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    /// Change page size; always goes back to the first page
    pub fn set_rows_per_page(&mut self, rows: RowsPerPage) {
        self.rows_per_page = rows;
        self.page = 1;
    }

    /// Same column toggles direction, another column sorts ascending
    pub fn set_sort(&mut self, key: &str) {
        if self.sort_by.as_deref() == Some(key) {
            self.sort_direction = self.sort_direction.toggled();
        } else {
            self.sort_by = Some(key.to_string());
            self.sort_direction = SortDirection::Ascending;
        }
    }

    /// Highest page that can be requested
    pub fn last_page(&self) -> u32 {
        self.total_pages.max(1)
    }

    /// Fold a fetched page into the state
    ///
    /// Totals come from the server; `page` is clamped into
    /// `[1, max(total_pages, 1)]` and `from`/`to` are derived from the rows
    /// actually received so that `to - from + 1 == item_count` always holds.
    /// Returns true when the requested page was past the end and got clamped.
    pub fn apply(&mut self, meta: &PageMeta, item_count: usize) -> bool {
        self.total_rows = meta.total_rows;
        self.total_pages = if meta.total_pages > 0 || meta.total_rows == 0 {
            meta.total_pages
        } else {
            // Derive from totals when the server omitted the page count
            let per_page = u64::from(self.rows_per_page.get());
            meta.total_rows.div_ceil(per_page) as u32
        };

        let requested = if meta.page > 0 { meta.page } else { self.page };
        if item_count > 0 {
            // Rows arrived without (or with too small) totals; count what was seen
            let offset = u64::from(requested.max(1) - 1) * u64::from(self.rows_per_page.get());
            let seen = offset + item_count as u64;
            if self.total_rows < seen {
                self.total_rows = seen;
                self.total_pages = self.total_pages.max(requested.max(1));
            }
        }
        let clamped = requested.clamp(1, self.last_page());
        let was_clamped = clamped != self.page && self.page > self.last_page();
        self.page = clamped;

        if item_count == 0 || self.total_rows == 0 {
            self.from = 0;
            self.to = 0;
        } else {
            let offset = u64::from(self.page - 1) * u64::from(self.rows_per_page.get());
            self.from = (offset + 1).min(self.total_rows);
            self.to = (offset + item_count as u64).min(self.total_rows);
        }
        was_clamped
    }

    pub fn has_next(&self) -> bool {
        self.page < self.last_page()
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    /// Human summary, e.g. "21-40 of 95"
    pub fn range_label(&self) -> String {
        if self.total_rows == 0 {
            "0 of 0".to_string()
        } else {
            format!("{}-{} of {}", self.from, self.to, self.total_rows)
        }
    }
}
