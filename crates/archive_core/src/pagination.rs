use crate::model::PAGE_SIZE;

/// Which page navigation buttons are available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageBounds {
    pub can_go_newer: bool,
    pub can_go_older: bool,
}

pub fn bounds(skip: u64, total: u64) -> PageBounds {
    PageBounds {
        can_go_newer: skip > 0,
        can_go_older: total > 0 && skip + PAGE_SIZE < total,
    }
}

/// Cursor one page towards newer messages, if there is one.
pub fn newer_skip(skip: u64) -> Option<u64> {
    bounds(skip, 0).can_go_newer.then(|| skip.saturating_sub(PAGE_SIZE))
}

/// Cursor one page towards older messages, if `total` has more.
pub fn older_skip(skip: u64, total: u64) -> Option<u64> {
    bounds(skip, total).can_go_older.then(|| skip + PAGE_SIZE)
}

/// One-based page number for display.
pub fn page_number(skip: u64) -> u64 {
    skip / PAGE_SIZE + 1
}
