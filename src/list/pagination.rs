//! Page arithmetic and pagination bar layout

use serde::{Deserialize, Serialize};

/// Number of page buttons shown on wide displays
pub const WIDE_WINDOW: u32 = 5;

/// Number of page buttons shown on narrow displays
pub const NARROW_WINDOW: u32 = 2;

/// Total number of pages for a result set, never less than 1
pub fn total_pages(total_items: u64, page_size: u32) -> u32 {
    if page_size == 0 || total_items == 0 {
        return 1;
    }
    let pages = total_items.div_ceil(u64::from(page_size));
    u32::try_from(pages).unwrap_or(u32::MAX).max(1)
}

/// One slot in a pagination bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "page")]
pub enum PageSlot {
    /// A clickable page number
    Page(u32),
    /// Gap marker between page groups
    Ellipsis,
}

/// Which navigation buttons are enabled around the page numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavButtons {
    pub first: bool,
    pub previous: bool,
    pub next: bool,
    pub last: bool,
}

impl NavButtons {
    /// Button state for `page` out of `total_pages`
    pub fn for_page(page: u32, total_pages: u32) -> Self {
        let at_start = page <= 1;
        let at_end = page >= total_pages;
        Self {
            first: !at_start,
            previous: !at_start,
            next: !at_end,
            last: !at_end,
        }
    }
}

/// Page numbers to render for the current position.
///
/// Small result sets show every page. Otherwise the bar shows the first
/// group, a centred group around `page`, or the trailing group, with an
/// ellipsis and the last page appended to the first two.
pub fn page_window(page: u32, total_pages: u32, window: u32) -> Vec<PageSlot> {
    let total_pages = total_pages.max(1);
    let window = window.max(1);

    if total_pages <= window {
        return (1..=total_pages).map(PageSlot::Page).collect();
    }

    let mut slots: Vec<PageSlot>;
    if page <= window {
        slots = (1..=window).map(PageSlot::Page).collect();
        slots.push(PageSlot::Ellipsis);
        slots.push(PageSlot::Page(total_pages));
    } else if page <= total_pages - window {
        let start = page.saturating_sub(2).max(1);
        let end = (page + 2).min(total_pages);
        slots = (start..=end).map(PageSlot::Page).collect();
        if end < total_pages {
            if end + 1 < total_pages {
                slots.push(PageSlot::Ellipsis);
            }
            slots.push(PageSlot::Page(total_pages));
        }
    } else {
        slots = (total_pages - window + 1..=total_pages)
            .map(PageSlot::Page)
            .collect();
    }
    slots
}
