use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

pub const ELLIPSIS: &str = "...";

/// Page counts at or below this are listed in full.
const FULL_WINDOW: u32 = 7;

/// Pages from either edge within which the window attaches to that edge
/// instead of showing an ellipsis.
const EDGE_SPAN: u32 = 4;

/// A single slot in the page navigation strip. Serialises as the page number
/// or the string `"..."`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageItem {
    Page(u32),
    Ellipsis,
}

impl std::fmt::Display for PageItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PageItem::Page(n) => write!(f, "{n}"),
            PageItem::Ellipsis => f.write_str(ELLIPSIS),
        }
    }
}

impl Serialize for PageItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PageItem::Page(n) => serializer.serialize_u32(*n),
            PageItem::Ellipsis => serializer.serialize_str(ELLIPSIS),
        }
    }
}

impl<'de> Deserialize<'de> for PageItem {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Page(u32),
            Marker(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Page(n) => Ok(PageItem::Page(n)),
            Raw::Marker(s) if s == ELLIPSIS => Ok(PageItem::Ellipsis),
            Raw::Marker(s) => Err(de::Error::custom(format!(
                "expected a page number or \"{ELLIPSIS}\", found \"{s}\""
            ))),
        }
    }
}

/// `ceil(total / page_size)`, or 0 when `page_size` is 0.
pub fn total_pages(total: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 0;
    }
    let pages = total.div_ceil(u64::from(page_size));
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Clamp `page` into `[1, total_pages]`. With no pages the result is 1.
pub fn clamp_page(page: u32, total_pages: u32) -> u32 {
    page.clamp(1, total_pages.max(1))
}

/// Compute the abbreviated page strip for `current` of `total_pages`.
///
/// Up to 7 pages are listed verbatim. Beyond that the strip always holds the
/// first and last page, the pages either side of `current`, and an ellipsis
/// wherever pages are hidden, for at most 7 slots. Near either edge the run
/// attaches to that edge so no page is ever skipped without an ellipsis.
/// `current` is clamped into range, never rejected.
pub fn compute_window(current: u32, total_pages: u32) -> Vec<PageItem> {
    if total_pages <= FULL_WINDOW {
        return (1..=total_pages).map(PageItem::Page).collect();
    }

    let current = clamp_page(current, total_pages);
    let last = total_pages;

    let leading_gap = current > EDGE_SPAN;
    let trailing_gap = current < last.saturating_sub(EDGE_SPAN - 1);

    let run_start = match (leading_gap, trailing_gap) {
        (false, _) => 2,
        (true, true) => current - 1,
        (true, false) => (current - 1).min(last - 2),
    };
    let run_end = match (leading_gap, trailing_gap) {
        (_, false) => last - 1,
        (true, true) => current + 1,
        (false, true) => (current + 1).max(3),
    };

    let mut window = Vec::with_capacity(FULL_WINDOW as usize);
    window.push(PageItem::Page(1));
    if leading_gap {
        window.push(PageItem::Ellipsis);
    }
    window.extend((run_start..=run_end).map(PageItem::Page));
    if trailing_gap {
        window.push(PageItem::Ellipsis);
    }
    window.push(PageItem::Page(last));

    window
}

/// "Showing `start` to `end` of `total` entries". Positions are 1-based;
/// an empty list reports `0 to 0 of 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSummary {
    pub start: u64,
    pub end: u64,
    pub total: u64,
    pub page: u32,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PageSummary {
    pub fn new(page: u32, page_size: u32, total: u64) -> Self {
        let total_pages = total_pages(total, page_size);
        let page = clamp_page(page, total_pages);

        let (start, end) = if total == 0 || page_size == 0 {
            (0, 0)
        } else {
            let offset = u64::from(page - 1) * u64::from(page_size);
            (offset + 1, (offset + u64::from(page_size)).min(total))
        };

        PageSummary {
            start,
            end,
            total,
            page,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }
}

impl std::fmt::Display for PageSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Showing {} to {} of {} entries",
            self.start, self.end, self.total
        )
    }
}

/// The rows of one page of an in-memory list, with `page` clamped.
pub fn paginate<T>(data: &[T], page: u32, page_size: u32) -> &[T] {
    let summary = PageSummary::new(page, page_size, data.len() as u64);
    if summary.total == 0 || page_size == 0 {
        return &[];
    }
    &data[(summary.start - 1) as usize..summary.end as usize]
}
