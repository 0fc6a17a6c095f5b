//! Page-number pagination over an ordered collection.

use serde::Serialize;

pub const PRODUCTS_PER_PAGE: u32 = 6;
pub const CATEGORIES_PER_PAGE: u32 = 8;
/// Products shown on a category detail page.
pub const CATEGORY_PRODUCTS_PER_PAGE: u32 = 6;

/// Slice of the collection a page covers; feeds LIMIT/OFFSET.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageWindow {
    pub offset: u64,
    pub limit: u32,
}

#[derive(Clone, Copy, Debug)]
pub struct Paginator {
    count: u64,
    per_page: u32,
}

impl Paginator {
    pub fn new(count: u64, per_page: u32) -> Self {
        Paginator {
            count,
            per_page: per_page.max(1),
        }
    }

    /// Number of pages; an empty collection still has one (empty) page.
    pub fn num_pages(&self) -> u32 {
        if self.count == 0 {
            return 1;
        }
        self.count.div_ceil(self.per_page as u64) as u32
    }

    /// Turn a raw `page` query value into a valid page number.
    /// Missing or non-numeric values give page 1; numbers outside `1..=num_pages` give the last page.
    pub fn resolve(&self, raw: Option<&str>) -> u32 {
        let parsed = match raw.map(str::trim).filter(|s| !s.is_empty()) {
            None => return 1,
            Some(s) => s.parse::<i64>(),
        };
        match parsed {
            Err(_) => 1,
            Ok(n) if n >= 1 && n <= self.num_pages() as i64 => n as u32,
            Ok(_) => self.num_pages(),
        }
    }

    pub fn window(&self, number: u32) -> PageWindow {
        PageWindow {
            offset: (number.max(1) as u64 - 1) * self.per_page as u64,
            limit: self.per_page,
        }
    }

    pub fn page<T>(&self, number: u32, items: Vec<T>) -> Page<T> {
        let num_pages = self.num_pages();
        let has_next = number < num_pages;
        let has_previous = number > 1;
        let (start_index, end_index) = if self.count == 0 {
            (0, 0)
        } else {
            let start = self.window(number).offset + 1;
            (start, start + items.len() as u64 - 1)
        };
        Page {
            items,
            meta: PageMeta {
                number,
                num_pages,
                per_page: self.per_page,
                count: self.count,
                has_next,
                has_previous,
                next_page_number: has_next.then(|| number + 1),
                previous_page_number: has_previous.then(|| number - 1),
                start_index,
                end_index,
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PageMeta {
    pub number: u32,
    pub num_pages: u32,
    pub per_page: u32,
    pub count: u64,
    pub has_next: bool,
    pub has_previous: bool,
    pub next_page_number: Option<u32>,
    pub previous_page_number: Option<u32>,
    /// 1-based index of the first item on the page (0 when empty).
    pub start_index: u64,
    pub end_index: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub meta: PageMeta,
}
