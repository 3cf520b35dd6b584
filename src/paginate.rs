//! Splitting the catalog into pages and display groups.
//!
//! ```text
//! 45 books, page_size = 20
//!
//! index1.html   20 books   10 groups   prev: (none)       next: index2.html
//! index2.html   20 books   10 groups   prev: index1.html  next: index3.html
//! index3.html    5 books    3 groups   prev: index2.html  next: (none)
//! ```
//!
//! Pages borrow the book slice they were cut from, so a full pagination is
//! just a handful of slice references. Nothing here reorders: flattening
//! every group of every page yields the input sequence.

use serde::{Serialize, Serializer};
use std::num::NonZeroUsize;

/// File name prefix of every page.
pub const PAGE_PREFIX: &str = "index";
/// File extension of every page.
pub const PAGE_EXTENSION: &str = "html";
/// Books laid out side by side on a page.
pub const GROUP_SIZE: usize = 2;

/// Reference to a page by its 1-based number.
///
/// Serializes as the page's file name, which is what templates link to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageRef(usize);

impl PageRef {
    pub fn new(number: usize) -> Self {
        Self(number)
    }

    pub fn number(self) -> usize {
        self.0
    }

    /// `index<N>.html`
    pub fn file_name(self) -> String {
        format!("{PAGE_PREFIX}{}.{PAGE_EXTENSION}", self.0)
    }
}

impl Serialize for PageRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.file_name())
    }
}

/// One page of the paginated catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<'a, T> {
    /// 1-based position.
    pub number: usize,
    pub total_pages: usize,
    /// The page's items in groups of [`GROUP_SIZE`]; the last group holds a
    /// single item when the page's item count is odd.
    pub groups: Vec<&'a [T]>,
    pub previous: Option<PageRef>,
    pub next: Option<PageRef>,
}

impl<'a, T> Page<'a, T> {
    pub fn page_ref(&self) -> PageRef {
        PageRef::new(self.number)
    }

    pub fn file_name(&self) -> String {
        self.page_ref().file_name()
    }

    pub fn items(&self) -> impl Iterator<Item = &'a T> + '_ {
        self.groups.iter().copied().flatten()
    }

    pub fn item_count(&self) -> usize {
        self.groups.iter().map(|group| group.len()).sum()
    }
}

/// Number of pages needed for `item_count` items.
pub fn page_count(item_count: usize, page_size: NonZeroUsize) -> usize {
    item_count.div_ceil(page_size.get())
}

/// Split `items` into pages of `page_size`, each further split into groups.
///
/// An empty slice gives no pages at all.
pub fn paginate<T>(items: &[T], page_size: NonZeroUsize) -> Vec<Page<'_, T>> {
    let total_pages = page_count(items.len(), page_size);
    items
        .chunks(page_size.get())
        .enumerate()
        .map(|(idx, chunk)| {
            let number = idx + 1;
            Page {
                number,
                total_pages,
                groups: chunk.chunks(GROUP_SIZE).collect(),
                previous: (number > 1).then(|| PageRef::new(number - 1)),
                next: (number < total_pages).then(|| PageRef::new(number + 1)),
            }
        })
        .collect()
}
