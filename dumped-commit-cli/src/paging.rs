// SPDX-FileCopyrightText: 2024 Mathieu Fenniak <mathieu@fenniak.net>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use anyhow::Result;
use log::trace;

/// One chunk of results from a [`PagedSource`], plus the token needed to request the chunk after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_page_token: Option<String>,
}

impl<T> Page<T> {
    #[must_use]
    pub fn last(items: Vec<T>) -> Self {
        Page {
            items,
            next_page_token: None,
        }
    }
}

/// An external data provider that yields results in bounded-size chunks with a continuation marker.
///
/// A `next_page_token` of `None` (or an empty string, which some APIs return in place of omitting the field) marks
/// the final page.
#[allow(async_fn_in_trait)] // only used internally with concrete types; no need for Send bounds
pub trait PagedSource {
    type Item;

    async fn fetch_page(&self, page_token: Option<&str>) -> Result<Page<Self::Item>>;
}

#[derive(Debug)]
enum Cursor {
    Start,
    Continue(String),
    Exhausted,
}

/// Walks a [`PagedSource`] forward one page at a time.  Pages are requested in server order and never re-requested.
pub struct Pager<S> {
    source: S,
    cursor: Cursor,
    pages_fetched: usize,
}

impl<S: PagedSource> Pager<S> {
    #[must_use]
    pub fn new(source: S) -> Self {
        Pager {
            source,
            cursor: Cursor::Start,
            pages_fetched: 0,
        }
    }

    /// Fetch the next page's items, or `None` if the previous page was the last one.
    pub async fn next_page(&mut self) -> Result<Option<Vec<S::Item>>> {
        let page_token = match &self.cursor {
            Cursor::Exhausted => return Ok(None),
            Cursor::Start => None,
            Cursor::Continue(token) => Some(token.as_str()),
        };

        let page = self.source.fetch_page(page_token).await?;
        self.pages_fetched += 1;
        self.cursor = match page.next_page_token {
            Some(token) if !token.is_empty() => Cursor::Continue(token),
            _ => Cursor::Exhausted,
        };
        trace!(
            "fetched page {} with {} items; cursor now {:?}",
            self.pages_fetched,
            page.items.len(),
            self.cursor
        );

        Ok(Some(page.items))
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        matches!(self.cursor, Cursor::Exhausted)
    }

    #[must_use]
    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    #[cfg(test)]
    fn source(&self) -> &S {
        &self.source
    }
}
