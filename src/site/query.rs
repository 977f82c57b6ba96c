//! Page queries shared by [`Site::pages`](super::Site::pages) and the
//! `site.pages(...)` template method.
//!
//! ```text
//! pages ──► path prefix ──► tag ──► sort (order) ──► limit
//! ```

use super::page::Page;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("unknown sort key `{0}` (expected one of: title, date, slug, url, filepath)")]
    UnknownSortKey(String),
}

/// Page field a query can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Title,
    Date,
    Slug,
    Url,
    Filepath,
}

impl SortKey {
    /// Value compared for a page. Absent metadata sorts first.
    fn value(self, page: &Page) -> Option<&str> {
        match self {
            Self::Title => page.title.as_deref(),
            Self::Date => page.date.as_deref(),
            Self::Slug => Some(&page.slug),
            Self::Url => Some(&page.url),
            Self::Filepath => Some(&page.filepath),
        }
    }
}

impl FromStr for SortKey {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "title" => Ok(Self::Title),
            "date" => Ok(Self::Date),
            "slug" => Ok(Self::Slug),
            "url" => Ok(Self::Url),
            "filepath" => Ok(Self::Filepath),
            other => Err(QueryError::UnknownSortKey(other.to_owned())),
        }
    }
}

/// Sort key plus direction; `-date` is newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Order {
    pub key: SortKey,
    pub descending: bool,
}

impl FromStr for Order {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (descending, key) = match s.strip_prefix('-') {
            Some(key) => (true, key),
            None => (false, s),
        };
        Ok(Self {
            key: key.parse()?,
            descending,
        })
    }
}

impl Order {
    fn compare(self, a: &Page, b: &Page) -> Ordering {
        let ordering = self.key.value(a).cmp(&self.key.value(b));
        if self.descending {
            ordering.reverse()
        } else {
            ordering
        }
    }
}

/// Filter, sort and limit options for a page query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageQuery {
    /// Filepath prefix, matched as a plain string (`"articles/"`).
    pub path: Option<String>,
    /// Exact tag match.
    pub tag: Option<String>,
    /// Maximum number of results; `0` means no limit.
    pub limit: usize,
    /// Sort key, `-` prefixed for descending.
    pub order: Option<String>,
}

impl PageQuery {
    /// Select matching pages. Sorting is stable, so pages that compare equal
    /// keep their index order.
    pub fn select<'a, I>(&self, pages: I) -> Result<Vec<&'a Page>, QueryError>
    where
        I: IntoIterator<Item = &'a Page>,
    {
        let order = self.order.as_deref().map(Order::from_str).transpose()?;

        let mut items: Vec<&Page> = pages
            .into_iter()
            .filter(|page| {
                self.path
                    .as_deref()
                    .is_none_or(|path| page.filepath.starts_with(path))
            })
            .filter(|page| {
                self.tag
                    .as_deref()
                    .is_none_or(|tag| page.tags.iter().any(|t| t == tag))
            })
            .collect();

        if let Some(order) = order {
            items.sort_by(|a, b| order.compare(a, b));
        }
        if self.limit > 0 {
            items.truncate(self.limit);
        }
        Ok(items)
    }
}

/// Sorted, de-duplicated union of all page tags.
pub fn collect_tags<'a, I>(pages: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a Page>,
{
    pages
        .into_iter()
        .flat_map(|page| page.tags.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
