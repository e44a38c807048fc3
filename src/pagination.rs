//! Pagination
//!
//! Wraps a composed query into one page of results plus metadata. A page is
//! built once and never changes: either empty (no query) or populated at
//! construction with one count pass and one fetch.

use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::executor::Query;
use crate::registry::EngineError;

/// Page size: a positive limit or the `"all"` sentinel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLimit {
    /// No slicing; every matching row in one page
    All,
    /// At most this many rows per page
    Per(usize),
}

impl Serialize for PageLimit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PageLimit::All => serializer.serialize_str("all"),
            PageLimit::Per(limit) => serializer.serialize_u64(*limit as u64),
        }
    }
}

impl<'de> Deserialize<'de> for PageLimit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct LimitVisitor;

        impl<'de> Visitor<'de> for LimitVisitor {
            type Value = PageLimit;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "a positive integer or \"all\"")
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<PageLimit, E> {
                if value == 0 {
                    return Err(E::custom("limit_per_page must be positive"));
                }
                Ok(PageLimit::Per(value as usize))
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<PageLimit, E> {
                if value <= 0 {
                    return Err(E::custom("limit_per_page must be positive"));
                }
                Ok(PageLimit::Per(value as usize))
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<PageLimit, E> {
                if value.eq_ignore_ascii_case("all") {
                    Ok(PageLimit::All)
                } else {
                    Err(E::custom(format!("invalid limit_per_page: {value}")))
                }
            }
        }

        deserializer.deserialize_any(LimitVisitor)
    }
}

/// One page of results
#[derive(Debug, Clone, Serialize)]
pub struct Page {
    /// 1-indexed page number
    pub page: usize,
    /// Requested page size
    pub limit_per_page: PageLimit,
    /// Total matching rows, independent of the slice
    pub total_count: u64,
    /// Rows of this page, in query order
    pub items: Vec<Value>,
}

impl Page {
    /// The empty page: no query, no results, page 1
    pub fn empty(limit_per_page: PageLimit) -> Self {
        Self {
            page: 1,
            limit_per_page,
            total_count: 0,
            items: Vec::new(),
        }
    }

    /// Builds a page from a composed query.
    ///
    /// With a concrete limit this issues exactly one count (with ordering
    /// ignored) before the sliced fetch; a page past the end comes back with
    /// no items and the correct total. With `All`, one unsliced fetch and
    /// the total is the number of items fetched.
    pub fn fetch(query: Query, page: usize, limit_per_page: PageLimit) -> Result<Self, EngineError> {
        let page = page.max(1);
        match limit_per_page {
            PageLimit::All => {
                let items = query.all()?;
                Ok(Self {
                    page,
                    limit_per_page,
                    total_count: items.len() as u64,
                    items,
                })
            }
            PageLimit::Per(limit) => {
                let total_count = query.count()?;
                let end = page * limit;
                let items = query.slice(end - limit, end).all()?;
                Ok(Self {
                    page,
                    limit_per_page,
                    total_count,
                    items,
                })
            }
        }
    }

    /// Rows on this page
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether this page has no rows
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The last page number for this total and limit, at least 1
    pub fn last_page(&self) -> usize {
        match self.limit_per_page {
            PageLimit::All => 1,
            PageLimit::Per(limit) => {
                let pages = (self.total_count as usize).div_ceil(limit);
                pages.max(1)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_page() {
        let page = Page::empty(PageLimit::Per(20));
        assert_eq!(page.page, 1);
        assert_eq!(page.total_count, 0);
        assert!(page.is_empty());
        assert_eq!(page.last_page(), 1);
    }

    #[test]
    fn test_limit_serde() {
        assert_eq!(serde_json::to_value(PageLimit::All).unwrap(), json!("all"));
        assert_eq!(serde_json::to_value(PageLimit::Per(20)).unwrap(), json!(20));

        let all: PageLimit = serde_json::from_value(json!("all")).unwrap();
        assert_eq!(all, PageLimit::All);
        let per: PageLimit = serde_json::from_value(json!(7)).unwrap();
        assert_eq!(per, PageLimit::Per(7));
        assert!(serde_json::from_value::<PageLimit>(json!(0)).is_err());
        assert!(serde_json::from_value::<PageLimit>(json!("some")).is_err());
    }

    #[test]
    fn test_last_page_rounding() {
        let mut page = Page::empty(PageLimit::Per(20));
        page.total_count = 47;
        assert_eq!(page.last_page(), 3);
        page.total_count = 40;
        assert_eq!(page.last_page(), 2);
    }
}
