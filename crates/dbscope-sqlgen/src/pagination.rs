//! Count-query derivation and page metadata.
//!
//! Given a filtered SELECT a caller already built (WHERE/GROUP BY/ORDER BY
//! applied), [`count_query`] rewrites it into the matching row-count query
//! so the caller's bound values can be reused unchanged, and
//! [`page_info`] derives the page metadata from the resulting total.
//!
//! The rewrite anchors on keywords located by the top-level scanner, never
//! on raw substring positions, so clauses inside subqueries, string
//! literals, and comments are left alone.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::scan::{contains_keyword, find_first, find_keyword};

/// A validated page number and page size.
///
/// Coercion policy: zero and negative inputs clamp to the defaults
/// (`page = 1`, `page_size = 20`). Centralizing the coercion here makes
/// the divide-by-zero guard in [`page_info`] structural; a `PageRequest`
/// can never carry a zero page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
   page: u64,
   pub(crate) page_size: u64,
}

impl PageRequest {
   pub const DEFAULT_PAGE: u64 = 1;
   pub const DEFAULT_PAGE_SIZE: u64 = 20;

   /// Build a request, clamping out-of-range inputs to the defaults.
   pub fn new(page: i64, page_size: i64) -> Self {
      Self {
         page: if page >= 1 {
            page as u64
         } else {
            Self::DEFAULT_PAGE
         },
         page_size: if page_size >= 1 {
            page_size as u64
         } else {
            Self::DEFAULT_PAGE_SIZE
         },
      }
   }

   pub fn page(self) -> u64 {
      self.page
   }

   pub fn page_size(self) -> u64 {
      self.page_size
   }

   /// Row offset of the first row on this page.
   pub fn offset(self) -> u64 {
      (self.page - 1) * self.page_size
   }
}

impl Default for PageRequest {
   fn default() -> Self {
      Self {
         page: Self::DEFAULT_PAGE,
         page_size: Self::DEFAULT_PAGE_SIZE,
      }
   }
}

/// Derived page metadata. Pure value, recomputed per call, never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
   pub page: u64,
   pub per_page: u64,
   pub total_pages: u64,
   pub total: u64,
   pub has_next: bool,
   pub has_prev: bool,
   pub next_page: Option<u64>,
   pub prev_page: Option<u64>,
}

/// Derive page metadata from a row count.
///
/// `total_pages` is `ceil(total / page_size)`; a total of zero yields zero
/// pages and no next page.
pub fn page_info(total: u64, request: PageRequest) -> PageInfo {
   let page = request.page();
   let per_page = request.page_size();
   let total_pages = total.div_ceil(per_page);
   let has_next = page < total_pages;
   let has_prev = page > 1;

   PageInfo {
      page,
      per_page,
      total_pages,
      total,
      has_next,
      has_prev,
      next_page: has_next.then(|| page + 1),
      prev_page: has_prev.then(|| page - 1),
   }
}

/// Remove everything from the first top-level ORDER BY or LIMIT onward.
///
/// Those clauses are irrelevant to a row count and would corrupt it;
/// occurrences inside subqueries, literals, and comments are preserved.
pub fn strip_trailing_clauses(statement: &str) -> String {
   let mut sql = statement;
   if let Some((pos, _)) = find_first(sql, &["ORDER BY", "LIMIT"]) {
      sql = &sql[..pos];
   }
   sql.trim_end().to_string()
}

/// Derive the row-count query for an arbitrary filtered SELECT.
///
/// After stripping trailing ORDER BY/LIMIT:
///
/// - statements with a top-level GROUP BY are wrapped as
///   `SELECT COUNT(*) AS total FROM (<statement>) AS derived`, because
///   grouped rows must be counted, not summed;
/// - otherwise the projection up to and including the first top-level
///   FROM is replaced with `SELECT COUNT(*) AS total FROM`. A FROM inside
///   a subquery in the projection is not an anchor.
///
/// The rewritten query uses the same bound values as the original, so
/// filters still apply to the count.
pub fn count_query(statement: &str) -> Result<String> {
   let stripped = strip_trailing_clauses(statement);

   if contains_keyword(&stripped, "GROUP BY") {
      return Ok(format!("SELECT COUNT(*) AS total FROM ({stripped}) AS derived"));
   }

   let from = find_keyword(&stripped, "FROM").ok_or(Error::MissingFrom)?;
   let after_from = &stripped[from + "FROM".len()..];
   Ok(format!("SELECT COUNT(*) AS total FROM{after_from}"))
}
