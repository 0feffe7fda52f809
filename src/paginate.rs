//! Paginated-query execution.
//!
//! Ties the pure count-query rewrite from `dbscope-sqlgen` to a live
//! connection scope: derive the count statement, run it with the caller's
//! original bound values (so the filters still apply to the count), read
//! the `total` column, and fold the result into [`PageInfo`].

use serde_json::Value as JsonValue;

use crate::error::{Error, Result};
use dbscope_conn_mgr::{BlockingConnectionScope, ConnectionScope, Row};
use dbscope_sqlgen::{PageInfo, PageRequest, count_query, page_info, strip_trailing_clauses};

/// Pick the statement to run for the row count.
///
/// With `want_count` the caller's SELECT is rewritten into a count query.
/// Without it the caller's statement must itself project a `total` column
/// and is only stripped of trailing ORDER BY/LIMIT.
fn counting_statement(statement: &str, want_count: bool) -> Result<String> {
   if want_count {
      Ok(count_query(statement)?)
   } else {
      Ok(strip_trailing_clauses(statement))
   }
}

/// Read the `total` column out of the count query's first row.
fn total_from(row: Option<Row>) -> Result<u64> {
   row.as_ref()
      .and_then(|row| row.get("total"))
      .and_then(JsonValue::as_u64)
      .ok_or(Error::MissingTotal)
}

/// Compute page metadata for an arbitrary filtered SELECT.
///
/// `values` must be the bound values of `statement`, unchanged; they are
/// reused for the derived count query. The scope must already be
/// acquired, and is subject to the usual fail-fast contract: a failure of
/// the count statement rolls the scope back and closes it.
pub async fn paginate(
   scope: &mut ConnectionScope,
   statement: &str,
   values: &[JsonValue],
   request: PageRequest,
   want_count: bool,
) -> Result<PageInfo> {
   let sql = counting_statement(statement, want_count)?;
   scope.execute(&sql, values).await?;
   let total = total_from(scope.fetch_one().await?)?;
   Ok(page_info(total, request))
}

/// Blocking twin of [`paginate`].
pub fn paginate_blocking(
   scope: &mut BlockingConnectionScope,
   statement: &str,
   values: &[JsonValue],
   request: PageRequest,
   want_count: bool,
) -> Result<PageInfo> {
   let sql = counting_statement(statement, want_count)?;
   scope.execute(&sql, values)?;
   let total = total_from(scope.fetch_one()?)?;
   Ok(page_info(total, request))
}

#[cfg(test)]
mod tests {
   use super::*;
   use serde_json::json;

   #[test]
   fn counting_statement_rewrites_when_count_is_wanted() {
      let sql = counting_statement("SELECT id FROM t WHERE a = ? ORDER BY id", true).unwrap();
      assert_eq!(sql, "SELECT COUNT(*) AS total FROM t WHERE a = ?");
   }

   #[test]
   fn counting_statement_only_strips_otherwise() {
      let sql =
         counting_statement("SELECT COUNT(*) AS total FROM t WHERE a = ? LIMIT 5", false)
            .unwrap();
      assert_eq!(sql, "SELECT COUNT(*) AS total FROM t WHERE a = ?");
   }

   #[test]
   fn total_requires_a_numeric_total_column() {
      assert!(matches!(total_from(None), Err(Error::MissingTotal)));

      let mut row = Row::default();
      row.insert("count".into(), json!(3));
      assert!(matches!(total_from(Some(row)), Err(Error::MissingTotal)));

      let mut row = Row::default();
      row.insert("total".into(), json!("45"));
      assert!(matches!(total_from(Some(row)), Err(Error::MissingTotal)));

      let mut row = Row::default();
      row.insert("total".into(), json!(45));
      assert_eq!(total_from(Some(row)).unwrap(), 45);
   }
}
