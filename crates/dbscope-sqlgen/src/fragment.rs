//! SQL fragment builders.
//!
//! Generators for the repetitive parts of request-driven SQL: WHERE
//! predicates from permitted filter fields, UPDATE statements from
//! field maps, and LIMIT/OFFSET clauses from page requests. Each builder
//! returns the SQL text together with the bound values in placeholder
//! emission order; values are never interpolated into the text.
//!
//! Identifier names (tables, columns, keys) come from the caller, not from
//! request data, but they are still validated before interpolation as
//! defense against injection through misuse.

use indexmap::IndexMap;
use serde_json::Value as JsonValue;

use crate::error::{Error, Result};
use crate::pagination::PageRequest;

/// Positional-placeholder syntax of the underlying driver.
///
/// Placeholder syntax is a property of the database driver, so every
/// generator takes the style as a parameter rather than assuming one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaceholderStyle {
   /// Bare `?` placeholders (MySQL, SQLite).
   #[default]
   Question,
   /// Numbered `$1`, `$2`, … placeholders (PostgreSQL).
   Numbered,
}

impl PlaceholderStyle {
   /// Emit the placeholder for the 1-based bind position `index`.
   pub fn emit(self, index: usize) -> String {
      match self {
         PlaceholderStyle::Question => "?".to_string(),
         PlaceholderStyle::Numbered => format!("${index}"),
      }
   }
}

/// A composable piece of a SQL statement plus its bound values.
///
/// `values` is positionally aligned with the placeholders in `sql`; the
/// order is significant and matches placeholder emission order exactly.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
   pub sql: String,
   pub values: Vec<JsonValue>,
}

/// Validate that an identifier is safe for SQL interpolation.
///
/// Accepts `[a-zA-Z_][a-zA-Z0-9_.]*`: plain names, underscored names, and
/// dot-qualified names like `table.column`.
pub fn validate_identifier(name: &str) -> Result<()> {
   let mut chars = name.chars();
   let valid_first = chars
      .next()
      .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');

   if !valid_first || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.') {
      return Err(Error::InvalidIdentifier {
         name: name.to_string(),
      });
   }
   Ok(())
}

/// Whether a request value counts as "absent" for optional filters.
///
/// Null, `false`, numeric zero, and empty strings/arrays/objects are all
/// treated as not-provided; the corresponding filter field is skipped
/// rather than matched against.
fn is_absent(value: &JsonValue) -> bool {
   match value {
      JsonValue::Null => true,
      JsonValue::Bool(b) => !b,
      JsonValue::Number(n) => n.as_f64().is_some_and(|f| f == 0.0),
      JsonValue::String(s) => s.is_empty(),
      JsonValue::Array(a) => a.is_empty(),
      JsonValue::Object(o) => o.is_empty(),
   }
}

/// How a filter field is matched against its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MatchMode {
   Exact,
   Like,
}

fn build_where(
   allowed_fields: &[&str],
   data: &IndexMap<String, JsonValue>,
   style: PlaceholderStyle,
   mode: MatchMode,
) -> Result<Fragment> {
   // Leading always-true predicate keeps the fragment composable with AND
   // and guarantees the bound list is never empty.
   let mut sql = format!(" WHERE 1 = {}", style.emit(1));
   let mut values = vec![JsonValue::from(1)];

   for field in allowed_fields {
      validate_identifier(field)?;
      let Some(value) = data.get(*field) else {
         continue;
      };
      if is_absent(value) {
         continue;
      }

      let placeholder = style.emit(values.len() + 1);
      match mode {
         MatchMode::Exact => {
            sql.push_str(&format!(" AND {field} = {placeholder}"));
            values.push(value.clone());
         }
         MatchMode::Like => {
            sql.push_str(&format!(" AND {field} LIKE {placeholder}"));
            values.push(JsonValue::from(like_pattern(value)));
         }
      }
   }

   sql.push(' ');
   Ok(Fragment { sql, values })
}

/// Build a WHERE predicate matching each permitted field exactly.
///
/// Fields absent from `data`, or present with an absent-like value, are
/// skipped entirely; this is the optional-filter semantic, not an error.
/// Values are appended in `allowed_fields` declaration order.
pub fn where_exact(
   allowed_fields: &[&str],
   data: &IndexMap<String, JsonValue>,
   style: PlaceholderStyle,
) -> Result<Fragment> {
   build_where(allowed_fields, data, style, MatchMode::Exact)
}

/// Build a WHERE predicate matching each permitted field with LIKE.
///
/// Values are wrapped in a single `%` wildcard per side.
pub fn where_like(
   allowed_fields: &[&str],
   data: &IndexMap<String, JsonValue>,
   style: PlaceholderStyle,
) -> Result<Fragment> {
   build_where(allowed_fields, data, style, MatchMode::Like)
}

/// Wrap a filter value in LIKE wildcards, one `%` per side.
fn like_pattern(value: &JsonValue) -> String {
   match value {
      JsonValue::String(s) => format!("%{s}%"),
      other => format!("%{other}%"),
   }
}

/// Build an UPDATE statement for a single row identified by its key.
///
/// Emits `UPDATE table SET f1 = ?, f2 = ?, … WHERE key_field = ?` with
/// bound values in field-iteration order followed by the key value last.
/// `fields` must be non-empty; an empty map is an [`Error::EmptyUpdate`]
/// rather than a syntactically broken statement.
pub fn update(
   table: &str,
   key_field: &str,
   key_value: JsonValue,
   fields: &IndexMap<String, JsonValue>,
   style: PlaceholderStyle,
) -> Result<Fragment> {
   if fields.is_empty() {
      return Err(Error::EmptyUpdate);
   }
   validate_identifier(table)?;
   validate_identifier(key_field)?;

   let mut assignments = Vec::with_capacity(fields.len());
   let mut values = Vec::with_capacity(fields.len() + 1);

   for (field, value) in fields {
      validate_identifier(field)?;
      assignments.push(format!("{field} = {}", style.emit(values.len() + 1)));
      values.push(value.clone());
   }

   let sql = format!(
      " UPDATE {table} SET {} WHERE {key_field} = {} ",
      assignments.join(", "),
      style.emit(values.len() + 1),
   );
   values.push(key_value);

   Ok(Fragment { sql, values })
}

/// Build a LIMIT/OFFSET clause from a page request.
///
/// The offset is `(page - 1) * page_size`; [`PageRequest`] coercion
/// guarantees both factors are at least 1, so the offset is never negative.
pub fn limit(request: PageRequest) -> String {
   format!(" LIMIT {} OFFSET {} ", request.page_size, request.offset())
}

#[cfg(test)]
mod tests {
   use super::*;
   use serde_json::json;

   fn data(pairs: &[(&str, JsonValue)]) -> IndexMap<String, JsonValue> {
      pairs
         .iter()
         .map(|(k, v)| (k.to_string(), v.clone()))
         .collect()
   }

   // ─── where_exact ───

   #[test]
   fn where_with_no_data_is_always_true() {
      let frag = where_exact(&["name"], &data(&[]), PlaceholderStyle::Question).unwrap();
      assert_eq!(frag.sql, " WHERE 1 = ? ");
      assert_eq!(frag.values, vec![json!(1)]);
   }

   #[test]
   fn where_appends_present_fields_in_declaration_order() {
      let d = data(&[
         ("status", json!("active")),
         ("name", json!("alice")),
         ("ignored", json!("x")),
      ]);
      let frag =
         where_exact(&["name", "status"], &d, PlaceholderStyle::Question).unwrap();

      assert_eq!(frag.sql, " WHERE 1 = ? AND name = ? AND status = ? ");
      // Declaration order of allowed_fields, not insertion order of data
      assert_eq!(frag.values, vec![json!(1), json!("alice"), json!("active")]);
   }

   #[test]
   fn where_skips_absent_like_values() {
      let d = data(&[
         ("a", json!("")),
         ("b", JsonValue::Null),
         ("c", json!(0)),
         ("d", json!(false)),
         ("e", json!("kept")),
      ]);
      let frag =
         where_exact(&["a", "b", "c", "d", "e"], &d, PlaceholderStyle::Question).unwrap();

      assert_eq!(frag.sql, " WHERE 1 = ? AND e = ? ");
      assert_eq!(frag.values, vec![json!(1), json!("kept")]);
   }

   #[test]
   fn where_first_bound_value_is_always_one() {
      let d = data(&[("x", json!(7))]);
      let frag = where_exact(&["x"], &d, PlaceholderStyle::Question).unwrap();
      assert_eq!(frag.values[0], json!(1));
   }

   #[test]
   fn where_numbered_placeholders_count_up() {
      let d = data(&[("a", json!(1)), ("b", json!(2))]);
      let frag = where_exact(&["a", "b"], &d, PlaceholderStyle::Numbered).unwrap();
      assert_eq!(frag.sql, " WHERE 1 = $1 AND a = $2 AND b = $3 ");
   }

   #[test]
   fn where_rejects_injection_in_field_name() {
      let d = data(&[]);
      let result = where_exact(&["id; DROP TABLE t --"], &d, PlaceholderStyle::Question);
      assert!(matches!(result, Err(Error::InvalidIdentifier { .. })));
   }

   // ─── where_like ───

   #[test]
   fn like_wraps_value_in_single_wildcards() {
      let d = data(&[("name", json!("ali"))]);
      let frag = where_like(&["name"], &d, PlaceholderStyle::Question).unwrap();

      assert_eq!(frag.sql, " WHERE 1 = ? AND name LIKE ? ");
      assert_eq!(frag.values, vec![json!(1), json!("%ali%")]);
   }

   #[test]
   fn like_stringifies_non_string_values() {
      let d = data(&[("code", json!(42))]);
      let frag = where_like(&["code"], &d, PlaceholderStyle::Question).unwrap();
      assert_eq!(frag.values[1], json!("%42%"));
   }

   // ─── update ───

   #[test]
   fn update_emits_fields_then_key_last() {
      let fields = data(&[("name", json!("bob")), ("age", json!(30))]);
      let frag = update("users", "id", json!(7), &fields, PlaceholderStyle::Question).unwrap();

      assert_eq!(frag.sql, " UPDATE users SET name = ?, age = ? WHERE id = ? ");
      assert_eq!(frag.values, vec![json!("bob"), json!(30), json!(7)]);
   }

   #[test]
   fn update_numbered_placeholders() {
      let fields = data(&[("name", json!("bob"))]);
      let frag = update("users", "id", json!(7), &fields, PlaceholderStyle::Numbered).unwrap();
      assert_eq!(frag.sql, " UPDATE users SET name = $1 WHERE id = $2 ");
   }

   #[test]
   fn update_rejects_empty_field_map() {
      let result = update("users", "id", json!(7), &data(&[]), PlaceholderStyle::Question);
      assert!(matches!(result, Err(Error::EmptyUpdate)));
   }

   #[test]
   fn update_rejects_bad_table_name() {
      let fields = data(&[("name", json!("bob"))]);
      let result = update(
         "users; DROP TABLE users",
         "id",
         json!(7),
         &fields,
         PlaceholderStyle::Question,
      );
      assert!(matches!(result, Err(Error::InvalidIdentifier { .. })));
   }

   #[test]
   fn update_accepts_qualified_table_name() {
      let fields = data(&[("name", json!("bob"))]);
      assert!(update("app.users", "id", json!(7), &fields, PlaceholderStyle::Question).is_ok());
   }

   // ─── limit ───

   #[test]
   fn limit_offset_is_page_minus_one_times_size() {
      assert_eq!(limit(PageRequest::new(3, 20)), " LIMIT 20 OFFSET 40 ");
   }

   #[test]
   fn limit_first_page_has_zero_offset() {
      assert_eq!(limit(PageRequest::new(1, 10)), " LIMIT 10 OFFSET 0 ");
   }

   #[test]
   fn limit_never_produces_negative_offset() {
      // page 0 and negative pages clamp before the offset computation
      assert_eq!(limit(PageRequest::new(0, 10)), " LIMIT 10 OFFSET 0 ");
      assert_eq!(limit(PageRequest::new(-4, 10)), " LIMIT 10 OFFSET 0 ");
   }

   // ─── validate_identifier ───

   #[test]
   fn identifier_accepts_plain_and_qualified_names() {
      assert!(validate_identifier("id").is_ok());
      assert!(validate_identifier("_private").is_ok());
      assert!(validate_identifier("col_123").is_ok());
      assert!(validate_identifier("posts.id").is_ok());
   }

   #[test]
   fn identifier_rejects_empty_and_hostile_names() {
      assert!(validate_identifier("").is_err());
      assert!(validate_identifier("1bad").is_err());
      assert!(validate_identifier("col name").is_err());
      assert!(validate_identifier("id)--").is_err());
   }
}
