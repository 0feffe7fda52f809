//! Top-level SQL clause scanner.
//!
//! The count-query rewriter needs to locate clause keywords (`FROM`,
//! `GROUP BY`, `ORDER BY`, `LIMIT`) in a caller-supplied SELECT without
//! parsing it. A plain substring search would match keywords inside
//! subqueries, string literals, quoted identifiers, and comments, so the
//! scanner walks the statement byte-by-byte tracking parenthesis depth and
//! skipping quoted and commented regions. Only matches at depth zero count.
//!
//! SQL keywords are ASCII, so the scanner compares against an
//! ASCII-uppercased copy of the statement; byte positions in the copy are
//! valid positions in the original.

/// True when `keyword` appears at `pos` in `bytes` as a standalone word,
/// i.e. not butted against identifier characters on either side. A space
/// in the keyword matches any run of whitespace, so `ORDER   BY` and
/// `ORDER\nBY` both count as `ORDER BY`.
fn keyword_at(bytes: &[u8], pos: usize, keyword: &[u8]) -> bool {
   let boundary = |b: u8| !b.is_ascii_alphanumeric() && b != b'_';
   if pos > 0 && !boundary(bytes[pos - 1]) {
      return false;
   }

   let mut i = pos;
   for &k in keyword {
      if k == b' ' {
         let run = i;
         while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
         }
         if i == run {
            return false;
         }
      } else {
         if i >= bytes.len() || bytes[i] != k {
            return false;
         }
         i += 1;
      }
   }

   i == bytes.len() || boundary(bytes[i])
}

/// Index just past a quoted region opened by `quote` at `start`, honoring
/// SQL-standard doubled-quote escapes (`''` / `""`). Unterminated regions
/// run to the end of the statement.
fn end_of_quoted(bytes: &[u8], start: usize, quote: u8) -> usize {
   let mut i = start + 1;
   while i < bytes.len() {
      if bytes[i] == quote {
         if i + 1 < bytes.len() && bytes[i + 1] == quote {
            i += 2; // escaped quote, still inside
            continue;
         }
         return i + 1;
      }
      i += 1;
   }
   bytes.len()
}

/// Index just past a comment starting at `start` (`--` to end of line, or
/// `/* ... */`).
fn end_of_comment(bytes: &[u8], start: usize) -> usize {
   if bytes[start] == b'-' {
      let mut i = start + 2;
      while i < bytes.len() && bytes[i] != b'\n' {
         i += 1;
      }
      return i;
   }
   let mut i = start + 2;
   while i + 1 < bytes.len() {
      if bytes[i] == b'*' && bytes[i + 1] == b'/' {
         return i + 2;
      }
      i += 1;
   }
   bytes.len()
}

/// Find the earliest top-level standalone occurrence of any of `keywords`
/// (ASCII-uppercase, e.g. `"ORDER BY"`). Returns the byte position and the
/// index of the keyword that matched.
pub(crate) fn find_first(statement: &str, keywords: &[&str]) -> Option<(usize, usize)> {
   let upper = statement.to_ascii_uppercase();
   let bytes = upper.as_bytes();
   let mut depth: i32 = 0;
   let mut i = 0;

   while i < bytes.len() {
      match bytes[i] {
         b'(' => depth += 1,
         b')' => depth -= 1,
         b'\'' | b'"' => {
            i = end_of_quoted(bytes, i, bytes[i]);
            continue;
         }
         b'-' if bytes.get(i + 1) == Some(&b'-') => {
            i = end_of_comment(bytes, i);
            continue;
         }
         b'/' if bytes.get(i + 1) == Some(&b'*') => {
            i = end_of_comment(bytes, i);
            continue;
         }
         _ if depth == 0 => {
            for (k, keyword) in keywords.iter().enumerate() {
               if keyword_at(bytes, i, keyword.as_bytes()) {
                  return Some((i, k));
               }
            }
         }
         _ => {}
      }
      i += 1;
   }

   None
}

/// Position of the first top-level occurrence of a single keyword.
pub(crate) fn find_keyword(statement: &str, keyword: &str) -> Option<usize> {
   find_first(statement, &[keyword]).map(|(pos, _)| pos)
}

/// Whether a keyword occurs anywhere at the top level of the statement.
pub(crate) fn contains_keyword(statement: &str, keyword: &str) -> bool {
   find_keyword(statement, keyword).is_some()
}
