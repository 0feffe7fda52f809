//! # dbscope-sqlgen
//!
//! Pure SQL generation for the dbscope access layer. No database driver,
//! no I/O; every function maps inputs to SQL text plus positionally
//! aligned bound values.
//!
//! ## Core Types
//!
//! - **[`Fragment`]**: a composable piece of SQL plus its bound values
//! - **[`PlaceholderStyle`]**: the driver's positional-placeholder syntax
//! - **[`PageRequest`]** / **[`PageInfo`]**: validated page inputs and
//!   derived page metadata
//! - **[`Error`]**: error type for generation failures
//!
//! ## Builders
//!
//! - [`where_exact`] / [`where_like`]: optional-filter WHERE predicates
//! - [`update`]: single-row UPDATE statements
//! - [`limit`]: LIMIT/OFFSET clauses
//! - [`count_query`]: row-count rewrite of an arbitrary filtered SELECT

mod error;
mod fragment;
mod pagination;
mod scan;

pub use error::{Error, Result};
pub use fragment::{
   Fragment, PlaceholderStyle, limit, update, validate_identifier, where_exact, where_like,
};
pub use pagination::{PageInfo, PageRequest, count_query, page_info, strip_trailing_clauses};
