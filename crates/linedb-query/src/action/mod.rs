//! Query actions.
//!
//! [`Query`] is the fluent entry point: build a filter with
//! [`Query::filter`], narrow the output with [`Query::cols`],
//! [`Query::limit`] and the sort keys, then run one of the read
//! ([`Query::find`], [`Query::get`], [`Query::count`],
//! [`Query::find_and_count`]) or write ([`Query::insert`],
//! [`Query::update`], [`Query::delete`]) operations.
//!
//! Each builder step either returns the query or, for
//! [`Query::filter`], a result: a malformed expression is reported where
//! it was written.

mod mutate;
mod predicate;
mod query;

pub use predicate::{compile, Predicate};
pub use query::{Direction, OrderBy, Pagination, Query};
