//! Search compilation and execution.
//!
//! A search flows through the pieces of this module in order:
//!
//! 1. a [`PredicateParser`] turns the search text into a [`SqlFragment`],
//! 2. the [`QueryCompiler`] runs it when the sort column is a managed custom
//!    column, otherwise a [`NativeSearch`] does,
//! 3. the [`ResultPostFilter`] optionally keeps one record per group.
//!
//! [`SqlFragment`]: crate::types::SqlFragment

mod compiler;
mod native;
mod ordering;
mod post_filter;
mod predicate;

pub use compiler::{CompileOutcome, CompiledSearch, QueryCompiler, SearchOutcome, SearchStrategy};
pub use native::{BuiltinNativeSearch, DEFAULT_ORDER, NativeSearch};
pub use ordering::{apply_direction, blank_flag, order_terms};
pub use post_filter::{ResultPostFilter, unique_groups};
pub use predicate::{BasicPredicateParser, PredicateParser};
