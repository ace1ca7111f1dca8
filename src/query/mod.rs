//! Declarative query engine
//!
//! Turns caller-supplied filters, sorts, page parameters and includes into a
//! [`ReadQuery`] that a storage backend executes.
//!
//! # Compilation
//!
//! 1. Every operator token of every field is resolved against [`Operator`]
//! 2. The last operator of each field becomes that field's predicate
//! 3. Fields are combined into a [`WhereClause`] with AND
//! 4. Sorts compile to ordered [`SortKey`]s, `id ASC` when none are given
//! 5. `page`/`pageSize` become an offset/limit window

mod errors;
mod filter;
mod operator;
mod pagination;
mod predicate;
mod request;
mod sort;

pub use errors::{QueryError, QueryResult};
pub use filter::{FieldFilter, FilterCompiler, FilterSet};
pub use operator::{is_empty_operand, Arity, Operator};
pub use pagination::{PageRequest, PageResult, DEFAULT_PAGE, DEFAULT_PAGE_SIZE};
pub use predicate::{
    compare_values, like_matches, parse_timestamp, values_equal, Condition, FieldPredicate,
    WhereClause,
};
pub use request::{FindAllQuery, FindOneQuery, FindQuery, IncludeSet, ReadQuery, Window};
pub use sort::{RowSorter, SortCompiler, SortDirection, SortKey, SortSet, DEFAULT_SORT_FIELD};
