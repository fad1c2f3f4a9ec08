//! sqlchain - a fluent builder for parameterized SQL statements
//!
//! Predicates, assignments and trailing clauses are added in any order;
//! the builder tracks AND/OR grouping, gives every bound value its own
//! namespaced placeholder, and renders the clauses in a fixed order.
//! Execution goes through the small [`Connection`] / [`Statement`]
//! interface.
//!
//! ```
//! use sqlchain_core::select;
//!
//! let query = select("Users")
//!     .eq("status", "active")
//!     .eq("team", "")          // blank values are left out
//!     .start_or()
//!     .eq("role", "admin")
//!     .like("email", "@example.com")
//!     .end_or()
//!     .order("name");
//!
//! assert_eq!(query.parameters().len(), 3);
//! assert!(query.render().contains(" OR email LIKE "));
//! ```

pub mod builder;
pub mod error;
pub mod executor;
pub mod operator;
pub mod value;

#[cfg(feature = "sqlite")]
pub mod sqlite;

// Re-export main types
pub use builder::{InValues, Parameter, QueryBuilder, StatementKind};
pub use error::{Error, Result};
pub use executor::{
    Connection, ConnectionProvider, Execution, FetchMode, Row, Rows, Statement,
};
pub use operator::{Conjunction, Operator};
pub use value::{typed, Bind, IntoBind, ParamType, Value};

/// Create a SELECT builder. A single-word `target` is a table name; anything
/// longer is used as the full base statement.
pub fn select(target: &str) -> QueryBuilder {
    QueryBuilder::new(StatementKind::Select, target)
}

/// Create an UPDATE builder for the given table
pub fn update(table: &str) -> QueryBuilder {
    QueryBuilder::new(StatementKind::Update, table)
}

/// Create an INSERT builder for the given table
pub fn insert(table: &str) -> QueryBuilder {
    QueryBuilder::new(StatementKind::Insert, table)
}

/// Create a DELETE builder for the given table
pub fn delete(table: &str) -> QueryBuilder {
    QueryBuilder::new(StatementKind::Delete, table)
}
