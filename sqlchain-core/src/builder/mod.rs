//! Query builder module

pub mod grouping;
pub mod params;
pub mod predicate;
pub mod render;

use std::fmt;

use crate::executor::{Connection, ConnectionProvider, Statement};
use grouping::WhereClause;
use params::ParameterRegistry;

pub use params::Parameter;
pub use predicate::InValues;

/// Statement verb a builder is seeded with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Update,
    Insert,
    Delete,
}

impl StatementKind {
    /// Base statement for `target`. A SELECT target with more than one word
    /// is taken as a complete statement and used verbatim.
    pub fn base_statement(&self, target: &str) -> String {
        match self {
            StatementKind::Select if target.split(' ').count() > 1 => target.to_string(),
            StatementKind::Select => format!("SELECT * FROM `{}`", target),
            StatementKind::Update => format!("UPDATE `{}`", target),
            StatementKind::Insert => format!("INSERT INTO `{}`", target),
            StatementKind::Delete => format!("DELETE FROM `{}`", target),
        }
    }
}

/// Builds one parameterized statement, executes it, and then serves reads
/// over its result.
///
/// ```
/// use sqlchain_core::select;
///
/// let query = select("Users")
///     .with_id("p")
///     .eq("status", "active")
///     .order("name")
///     .limit(10);
///
/// assert_eq!(
///     query.render(),
///     "SELECT * FROM `Users` WHERE  status = :p0  ORDER BY name LIMIT 10"
/// );
/// ```
pub struct QueryBuilder {
    pub(crate) statement: String,
    pub(crate) where_clause: WhereClause,
    pub(crate) set_clause: String,
    pub(crate) group_by: Option<String>,
    pub(crate) order_by: Option<String>,
    pub(crate) limit: Option<u64>,
    pub(crate) offset: Option<u64>,
    pub(crate) params: ParameterRegistry,
    pub(crate) connection: Option<Box<dyn Connection>>,
    pub(crate) provider: Option<ConnectionProvider>,
    pub(crate) result: Option<Box<dyn Statement>>,
}

impl QueryBuilder {
    /// Create a builder for `kind` against `target`
    pub fn new(kind: StatementKind, target: &str) -> Self {
        Self::raw(kind.base_statement(target))
    }

    /// Create a builder whose base statement is `sql` as given
    pub fn raw(sql: impl Into<String>) -> Self {
        Self {
            statement: sql.into(),
            where_clause: WhereClause::new(),
            set_clause: String::new(),
            group_by: None,
            order_by: None,
            limit: None,
            offset: None,
            params: ParameterRegistry::new(),
            connection: None,
            provider: None,
            result: None,
        }
    }

    /// Create a builder with no base statement
    pub fn empty() -> Self {
        Self::raw(String::new())
    }

    /// Use `id` as the placeholder namespace instead of a random one.
    ///
    /// Only takes effect before the first value is bound. Callers that nest
    /// builders with fixed ids must keep those ids from prefixing each other.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        if self.params.is_empty() {
            self.params = ParameterRegistry::with_id(id);
        } else {
            tracing::warn!(
                id = self.params.id(),
                "placeholder namespace fixed after binding; keeping the current one"
            );
        }
        self
    }

    /// Execute through `connection`
    pub fn with_connection<C>(mut self, connection: C) -> Self
    where
        C: Connection + 'static,
    {
        self.connection = Some(Box::new(connection));
        self
    }

    /// Obtain a connection from `provider` the first time one is needed
    pub fn with_provider<F>(mut self, provider: F) -> Self
    where
        F: FnMut() -> Option<Box<dyn Connection>> + 'static,
    {
        self.provider = Some(Box::new(provider));
        self
    }

    /// Placeholder namespace of this builder
    pub fn id(&self) -> &str {
        self.params.id()
    }

    /// Number of groups opened and not yet closed
    pub fn open_groups(&self) -> usize {
        self.where_clause.depth()
    }
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for QueryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("sql", &self.render())
            .field("params", &self.params.as_slice())
            .field("connected", &self.connection.is_some())
            .field("has_result", &self.result.is_some())
            .finish()
    }
}
