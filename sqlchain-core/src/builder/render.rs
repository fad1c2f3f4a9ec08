//! Statement assembly and the trailing clauses

use super::{Parameter, QueryBuilder};

impl QueryBuilder {
    /// Set the GROUP BY columns, replacing any previous value
    pub fn group(mut self, columns: &str) -> Self {
        self.group_by = Some(columns.to_string());
        self
    }

    /// Set the ORDER BY columns, replacing any previous value
    pub fn order(mut self, columns: &str) -> Self {
        self.order_by = Some(columns.to_string());
        self
    }

    /// Set LIMIT. Zero leaves the current limit untouched.
    pub fn limit(mut self, limit: u64) -> Self {
        if limit > 0 {
            self.limit = Some(limit);
        }
        self
    }

    /// Set OFFSET. Zero leaves the current offset untouched.
    pub fn offset(mut self, offset: u64) -> Self {
        if offset > 0 {
            self.offset = Some(offset);
        }
        self
    }

    /// Render the statement text.
    ///
    /// Clauses always appear as base, SET, WHERE, GROUP BY, ORDER BY, LIMIT,
    /// OFFSET no matter the order they were set in. Groups still open are
    /// closed in the output without touching the builder, so repeated calls
    /// return the same text.
    pub fn render(&self) -> String {
        let mut sql = self.statement.clone();

        if !self.set_clause.is_empty() {
            sql.push_str(" SET ");
            sql.push_str(&self.set_clause);
        }

        let mut where_clause = self.where_clause.clone();
        where_clause.close_all();
        if !where_clause.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(where_clause.as_str());
        }

        if let Some(group_by) = &self.group_by {
            sql.push_str(" GROUP BY ");
            sql.push_str(group_by);
        }

        if let Some(order_by) = &self.order_by {
            sql.push_str(" ORDER BY ");
            sql.push_str(order_by);
        }

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {}", offset));
        }

        sql
    }

    /// Alias for [`render`](Self::render)
    pub fn to_sql(&self) -> String {
        self.render()
    }

    /// Bound parameters in the order they were bound
    pub fn parameters(&self) -> &[Parameter] {
        self.params.as_slice()
    }
}
