//! Query execution and the connection interface

use crate::{Error, ParamType, QueryBuilder, Result, Value};
use serde::de::DeserializeOwned;

/// A fetched row: a JSON object keyed by column for [`FetchMode::Assoc`],
/// a JSON array in column order for [`FetchMode::Num`]
pub type Row = serde_json::Value;

/// Shape of fetched rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchMode {
    #[default]
    Assoc,
    Num,
}

/// Supplies a connection on demand, e.g. from a process-wide pool
pub type ConnectionProvider = Box<dyn FnMut() -> Option<Box<dyn Connection>>>;

/// A live database connection able to prepare statements
pub trait Connection {
    /// Prepare `sql`, which uses `:name` placeholders
    fn prepare(&mut self, sql: &str) -> Result<Box<dyn Statement>>;

    /// Identifier generated by the most recent insert, if any
    fn last_insert_id(&mut self) -> Option<String>;
}

/// A prepared statement and, once executed, its cursor
pub trait Statement {
    /// Bind `value` to the placeholder `name` (including its leading `:`)
    fn bind_by_name(&mut self, name: &str, value: &Value, ty: ParamType) -> Result<()>;

    /// Run the statement with its current bindings
    fn execute(&mut self) -> Result<()>;

    /// Next row from the cursor, or `None` once exhausted
    fn fetch_next(&mut self, mode: FetchMode) -> Result<Option<Row>>;

    /// Every remaining row
    fn fetch_all(&mut self, mode: FetchMode) -> Result<Vec<Row>> {
        let mut rows = Vec::new();
        while let Some(row) = self.fetch_next(mode)? {
            rows.push(row);
        }
        Ok(rows)
    }

    /// Rows affected or produced by the last execution
    fn row_count(&self) -> u64;

    /// Free the cursor so the connection can run another statement
    fn release_cursor(&mut self);
}

/// Outcome of [`QueryBuilder::execute`]
#[derive(Debug)]
pub enum Execution {
    Executed,
    Failed(Error),
}

impl Execution {
    pub fn is_success(&self) -> bool {
        matches!(self, Execution::Executed)
    }

    /// The failure reason, if any
    pub fn error(&self) -> Option<&Error> {
        match self {
            Execution::Executed => None,
            Execution::Failed(err) => Some(err),
        }
    }

    /// Convert into a `Result` for callers that prefer `?`
    pub fn into_result(self) -> Result<()> {
        match self {
            Execution::Executed => Ok(()),
            Execution::Failed(err) => Err(err),
        }
    }
}

/// Releases the cursor when dropped
struct CursorGuard<'a> {
    statement: &'a mut Box<dyn Statement>,
}

impl Drop for CursorGuard<'_> {
    fn drop(&mut self) {
        self.statement.release_cursor();
    }
}

/// Single-pass iterator over the rows of an executed statement.
///
/// The cursor is released when the rows run out, when a fetch fails, or
/// when the iterator is dropped early.
pub struct Rows<'a> {
    statement: Option<&'a mut Box<dyn Statement>>,
    mode: FetchMode,
}

impl Iterator for Rows<'_> {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        let statement = self.statement.as_mut()?;
        match statement.fetch_next(self.mode) {
            Ok(Some(row)) => Some(row),
            Ok(None) => {
                self.finish();
                None
            }
            Err(err) => {
                tracing::error!(error = %err, "row fetch failed");
                self.finish();
                None
            }
        }
    }
}

impl Rows<'_> {
    fn finish(&mut self) {
        if let Some(statement) = self.statement.take() {
            statement.release_cursor();
        }
    }
}

impl Drop for Rows<'_> {
    fn drop(&mut self) {
        self.finish();
    }
}

impl QueryBuilder {
    /// Close any open groups and return the statement text without touching
    /// a connection
    pub fn dry_run(&mut self) -> String {
        self.close_groups();
        self.render()
    }

    /// Prepare, bind and run the statement.
    ///
    /// Any earlier result is released first, so reads never see rows from a
    /// previous run.
    ///
    /// Never returns an error: an unavailable connection or a rejected
    /// statement is logged and reported as [`Execution::Failed`]. When the
    /// statement was prepared, the builder keeps it as the result handle
    /// even if running it failed.
    pub fn execute(&mut self) -> Execution {
        if let Some(mut previous) = self.result.take() {
            previous.release_cursor();
        }
        if self.connection.is_none() {
            self.connection = self.provider.as_mut().and_then(|provide| provide());
        }
        if self.connection.is_none() {
            tracing::warn!("no connection available; statement not executed");
            return Execution::Failed(Error::ConnectionUnavailable);
        }

        self.close_groups();
        let sql = self.render();
        tracing::debug!(sql = %sql, params = self.params.len(), "executing statement");

        let prepared = match self.connection.as_mut() {
            Some(connection) => connection.prepare(&sql),
            None => Err(Error::ConnectionUnavailable),
        };
        let mut statement = match prepared {
            Ok(statement) => statement,
            Err(err) => {
                tracing::error!(sql = %sql, error = %err, "bad query");
                return Execution::Failed(err);
            }
        };

        let outcome = bind_all(statement.as_mut(), self.params.as_slice())
            .and_then(|()| statement.execute());
        self.result = Some(statement);

        match outcome {
            Ok(()) => Execution::Executed,
            Err(err) => {
                tracing::error!(sql = %sql, error = %err, "bad query");
                Execution::Failed(err)
            }
        }
    }

    /// All rows of the result; empty if nothing was executed or the fetch
    /// failed
    pub fn fetch_all_rows(&mut self, mode: FetchMode) -> Vec<Row> {
        let Some(statement) = self.result.as_mut() else {
            return Vec::new();
        };
        let cursor = CursorGuard { statement };
        cursor.statement.fetch_all(mode).unwrap_or_else(|err| {
            tracing::error!(error = %err, "row fetch failed");
            Vec::new()
        })
    }

    /// Lazily iterate the rows of the result
    pub fn rows(&mut self, mode: FetchMode) -> Rows<'_> {
        Rows {
            statement: self.result.as_mut(),
            mode,
        }
    }

    /// Rows affected or produced by the executed statement; zero without one
    pub fn row_count(&self) -> u64 {
        self.result
            .as_ref()
            .map(|statement| statement.row_count())
            .unwrap_or(0)
    }

    /// First column of the first row, for single-value queries such as
    /// `SELECT COUNT(*)`. SQL NULL comes back as `None`.
    pub fn single_item(&mut self) -> Option<serde_json::Value> {
        let statement = self.result.as_mut()?;
        let cursor = CursorGuard { statement };
        match cursor.statement.fetch_next(FetchMode::Num) {
            Ok(Some(Row::Array(mut columns))) if !columns.is_empty() => {
                Some(columns.swap_remove(0)).filter(|value| !value.is_null())
            }
            Ok(_) => None,
            Err(err) => {
                tracing::error!(error = %err, "row fetch failed");
                None
            }
        }
    }

    /// Deserialize every row into `T`
    pub fn fetch_all_as<T>(&mut self) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let statement = self.result.as_mut().ok_or(Error::NoResult)?;
        let cursor = CursorGuard { statement };
        let rows = cursor.statement.fetch_all(FetchMode::Assoc)?;

        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            results.push(serde_json::from_value(row)?);
        }
        Ok(results)
    }

    /// Identifier generated by the last insert on this builder's connection
    pub fn insert_id(&mut self) -> Option<String> {
        self.connection.as_mut()?.last_insert_id()
    }

    fn close_groups(&mut self) {
        let closed = self.where_clause.close_all();
        if closed > 0 {
            tracing::warn!(closed, "closing groups left open");
        }
    }
}

fn bind_all(statement: &mut dyn Statement, params: &[crate::Parameter]) -> Result<()> {
    for param in params {
        statement.bind_by_name(&param.token(), &param.value, param.ty)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{select, update};
    use serde::Deserialize;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    struct User {
        id: i64,
        name: String,
    }

    #[derive(Default)]
    struct Log {
        prepared: Vec<String>,
        bound: Vec<(String, Value, ParamType)>,
        released: usize,
        reject_prepare: bool,
    }

    // Mock connection serving canned rows
    struct MockConnection {
        log: Rc<RefCell<Log>>,
        rows: Vec<Row>,
        fail_prepare: bool,
        fail_execute: bool,
    }

    impl MockConnection {
        fn new(log: &Rc<RefCell<Log>>) -> Self {
            Self {
                log: Rc::clone(log),
                rows: Vec::new(),
                fail_prepare: false,
                fail_execute: false,
            }
        }

        fn with_users(mut self) -> Self {
            self.rows = vec![
                serde_json::json!({"id": 1, "name": "John"}),
                serde_json::json!({"id": 2, "name": "Jane"}),
            ];
            self
        }
    }

    struct MockStatement {
        log: Rc<RefCell<Log>>,
        rows: Vec<Row>,
        cursor: VecDeque<Row>,
        fail_execute: bool,
    }

    impl Connection for MockConnection {
        fn prepare(&mut self, sql: &str) -> Result<Box<dyn Statement>> {
            if self.fail_prepare || self.log.borrow().reject_prepare {
                return Err(Error::prepare(sql, "mock prepare failure"));
            }
            self.log.borrow_mut().prepared.push(sql.to_string());
            Ok(Box::new(MockStatement {
                log: Rc::clone(&self.log),
                rows: self.rows.clone(),
                cursor: VecDeque::new(),
                fail_execute: self.fail_execute,
            }))
        }

        fn last_insert_id(&mut self) -> Option<String> {
            Some("42".to_string())
        }
    }

    impl Statement for MockStatement {
        fn bind_by_name(&mut self, name: &str, value: &Value, ty: ParamType) -> Result<()> {
            self.log
                .borrow_mut()
                .bound
                .push((name.to_string(), value.clone(), ty));
            Ok(())
        }

        fn execute(&mut self) -> Result<()> {
            if self.fail_execute {
                return Err(Error::execute("mock", "mock execute failure"));
            }
            self.cursor = self.rows.iter().cloned().collect();
            Ok(())
        }

        fn fetch_next(&mut self, mode: FetchMode) -> Result<Option<Row>> {
            Ok(self.cursor.pop_front().map(|row| match mode {
                FetchMode::Assoc => row,
                FetchMode::Num => Row::Array(vec![row["id"].clone(), row["name"].clone()]),
            }))
        }

        fn row_count(&self) -> u64 {
            self.rows.len() as u64
        }

        fn release_cursor(&mut self) {
            self.cursor.clear();
            self.log.borrow_mut().released += 1;
        }
    }

    fn log() -> Rc<RefCell<Log>> {
        Rc::new(RefCell::new(Log::default()))
    }

    #[test]
    fn test_execute_binds_every_param_by_name() {
        let log = log();
        let mut query = update("Users")
            .with_id("p")
            .eq("id", 3)
            .set("name", "Ann")
            .with_connection(MockConnection::new(&log));

        assert!(query.execute().is_success());

        let log = log.borrow();
        assert_eq!(
            log.prepared,
            vec!["UPDATE `Users` SET  name = :p1 WHERE  id = :p0 ".to_string()]
        );
        assert_eq!(
            log.bound,
            vec![
                (":p0".to_string(), Value::I64(3), ParamType::Int),
                (":p1".to_string(), Value::from("Ann"), ParamType::Str),
            ]
        );
    }

    #[test]
    fn test_execute_without_connection_fails() {
        let mut query = select("Users").eq("id", 1);
        let outcome = query.execute();
        assert!(matches!(
            outcome,
            Execution::Failed(Error::ConnectionUnavailable)
        ));
        assert_eq!(query.row_count(), 0);
        assert!(query.fetch_all_rows(FetchMode::Assoc).is_empty());
    }

    #[test]
    fn test_provider_supplies_connection_lazily() {
        let log = log();
        let calls = Rc::new(RefCell::new(0));
        let provider_log = Rc::clone(&log);
        let provider_calls = Rc::clone(&calls);

        let mut query = select("Users").with_provider(move || {
            *provider_calls.borrow_mut() += 1;
            Some(Box::new(MockConnection::new(&provider_log)) as Box<dyn Connection>)
        });
        assert_eq!(*calls.borrow(), 0);

        assert!(query.execute().is_success());
        assert!(query.execute().is_success());
        assert_eq!(*calls.borrow(), 1);
        assert_eq!(log.borrow().prepared.len(), 2);
    }

    #[test]
    fn test_provider_without_connection_fails() {
        let mut query = select("Users").with_provider(|| None);
        assert!(!query.execute().is_success());
    }

    #[test]
    fn test_dry_run_skips_connection() {
        let log = log();
        let mut query = select("Users")
            .with_id("p")
            .start_and()
            .eq("a", 1)
            .with_connection(MockConnection::new(&log));

        assert_eq!(query.dry_run(), "SELECT * FROM `Users` WHERE  ( a = :p0)");
        assert_eq!(query.open_groups(), 0);
        assert!(log.borrow().prepared.is_empty());
    }

    #[test]
    fn test_execute_closes_open_groups() {
        let log = log();
        let mut query = select("Users")
            .with_id("p")
            .start_or()
            .eq("a", 1)
            .start_and()
            .with_connection(MockConnection::new(&log));

        query.execute();
        assert_eq!(query.open_groups(), 0);
        assert_eq!(
            log.borrow().prepared[0],
            "SELECT * FROM `Users` WHERE  ( a = :p0)"
        );
    }

    #[test]
    fn test_prepare_failure_is_reported() {
        let log = log();
        let mut conn = MockConnection::new(&log);
        conn.fail_prepare = true;
        let mut query = select("Users").with_connection(conn);

        let outcome = query.execute();
        assert!(matches!(outcome.error(), Some(Error::Prepare { .. })));
        assert!(query.fetch_all_rows(FetchMode::Assoc).is_empty());
    }

    #[test]
    fn test_execute_failure_keeps_result_handle() {
        let log = log();
        let mut conn = MockConnection::new(&log).with_users();
        conn.fail_execute = true;
        let mut query = select("Users").with_connection(conn);

        let outcome = query.execute();
        assert!(outcome.into_result().is_err());
        assert!(query.fetch_all_rows(FetchMode::Assoc).is_empty());
        assert_eq!(log.borrow().released, 1);
    }

    #[test]
    fn test_failed_rerun_drops_previous_result() {
        let log = log();
        let mut query = select("Users").with_connection(MockConnection::new(&log).with_users());
        assert!(query.execute().is_success());
        assert_eq!(query.row_count(), 2);

        log.borrow_mut().reject_prepare = true;
        let outcome = query.execute();
        assert!(matches!(outcome.error(), Some(Error::Prepare { .. })));
        assert_eq!(log.borrow().released, 1);
        assert_eq!(query.row_count(), 0);
        assert!(query.fetch_all_rows(FetchMode::Assoc).is_empty());
    }

    #[test]
    fn test_rerun_releases_previous_cursor() {
        let log = log();
        let mut query = select("Users").with_connection(MockConnection::new(&log).with_users());
        query.execute();
        query.execute();
        assert_eq!(log.borrow().released, 1);
        assert_eq!(query.fetch_all_rows(FetchMode::Assoc).len(), 2);
    }

    #[test]
    fn test_fetch_all_rows_releases_cursor() {
        let log = log();
        let mut query = select("Users").with_connection(MockConnection::new(&log).with_users());
        query.execute();

        let rows = query.fetch_all_rows(FetchMode::Assoc);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["name"], "John");
        assert_eq!(log.borrow().released, 1);
        assert_eq!(query.row_count(), 2);
    }

    #[test]
    fn test_rows_iterator_releases_on_exhaustion() {
        let log = log();
        let mut query = select("Users").with_connection(MockConnection::new(&log).with_users());
        query.execute();

        let names: Vec<String> = query
            .rows(FetchMode::Num)
            .map(|row| row[1].as_str().unwrap_or_default().to_string())
            .collect();
        assert_eq!(names, vec!["John", "Jane"]);
        assert_eq!(log.borrow().released, 1);

        // Single pass: the cursor is gone
        assert_eq!(query.rows(FetchMode::Assoc).count(), 0);
    }

    #[test]
    fn test_rows_iterator_releases_on_early_drop() {
        let log = log();
        let mut query = select("Users").with_connection(MockConnection::new(&log).with_users());
        query.execute();

        {
            let mut rows = query.rows(FetchMode::Assoc);
            assert!(rows.next().is_some());
        }
        assert_eq!(log.borrow().released, 1);
    }

    #[test]
    fn test_single_item() {
        let log = log();
        let mut query = select("Users").with_connection(MockConnection::new(&log).with_users());
        query.execute();

        assert_eq!(query.single_item(), Some(serde_json::json!(1)));
        assert_eq!(log.borrow().released, 1);
    }

    #[test]
    fn test_single_item_on_empty_result() {
        let log = log();
        let mut query = select("Users").with_connection(MockConnection::new(&log));
        query.execute();
        assert_eq!(query.single_item(), None);
    }

    #[test]
    fn test_fetch_all_as() {
        let log = log();
        let mut query = select("Users").with_connection(MockConnection::new(&log).with_users());
        query.execute();

        let users: Vec<User> = query.fetch_all_as().unwrap();
        assert_eq!(
            users,
            vec![
                User { id: 1, name: "John".into() },
                User { id: 2, name: "Jane".into() },
            ]
        );
    }

    #[test]
    fn test_fetch_all_as_without_result() {
        let mut query = select("Users");
        let result: Result<Vec<User>> = query.fetch_all_as();
        assert!(matches!(result, Err(Error::NoResult)));
    }

    #[test]
    fn test_insert_id() {
        let log = log();
        let mut query = crate::insert("Users")
            .set("name", "Ann")
            .with_connection(MockConnection::new(&log));
        query.execute();
        assert_eq!(query.insert_id(), Some("42".to_string()));
        assert_eq!(select("t").insert_id(), None);
    }
}
