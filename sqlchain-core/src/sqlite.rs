//! Blocking SQLite connection over sqlx

use std::cell::Cell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use futures::TryStreamExt;
use sqlx::sqlite::{SqliteArguments, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Either, Executor, Row as _, Sqlite, TypeInfo, ValueRef};

use crate::executor::{Connection, FetchMode, Row, Statement};
use crate::{Error, ParamType, Result, Value};

type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

/// A SQLite connection usable from synchronous code.
///
/// Owns a current-thread tokio runtime and a single-connection pool, so
/// clones share one database session (and one `:memory:` database).
#[derive(Clone)]
pub struct SqliteConnection {
    pool: SqlitePool,
    runtime: Rc<tokio::runtime::Runtime>,
    last_insert: Rc<Cell<Option<i64>>>,
}

impl SqliteConnection {
    /// Open `url`, e.g. `sqlite::memory:` or `sqlite://app.db`
    pub fn connect(url: &str) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let pool = runtime.block_on(
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect(url),
        )?;
        Ok(Self::from_pool(pool, runtime))
    }

    /// Wrap an existing pool; `runtime` drives every database call
    pub fn from_pool(pool: SqlitePool, runtime: tokio::runtime::Runtime) -> Self {
        Self {
            pool,
            runtime: Rc::new(runtime),
            last_insert: Rc::new(Cell::new(None)),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Run unparameterized SQL such as schema setup; returns rows affected
    pub fn run(&self, sql: &str) -> Result<u64> {
        let done = self
            .runtime
            .block_on(sqlx::query(sql).execute(&self.pool))?;
        Ok(done.rows_affected())
    }
}

impl Connection for SqliteConnection {
    fn prepare(&mut self, sql: &str) -> Result<Box<dyn Statement>> {
        let (positional, names) = to_positional(sql);

        self.runtime
            .block_on(async { (&self.pool).prepare(positional.as_str()).await.map(|_| ()) })
            .map_err(|err| Error::prepare(sql, err.to_string()))?;

        Ok(Box::new(SqliteStatement {
            sql: sql.to_string(),
            positional,
            names,
            binds: HashMap::new(),
            pool: self.pool.clone(),
            runtime: Rc::clone(&self.runtime),
            last_insert: Rc::clone(&self.last_insert),
            cursor: VecDeque::new(),
            row_count: 0,
        }))
    }

    fn last_insert_id(&mut self) -> Option<String> {
        self.last_insert.get().map(|id| id.to_string())
    }
}

type DecodedRow = Vec<(String, serde_json::Value)>;

struct SqliteStatement {
    sql: String,
    positional: String,
    /// Placeholder names in text order, with their leading `:`
    names: Vec<String>,
    binds: HashMap<String, (Value, ParamType)>,
    pool: SqlitePool,
    runtime: Rc<tokio::runtime::Runtime>,
    last_insert: Rc<Cell<Option<i64>>>,
    cursor: VecDeque<DecodedRow>,
    row_count: u64,
}

impl Statement for SqliteStatement {
    fn bind_by_name(&mut self, name: &str, value: &Value, ty: ParamType) -> Result<()> {
        self.binds.insert(name.to_string(), (value.clone(), ty));
        Ok(())
    }

    fn execute(&mut self) -> Result<()> {
        self.cursor.clear();
        self.row_count = 0;

        let mut query = sqlx::query(self.positional.as_str());
        for name in &self.names {
            let (value, ty) = self
                .binds
                .get(name)
                .ok_or_else(|| Error::unbound_placeholder(name.trim_start_matches(':')))?;
            query = bind_value(query, value, *ty);
        }

        let results: Vec<Either<_, SqliteRow>> = self
            .runtime
            .block_on(query.fetch_many(&self.pool).try_collect())
            .map_err(|err| Error::execute(self.sql.as_str(), err.to_string()))?;

        let mut affected = 0;
        let mut rows = VecDeque::new();
        for item in results {
            match item {
                Either::Left(done) => {
                    let done: sqlx::sqlite::SqliteQueryResult = done;
                    affected += done.rows_affected();
                    if done.rows_affected() > 0 && done.last_insert_rowid() != 0 {
                        self.last_insert.set(Some(done.last_insert_rowid()));
                    }
                }
                Either::Right(row) => rows.push_back(decode_row(&row)?),
            }
        }

        self.row_count = if rows.is_empty() {
            affected
        } else {
            rows.len() as u64
        };
        self.cursor = rows;
        Ok(())
    }

    fn fetch_next(&mut self, mode: FetchMode) -> Result<Option<Row>> {
        let Some(columns) = self.cursor.pop_front() else {
            return Ok(None);
        };
        let row = match mode {
            FetchMode::Assoc => Row::Object(columns.into_iter().collect()),
            FetchMode::Num => Row::Array(columns.into_iter().map(|(_, value)| value).collect()),
        };
        Ok(Some(row))
    }

    fn row_count(&self) -> u64 {
        self.row_count
    }

    fn release_cursor(&mut self) {
        self.cursor.clear();
    }
}

fn bind_value<'q>(query: SqliteQuery<'q>, value: &Value, ty: ParamType) -> SqliteQuery<'q> {
    match (value, ty) {
        (Value::Null, _) | (_, ParamType::Null) => query.bind(None::<String>),
        (Value::String(s), ParamType::Int) => match s.trim().parse::<i64>() {
            Ok(i) => query.bind(i),
            Err(_) => query.bind(s.clone()),
        },
        (Value::Bool(b), _) => query.bind(*b),
        (Value::I64(i), _) => query.bind(*i),
        (Value::F64(f), _) => query.bind(*f),
        (Value::String(s), _) => query.bind(s.clone()),
        (Value::Bytes(b), _) => query.bind(b.clone()),
    }
}

fn decode_row(row: &SqliteRow) -> Result<DecodedRow> {
    let mut columns = Vec::with_capacity(row.len());
    for (i, column) in row.columns().iter().enumerate() {
        let raw = row.try_get_raw(i)?;
        let value = if raw.is_null() {
            serde_json::Value::Null
        } else {
            match raw.type_info().name() {
                "INTEGER" | "BOOLEAN" => serde_json::json!(row.try_get::<i64, _>(i)?),
                "REAL" => serde_json::json!(row.try_get::<f64, _>(i)?),
                "BLOB" => serde_json::json!(row.try_get::<Vec<u8>, _>(i)?),
                _ => serde_json::json!(row.try_get::<String, _>(i)?),
            }
        };
        columns.push((column.name().to_string(), value));
    }
    Ok(columns)
}

/// Rewrite `:name` placeholders to `?`, returning the names in text order.
/// Quoted strings and identifiers, and `::` casts, are left alone.
fn to_positional(sql: &str) -> (String, Vec<String>) {
    let mut out = String::with_capacity(sql.len());
    let mut names = Vec::new();
    let mut quote: Option<char> = None;
    let mut prev = '\0';
    let mut chars = sql.chars().peekable();

    while let Some(c) = chars.next() {
        if let Some(q) = quote {
            out.push(c);
            if c == q {
                quote = None;
            }
            prev = c;
            continue;
        }

        match c {
            '\'' | '"' | '`' => {
                quote = Some(c);
                out.push(c);
            }
            ':' if prev != ':' && chars.peek().is_some_and(|n| is_name_char(*n)) => {
                let mut name = String::from(":");
                while let Some(&n) = chars.peek() {
                    if !is_name_char(n) {
                        break;
                    }
                    name.push(n);
                    chars.next();
                }
                names.push(name);
                out.push('?');
                prev = '?';
                continue;
            }
            _ => out.push(c),
        }
        prev = c;
    }

    (out, names)
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
