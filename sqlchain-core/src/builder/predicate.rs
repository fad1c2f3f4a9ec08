//! Predicate and assignment methods

use super::{Parameter, QueryBuilder};
use crate::operator::{Conjunction, Operator};
use crate::value::{Bind, IntoBind, ParamType, Value};

/// Right-hand side of an `IN` / `NOT IN` predicate
#[derive(Debug, Clone, PartialEq)]
pub enum InValues {
    /// Each value gets its own placeholder
    Values(Vec<Bind>),
    /// A rendered sub-select and the parameters it binds
    Subquery { sql: String, params: Vec<Parameter> },
    /// SQL embedded verbatim, without parameterization. The caller owns
    /// injection safety on this path.
    Raw(String),
}

impl InValues {
    /// Verbatim SQL for the list body, e.g. a sub-select with no bound values
    pub fn raw(sql: impl Into<String>) -> Self {
        InValues::Raw(sql.into())
    }
}

impl<T> From<Vec<T>> for InValues
where
    T: IntoBind,
{
    fn from(values: Vec<T>) -> Self {
        InValues::Values(values.into_iter().map(IntoBind::into_bind).collect())
    }
}

impl<T, const N: usize> From<[T; N]> for InValues
where
    T: IntoBind,
{
    fn from(values: [T; N]) -> Self {
        InValues::Values(values.into_iter().map(IntoBind::into_bind).collect())
    }
}

impl<T> From<&[T]> for InValues
where
    T: Clone + IntoBind,
{
    fn from(values: &[T]) -> Self {
        InValues::Values(values.iter().cloned().map(IntoBind::into_bind).collect())
    }
}

impl From<&QueryBuilder> for InValues {
    fn from(query: &QueryBuilder) -> Self {
        InValues::Subquery {
            sql: query.render(),
            params: query.parameters().to_vec(),
        }
    }
}

impl From<&str> for InValues {
    fn from(sql: &str) -> Self {
        InValues::Raw(sql.to_string())
    }
}

impl From<String> for InValues {
    fn from(sql: String) -> Self {
        InValues::Raw(sql)
    }
}

impl QueryBuilder {
    /// `field = value`. Left out when the value is blank; booleans are
    /// bound as `"true"` / `"false"` and never left out.
    pub fn eq<V>(mut self, field: &str, value: V) -> Self
    where
        V: IntoBind,
    {
        self.compare(field, Operator::EQ, value.into_bind());
        self
    }

    /// Like [`eq`](Self::eq), but a blank value forces the statement to
    /// match no rows (`1 = 0`) instead of dropping the filter.
    pub fn eq_die<V>(mut self, field: &str, value: V) -> Self
    where
        V: IntoBind,
    {
        let bind = value.into_bind();
        if admits(&bind.value) {
            self.compare(field, Operator::EQ, bind);
        } else {
            self.where_clause.push_predicate("1 = 0");
        }
        self
    }

    /// `field != value`, with the same blank and boolean rules as `eq`
    pub fn not_eq<V>(mut self, field: &str, value: V) -> Self
    where
        V: IntoBind,
    {
        self.compare(field, Operator::NEQ, value.into_bind());
        self
    }

    /// `field IS NULL`
    pub fn eq_null(mut self, field: &str) -> Self {
        self.where_clause
            .push_predicate(&format!("{} {}", field, Operator::IS_NULL));
        self
    }

    /// `field IS NOT NULL`
    pub fn eq_not_null(mut self, field: &str) -> Self {
        self.where_clause
            .push_predicate(&format!("{} {}", field, Operator::IS_NOT_NULL));
        self
    }

    /// `field LIKE value`. A value without `%` is wrapped as `%value%`.
    /// Blank values are left out.
    pub fn like<V>(mut self, field: &str, value: V) -> Self
    where
        V: IntoBind,
    {
        let Bind { value, ty } = value.into_bind();
        if !admits(&value) {
            return self;
        }

        let ty = if matches!(value, Value::String(_)) {
            ty
        } else {
            ParamType::Str
        };
        let mut pattern = value.into_text();
        if !pattern.contains('%') {
            pattern = format!("%{}%", pattern);
        }

        let token = self.params.bind(Bind {
            value: Value::String(pattern),
            ty,
        });
        self.where_clause
            .push_predicate(&format!("{} {} {}", field, Operator::LIKE, token));
        self
    }

    /// `field IN (...)`. See [`InValues`] for the accepted shapes.
    ///
    /// ```
    /// use sqlchain_core::select;
    ///
    /// let query = select("Users").with_id("p").in_("id", vec![1, 2, 3]);
    /// assert_eq!(query.render(), "SELECT * FROM `Users` WHERE  id  IN (:p0, :p1, :p2) ");
    /// ```
    pub fn in_<V>(self, field: &str, values: V) -> Self
    where
        V: Into<InValues>,
    {
        self.membership(field, values.into(), false)
    }

    /// `field NOT IN (...)`
    pub fn not_in<V>(self, field: &str, values: V) -> Self
    where
        V: Into<InValues>,
    {
        self.membership(field, values.into(), true)
    }

    /// `field IN (...)` or, with `negate`, `field NOT IN (...)`
    pub fn membership(mut self, field: &str, values: InValues, negate: bool) -> Self {
        let operator = if negate { Operator::NOT_IN } else { Operator::IN };

        let body = match values {
            InValues::Values(values) if values.is_empty() => {
                // Nothing is in an empty set; NOT IN an empty set filters nothing.
                if !negate {
                    self.where_clause.push_predicate("1 = 0");
                }
                return self;
            }
            InValues::Values(values) => values
                .into_iter()
                .map(|bind| self.params.bind(bind))
                .collect::<Vec<_>>()
                .join(", "),
            InValues::Subquery { sql, params } => {
                self.params.merge_from(&params);
                sql
            }
            InValues::Raw(sql) => sql,
        };

        self.where_clause
            .push_predicate(&format!("{}  {} ({})", field, operator, body));
        self
    }

    /// Add `field = value` to the SET clause. Always binds.
    pub fn set<V>(mut self, field: &str, value: V) -> Self
    where
        V: IntoBind,
    {
        let token = self.params.bind(value.into_bind());
        if !self.set_clause.is_empty() {
            self.set_clause.push(',');
        }
        self.set_clause
            .push_str(&format!(" {} {} {}", field, Operator::EQ, token));
        self
    }

    /// Open a group whose predicates are joined by AND
    pub fn start_and(mut self) -> Self {
        self.where_clause.start(Conjunction::And);
        self
    }

    /// Open a group whose predicates are joined by OR
    pub fn start_or(mut self) -> Self {
        self.where_clause.start(Conjunction::Or);
        self
    }

    /// Close the innermost group
    pub fn end_and(mut self) -> Self {
        self.end_group();
        self
    }

    /// Close the innermost group
    pub fn end_or(mut self) -> Self {
        self.end_group();
        self
    }

    fn end_group(&mut self) {
        if !self.where_clause.end() {
            tracing::warn!("group close without a matching open; ignored");
        }
    }

    fn compare(&mut self, field: &str, operator: Operator, bind: Bind) {
        if !admits(&bind.value) {
            return;
        }
        let token = self.params.bind(Bind {
            value: bind.value.literalize_bool(),
            ty: bind.ty,
        });
        self.where_clause
            .push_predicate(&format!("{} {} {}", field, operator, token));
    }
}

/// Booleans are always admitted; anything else only when not blank
fn admits(value: &Value) -> bool {
    matches!(value, Value::Bool(_)) || !value.is_blank()
}
