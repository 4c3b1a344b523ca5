//! Translation of [`FilterRequest`]s into SQL predicates.
//!
//! Each table publishes a [`TableSpec`]: the public field names clients may
//! filter and sort on, the column behind each name, the value kind used to
//! parse incoming JSON, and named scopes (fixed SQL fragments).
//!
//! [`SpecificationBuilder`] checks a request against that whitelist and
//! produces a typed [`Predicate`] tree. Rendering pushes column names from the
//! whitelist verbatim and every client value as a bind parameter, so request
//! contents never reach the SQL text.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde_json::Value;
use sqlx::{Postgres, QueryBuilder};

use crate::domain::filter::{
    Combinator, Criterion, FilterError, FilterGroup, FilterLimits, FilterRequest, Operator,
    SortDirection,
};

/// Type of a filterable column; decides how JSON values are parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    Boolean,
    Date,
    Time,
    Timestamp,
    /// Text column restricted to the listed values.
    Enum(&'static [&'static str]),
}

impl FieldKind {
    fn supports(&self, operator: Operator) -> bool {
        match self {
            FieldKind::Text | FieldKind::Enum(_) => true,
            FieldKind::Boolean => !operator.is_pattern() && !operator.is_ordering(),
            _ => !operator.is_pattern(),
        }
    }
}

/// A public field name mapped to a column.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub column: &'static str,
    pub kind: FieldKind,
}

/// A named, fixed SQL condition selectable by clients.
#[derive(Debug, Clone, Copy)]
pub struct ScopeSpec {
    pub name: &'static str,
    pub sql: &'static str,
}

/// Whitelist of one searchable table.
#[derive(Debug)]
pub struct TableSpec {
    pub table: &'static str,
    /// Column list of the `SELECT`, matching the row type of the adapter.
    pub columns: &'static str,
    pub fields: &'static [FieldSpec],
    pub scopes: &'static [ScopeSpec],
    /// `ORDER BY` body used when the request has no sort.
    pub default_sort: &'static str,
}

impl TableSpec {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn scope(&self, name: &str) -> Option<&ScopeSpec> {
        self.scopes.iter().find(|s| s.name == name)
    }
}

/// A client value parsed to the column's type.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    Integer(i64),
    Boolean(bool),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(DateTime<Utc>),
}

impl SqlValue {
    fn push_bind(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        match self {
            SqlValue::Text(v) => qb.push_bind(v.clone()),
            SqlValue::Integer(v) => qb.push_bind(*v),
            SqlValue::Boolean(v) => qb.push_bind(*v),
            SqlValue::Date(v) => qb.push_bind(*v),
            SqlValue::Time(v) => qb.push_bind(*v),
            SqlValue::Timestamp(v) => qb.push_bind(*v),
        };
    }
}

/// Compiled filter, ready to render into a query.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    True,
    /// Trusted SQL from a [`ScopeSpec`] or the adapter itself.
    Raw(&'static str),
    Compare {
        column: &'static str,
        op: &'static str,
        value: SqlValue,
    },
    /// `ILIKE` with an already escaped pattern.
    Like {
        column: &'static str,
        pattern: String,
    },
    In {
        column: &'static str,
        values: Vec<SqlValue>,
        negated: bool,
    },
    Between {
        column: &'static str,
        low: SqlValue,
        high: SqlValue,
    },
    IsNull {
        column: &'static str,
        negated: bool,
    },
    All(Vec<Predicate>),
    Any(Vec<Predicate>),
}

impl Predicate {
    /// Conjunction; `TRUE` members are dropped and nested conjunctions
    /// flattened.
    pub fn all(parts: Vec<Predicate>) -> Predicate {
        let mut flat = Vec::with_capacity(parts.len());
        for part in parts {
            match part {
                Predicate::True => {}
                Predicate::All(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        let mut parts = flat;
        match parts.len() {
            0 => Predicate::True,
            1 => parts.remove(0),
            _ => Predicate::All(parts),
        }
    }

    /// Disjunction; any `TRUE` member makes the whole disjunction true.
    pub fn any(mut parts: Vec<Predicate>) -> Predicate {
        if parts.is_empty() || parts.contains(&Predicate::True) {
            return Predicate::True;
        }
        match parts.len() {
            1 => parts.remove(0),
            _ => Predicate::Any(parts),
        }
    }

    /// Appends the predicate to `qb`, binding every value.
    pub fn render(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        match self {
            Predicate::True => {
                qb.push("TRUE");
            }
            Predicate::Raw(sql) => {
                qb.push(*sql);
            }
            Predicate::Compare { column, op, value } => {
                qb.push(*column).push(" ").push(*op).push(" ");
                value.push_bind(qb);
            }
            Predicate::Like { column, pattern } => {
                qb.push(*column).push(" ILIKE ");
                qb.push_bind(pattern.clone());
                qb.push(" ESCAPE '\\'");
            }
            Predicate::In {
                column,
                values,
                negated,
            } => {
                qb.push(*column)
                    .push(if *negated { " NOT IN (" } else { " IN (" });
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        qb.push(", ");
                    }
                    value.push_bind(qb);
                }
                qb.push(")");
            }
            Predicate::Between { column, low, high } => {
                qb.push(*column).push(" BETWEEN ");
                low.push_bind(qb);
                qb.push(" AND ");
                high.push_bind(qb);
            }
            Predicate::IsNull { column, negated } => {
                qb.push(*column).push(if *negated {
                    " IS NOT NULL"
                } else {
                    " IS NULL"
                });
            }
            Predicate::All(parts) => render_joined(qb, parts, " AND "),
            Predicate::Any(parts) => render_joined(qb, parts, " OR "),
        }
    }
}

fn render_joined(qb: &mut QueryBuilder<'_, Postgres>, parts: &[Predicate], separator: &str) {
    qb.push("(");
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            qb.push(separator);
        }
        part.render(qb);
    }
    qb.push(")");
}

/// Escapes `%`, `_` and `\` for use in an `ILIKE ... ESCAPE '\'` pattern.
pub fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Compiles requests against one [`TableSpec`].
pub struct SpecificationBuilder<'a> {
    spec: &'a TableSpec,
    limits: &'a FilterLimits,
}

impl<'a> SpecificationBuilder<'a> {
    pub fn new(spec: &'a TableSpec, limits: &'a FilterLimits) -> Self {
        Self { spec, limits }
    }

    /// Builds the `WHERE` predicate: not deleted, the request's criteria and
    /// groups, and every requested scope.
    ///
    /// # Errors
    ///
    /// Returns a [`FilterError`] describing the first field, operator, value
    /// or scope that does not fit the table.
    pub fn compile(&self, request: &FilterRequest) -> Result<Predicate, FilterError> {
        let mut parts = vec![Predicate::Raw("is_deleted = FALSE")];
        parts.push(self.compile_group(&request.root_group())?);

        for name in &request.scopes {
            let scope = self
                .spec
                .scope(name)
                .ok_or_else(|| FilterError::UnknownScope(name.clone()))?;
            parts.push(Predicate::Raw(scope.sql));
        }

        Ok(Predicate::all(parts))
    }

    /// Builds the `ORDER BY` body. `id ASC` is always the last key so that
    /// pages are stable.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::UnknownField`] for a sort field outside the
    /// whitelist.
    pub fn order_by(&self, request: &FilterRequest) -> Result<String, FilterError> {
        if request.sort.is_empty() {
            return Ok(format!("{}, id ASC", self.spec.default_sort));
        }

        let mut keys = Vec::with_capacity(request.sort.len() + 1);
        let mut has_id = false;
        for order in &request.sort {
            let field = self.field(&order.field)?;
            has_id |= field.column == "id";
            let direction = match order.direction {
                SortDirection::Asc => "ASC",
                SortDirection::Desc => "DESC",
            };
            keys.push(format!("{} {direction}", field.column));
        }
        if !has_id {
            keys.push("id ASC".to_string());
        }

        Ok(keys.join(", "))
    }

    fn field(&self, name: &str) -> Result<&FieldSpec, FilterError> {
        self.spec
            .field(name)
            .ok_or_else(|| FilterError::UnknownField(name.to_string()))
    }

    fn compile_group(&self, group: &FilterGroup) -> Result<Predicate, FilterError> {
        let mut parts = Vec::with_capacity(group.criteria.len() + group.groups.len());
        for criterion in &group.criteria {
            parts.push(self.compile_criterion(criterion)?);
        }
        for nested in &group.groups {
            parts.push(self.compile_group(nested)?);
        }

        if parts.is_empty() {
            return Ok(Predicate::True);
        }

        Ok(match group.combinator {
            Combinator::And => Predicate::all(parts),
            Combinator::Or => Predicate::any(parts),
        })
    }

    fn compile_criterion(&self, criterion: &Criterion) -> Result<Predicate, FilterError> {
        let field = self.field(&criterion.field)?;
        let operator = criterion.operator;

        if !field.kind.supports(operator) {
            return Err(FilterError::UnsupportedOperator {
                field: field.name.to_string(),
                operator: operator.as_str().to_string(),
            });
        }

        let column = field.column;
        let predicate = match operator {
            Operator::Eq => compare(column, "=", self.scalar(field, &criterion.value)?),
            Operator::Ne => compare(column, "<>", self.scalar(field, &criterion.value)?),
            Operator::Gt => compare(column, ">", self.scalar(field, &criterion.value)?),
            Operator::Gte => compare(column, ">=", self.scalar(field, &criterion.value)?),
            Operator::Lt => compare(column, "<", self.scalar(field, &criterion.value)?),
            Operator::Lte => compare(column, "<=", self.scalar(field, &criterion.value)?),
            Operator::Contains | Operator::StartsWith | Operator::EndsWith => {
                let text = pattern_text(field, &criterion.value)?;
                let escaped = escape_like(text);
                let pattern = match operator {
                    Operator::Contains => format!("%{escaped}%"),
                    Operator::StartsWith => format!("{escaped}%"),
                    _ => format!("%{escaped}"),
                };
                Predicate::Like { column, pattern }
            }
            Operator::In | Operator::NotIn => Predicate::In {
                column,
                values: self.list(field, &criterion.value)?,
                negated: operator == Operator::NotIn,
            },
            Operator::Between => {
                let (low, high) = self.range(field, &criterion.value)?;
                Predicate::Between { column, low, high }
            }
            Operator::IsNull => Predicate::IsNull {
                column,
                negated: false,
            },
            Operator::IsNotNull => Predicate::IsNull {
                column,
                negated: true,
            },
        };

        Ok(predicate)
    }

    fn scalar(&self, field: &FieldSpec, value: &Value) -> Result<SqlValue, FilterError> {
        if value.is_array() || value.is_object() {
            return Err(invalid(field, "expected a single value"));
        }
        parse_value(field, value)
    }

    fn list(&self, field: &FieldSpec, value: &Value) -> Result<Vec<SqlValue>, FilterError> {
        let items = value
            .as_array()
            .ok_or_else(|| invalid(field, "expected an array"))?;

        if items.is_empty() {
            return Err(invalid(field, "expected at least one value"));
        }
        if items.len() > self.limits.max_list_values {
            return Err(invalid(
                field,
                &format!("at most {} values allowed", self.limits.max_list_values),
            ));
        }

        items.iter().map(|v| self.scalar(field, v)).collect()
    }

    fn range(&self, field: &FieldSpec, value: &Value) -> Result<(SqlValue, SqlValue), FilterError> {
        match value.as_array().map(Vec::as_slice) {
            Some([low, high]) => Ok((self.scalar(field, low)?, self.scalar(field, high)?)),
            _ => Err(invalid(field, "expected an array of two values")),
        }
    }
}

fn compare(column: &'static str, op: &'static str, value: SqlValue) -> Predicate {
    Predicate::Compare { column, op, value }
}

fn invalid(field: &FieldSpec, reason: &str) -> FilterError {
    FilterError::InvalidValue {
        field: field.name.to_string(),
        reason: reason.to_string(),
    }
}

fn pattern_text<'v>(field: &FieldSpec, value: &'v Value) -> Result<&'v str, FilterError> {
    match value.as_str() {
        Some(s) if !s.is_empty() => Ok(s),
        _ => Err(invalid(field, "expected a non-empty string")),
    }
}

fn parse_value(field: &FieldSpec, value: &Value) -> Result<SqlValue, FilterError> {
    if value.is_null() {
        return Err(invalid(field, "null is only allowed with is_null / is_not_null"));
    }

    match field.kind {
        FieldKind::Text => value
            .as_str()
            .map(|s| SqlValue::Text(s.to_string()))
            .ok_or_else(|| invalid(field, "expected a string")),
        FieldKind::Integer => value
            .as_i64()
            .map(SqlValue::Integer)
            .ok_or_else(|| invalid(field, "expected an integer")),
        FieldKind::Boolean => value
            .as_bool()
            .map(SqlValue::Boolean)
            .ok_or_else(|| invalid(field, "expected true or false")),
        FieldKind::Date => value
            .as_str()
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
            .map(SqlValue::Date)
            .ok_or_else(|| invalid(field, "expected a date (YYYY-MM-DD)")),
        FieldKind::Time => value
            .as_str()
            .and_then(|s| {
                NaiveTime::parse_from_str(s, "%H:%M:%S")
                    .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
                    .ok()
            })
            .map(SqlValue::Time)
            .ok_or_else(|| invalid(field, "expected a time (HH:MM or HH:MM:SS)")),
        FieldKind::Timestamp => value
            .as_str()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|t| SqlValue::Timestamp(t.with_timezone(&Utc)))
            .ok_or_else(|| invalid(field, "expected an RFC 3339 timestamp")),
        FieldKind::Enum(members) => match value.as_str() {
            Some(s) if members.iter().any(|m| *m == s) => Ok(SqlValue::Text(s.to_string())),
            _ => Err(invalid(
                field,
                &format!("expected one of: {}", members.join(", ")),
            )),
        },
    }
}
