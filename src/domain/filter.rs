//! Structured search requests.
//!
//! A [`FilterRequest`] describes *what* to search for without naming any
//! table or column: criteria on public field names, nested AND/OR groups,
//! named scopes, sort orders and a page window. The persistence layer resolves
//! field names against a whitelist and renders the request into SQL (see
//! [`crate::infrastructure::persistence::specification`]).
//!
//! # Wire format
//!
//! ```json
//! {
//!   "combinator": "and",
//!   "criteria": [
//!     { "field": "appointment_date", "operator": "between", "value": ["2026-11-01", "2026-11-30"] }
//!   ],
//!   "groups": [
//!     {
//!       "combinator": "or",
//!       "criteria": [
//!         { "field": "status", "operator": "eq", "value": "scheduled" },
//!         { "field": "status", "operator": "eq", "value": "completed" }
//!       ]
//!     }
//!   ],
//!   "scopes": ["upcoming"],
//!   "sort": [{ "field": "appointment_date", "direction": "desc" }],
//!   "page": 1,
//!   "size": 20
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Comparison applied by a single [`Criterion`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Contains,
    StartsWith,
    EndsWith,
    In,
    NotIn,
    Between,
    IsNull,
    IsNotNull,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Ne => "ne",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::Contains => "contains",
            Operator::StartsWith => "starts_with",
            Operator::EndsWith => "ends_with",
            Operator::In => "in",
            Operator::NotIn => "not_in",
            Operator::Between => "between",
            Operator::IsNull => "is_null",
            Operator::IsNotNull => "is_not_null",
        }
    }

    /// Operators that match text patterns.
    pub fn is_pattern(&self) -> bool {
        matches!(
            self,
            Operator::Contains | Operator::StartsWith | Operator::EndsWith
        )
    }

    /// Operators that rely on an ordering of values.
    pub fn is_ordering(&self) -> bool {
        matches!(
            self,
            Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte | Operator::Between
        )
    }
}

/// How sibling criteria and groups are joined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Combinator {
    #[default]
    And,
    Or,
}

/// A single `field operator value` condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Criterion {
    pub field: String,
    pub operator: Operator,
    #[serde(default)]
    pub value: Value,
}

impl Criterion {
    pub fn new(field: impl Into<String>, operator: Operator, value: Value) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
        }
    }
}

/// A parenthesised set of criteria and sub-groups.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterGroup {
    #[serde(default)]
    pub combinator: Combinator,
    #[serde(default)]
    pub criteria: Vec<Criterion>,
    #[serde(default)]
    pub groups: Vec<FilterGroup>,
}

impl FilterGroup {
    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty() && self.groups.iter().all(FilterGroup::is_empty)
    }

    /// Number of criteria in this group and every nested group.
    pub fn criteria_count(&self) -> usize {
        self.criteria.len()
            + self
                .groups
                .iter()
                .map(FilterGroup::criteria_count)
                .sum::<usize>()
    }

    /// Nesting depth; a group without sub-groups has depth 1.
    pub fn depth(&self) -> usize {
        1 + self.groups.iter().map(FilterGroup::depth).max().unwrap_or(0)
    }

    fn criteria_iter(&self) -> Box<dyn Iterator<Item = &Criterion> + '_> {
        Box::new(
            self.criteria
                .iter()
                .chain(self.groups.iter().flat_map(|g| g.criteria_iter())),
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOrder {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

pub const DEFAULT_PAGE_SIZE: u32 = 20;

fn default_page() -> u32 {
    1
}

fn default_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

/// Structured query description converted to a database predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterRequest {
    #[serde(default)]
    pub combinator: Combinator,
    #[serde(default)]
    pub criteria: Vec<Criterion>,
    #[serde(default)]
    pub groups: Vec<FilterGroup>,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub sort: Vec<SortOrder>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_size")]
    pub size: u32,
}

impl Default for FilterRequest {
    fn default() -> Self {
        Self {
            combinator: Combinator::And,
            criteria: Vec::new(),
            groups: Vec::new(),
            scopes: Vec::new(),
            sort: Vec::new(),
            page: default_page(),
            size: default_size(),
        }
    }
}

impl FilterRequest {
    /// Empty filter returning the given page.
    pub fn page(page: u32, size: u32) -> Self {
        Self {
            page,
            size,
            ..Default::default()
        }
    }

    pub fn with_criterion(mut self, criterion: Criterion) -> Self {
        self.criteria.push(criterion);
        self
    }

    pub fn with_group(mut self, group: FilterGroup) -> Self {
        self.groups.push(group);
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scopes.push(scope.into());
        self
    }

    pub fn with_sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort.push(SortOrder {
            field: field.into(),
            direction,
        });
        self
    }

    /// The top level of the request viewed as a group.
    pub fn root_group(&self) -> FilterGroup {
        FilterGroup {
            combinator: self.combinator,
            criteria: self.criteria.clone(),
            groups: self.groups.clone(),
        }
    }

    /// Row offset of the requested page.
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.size)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.size)
    }

    /// Checks the structural limits of the request.
    ///
    /// Field names, operators and values are checked later against the
    /// table whitelist; this only bounds the size of the request.
    pub fn validate(&self, limits: &FilterLimits) -> Result<(), FilterError> {
        if self.page == 0 {
            return Err(FilterError::Limit("page must be greater than 0".to_string()));
        }

        if self.size == 0 || self.size > limits.max_page_size {
            return Err(FilterError::Limit(format!(
                "size must be between 1 and {}",
                limits.max_page_size
            )));
        }

        let root = self.root_group();

        let count = root.criteria_count();
        if count > limits.max_criteria {
            return Err(FilterError::Limit(format!(
                "too many criteria ({count}, max {})",
                limits.max_criteria
            )));
        }

        // The root itself does not count as a nesting level.
        let depth = root.depth() - 1;
        if depth > limits.max_depth {
            return Err(FilterError::Limit(format!(
                "groups nested too deeply ({depth}, max {})",
                limits.max_depth
            )));
        }

        if self.scopes.len() > limits.max_scopes {
            return Err(FilterError::Limit(format!(
                "too many scopes ({}, max {})",
                self.scopes.len(),
                limits.max_scopes
            )));
        }

        if let Some(blank) = root
            .criteria_iter()
            .map(|c| c.field.as_str())
            .chain(self.sort.iter().map(|s| s.field.as_str()))
            .find(|f| f.trim().is_empty())
        {
            return Err(FilterError::UnknownField(blank.to_string()));
        }

        Ok(())
    }
}

/// Upper bounds applied to every search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterLimits {
    pub max_page_size: u32,
    pub max_criteria: usize,
    pub max_depth: usize,
    pub max_list_values: usize,
    pub max_scopes: usize,
}

impl Default for FilterLimits {
    fn default() -> Self {
        Self {
            max_page_size: 100,
            max_criteria: 50,
            max_depth: 4,
            max_list_values: 100,
            max_scopes: 8,
        }
    }
}

/// Reasons a filter request cannot be turned into a query.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    #[error("unknown field '{0}'")]
    UnknownField(String),

    #[error("unknown scope '{0}'")]
    UnknownScope(String),

    #[error("operator '{operator}' is not supported for field '{field}'")]
    UnsupportedOperator { field: String, operator: String },

    #[error("invalid value for field '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("{0}")]
    Limit(String),
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_items: i64,
    pub total_pages: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, page: u32, size: u32, total_items: i64) -> Self {
        let total_pages = if size == 0 || total_items <= 0 {
            0
        } else {
            ((total_items + i64::from(size) - 1) / i64::from(size)) as u32
        };

        Self {
            items,
            page,
            size,
            total_items,
            total_pages,
        }
    }

    pub fn empty(page: u32, size: u32) -> Self {
        Self::new(Vec::new(), page, size, 0)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_items: self.total_items,
            total_pages: self.total_pages,
        }
    }
}
