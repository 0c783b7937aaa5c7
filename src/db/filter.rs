//! Listing query construction.
//!
//! Every piece of SQL text produced here comes from a fixed set of enum
//! variants. User-supplied values only ever travel as bound parameters.

use crate::models::{Status, TaskQueryParams};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    DueDate,
    Priority,
    #[default]
    CreatedAt,
}

impl SortField {
    /// Unknown or missing values fall back to `created_at`.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("due_date") => SortField::DueDate,
            Some("priority") => SortField::Priority,
            _ => SortField::CreatedAt,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// Unknown or missing values fall back to `desc`.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("asc") => SortOrder::Asc,
            _ => SortOrder::Desc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Status,
    StoryPoints,
}

impl Column {
    pub fn as_str(&self) -> &'static str {
        match self {
            Column::Status => "status",
            Column::StoryPoints => "story_points",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Eq,
    Gte,
    Lte,
}

impl Comparator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Comparator::Eq => "=",
            Comparator::Gte => ">=",
            Comparator::Lte => "<=",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindValue {
    Text(String),
    Int(i64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub column: Column,
    pub comparator: Comparator,
    pub value: BindValue,
}

/// Listing constraints after lenient parsing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskFilter {
    pub status: Option<Status>,
    pub story_points_min: Option<i64>,
    pub story_points_max: Option<i64>,
    pub sort_by: SortField,
    pub order: SortOrder,
}

impl TaskFilter {
    /// Never fails: anything unrecognized degrades to its default.
    pub fn from_params(params: &TaskQueryParams) -> Self {
        Self {
            status: params.status.as_deref().and_then(|s| s.parse().ok()),
            story_points_min: parse_non_negative(params.story_points_min.as_deref()),
            story_points_max: parse_non_negative(params.story_points_max.as_deref()),
            sort_by: SortField::parse(params.sort_by.as_deref()),
            order: SortOrder::parse(params.order.as_deref()),
        }
    }

    /// Status first, then the story point bounds. Placeholder numbering
    /// depends on this order.
    pub fn predicates(&self) -> Vec<Predicate> {
        let mut predicates = Vec::new();

        if let Some(status) = self.status {
            predicates.push(Predicate {
                column: Column::Status,
                comparator: Comparator::Eq,
                value: BindValue::Text(status.as_str().to_string()),
            });
        }
        if let Some(min) = self.story_points_min {
            predicates.push(Predicate {
                column: Column::StoryPoints,
                comparator: Comparator::Gte,
                value: BindValue::Int(min),
            });
        }
        if let Some(max) = self.story_points_max {
            predicates.push(Predicate {
                column: Column::StoryPoints,
                comparator: Comparator::Lte,
                value: BindValue::Int(max),
            });
        }

        predicates
    }

    pub fn order_by(&self) -> &'static str {
        match (self.sort_by, self.order) {
            (SortField::DueDate, SortOrder::Asc) => "ORDER BY due_date ASC NULLS LAST",
            (SortField::DueDate, SortOrder::Desc) => "ORDER BY due_date DESC NULLS LAST",
            (SortField::Priority, SortOrder::Asc) => {
                "ORDER BY CASE priority WHEN 'High' THEN 1 WHEN 'Medium' THEN 2 WHEN 'Low' THEN 3 END ASC"
            }
            (SortField::Priority, SortOrder::Desc) => {
                "ORDER BY CASE priority WHEN 'High' THEN 1 WHEN 'Medium' THEN 2 WHEN 'Low' THEN 3 END DESC"
            }
            (SortField::CreatedAt, SortOrder::Asc) => "ORDER BY created_at ASC",
            (SortField::CreatedAt, SortOrder::Desc) => "ORDER BY created_at DESC",
        }
    }

    pub fn build(&self) -> ListQuery {
        ListQuery {
            predicates: self.predicates(),
            order_by: self.order_by(),
        }
    }
}

fn parse_non_negative(raw: Option<&str>) -> Option<i64> {
    raw?.parse::<i64>().ok().filter(|v| *v >= 0)
}

/// The predicates and ordering for one listing call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub predicates: Vec<Predicate>,
    pub order_by: &'static str,
}

impl ListQuery {
    /// `None` when there is nothing to filter on.
    pub fn where_clause(&self) -> Option<String> {
        if self.predicates.is_empty() {
            return None;
        }

        let mut clause = String::from("WHERE ");
        for (i, p) in self.predicates.iter().enumerate() {
            if i > 0 {
                clause.push_str(" AND ");
            }
            clause.push_str(&format!(
                "{} {} ?{}",
                p.column.as_str(),
                p.comparator.as_str(),
                i + 1
            ));
        }
        Some(clause)
    }

    pub fn to_sql(&self, select: &str) -> String {
        match self.where_clause() {
            Some(where_clause) => format!("{} {} {}", select, where_clause, self.order_by),
            None => format!("{} {}", select, self.order_by),
        }
    }

    /// Bound values, in placeholder order.
    pub fn args(&self) -> impl Iterator<Item = &BindValue> {
        self.predicates.iter().map(|p| &p.value)
    }
}
