use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum TodoPriority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum TodoStatus {
    Pending,
    Done,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Todo {
    pub id: u64,
    pub employee_id: u64,
    pub title: String,
    pub due_date: Option<NaiveDate>,
    pub priority: TodoPriority,
    pub status: TodoStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTodo {
    pub employee_id: u64,
    pub title: String,
    pub due_date: Option<NaiveDate>,
    pub priority: TodoPriority,
}

/// Partial update; `None` leaves the field as it is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TodoChanges {
    pub title: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub priority: Option<TodoPriority>,
    pub status: Option<TodoStatus>,
}

impl Todo {
    /// Applies `changes` on top of the current row, producing the full row sent back.
    pub fn merged(&self, changes: &TodoChanges) -> Todo {
        Todo {
            id: self.id,
            employee_id: self.employee_id,
            title: changes.title.clone().unwrap_or_else(|| self.title.clone()),
            due_date: changes.due_date.or(self.due_date),
            priority: changes.priority.unwrap_or(self.priority),
            status: changes.status.unwrap_or(self.status),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_only_touches_given_fields() {
        let todo = Todo {
            id: 3,
            employee_id: 1000,
            title: "Submit timesheet".into(),
            due_date: NaiveDate::from_ymd_opt(2024, 3, 1),
            priority: TodoPriority::Low,
            status: TodoStatus::Pending,
        };
        let merged = todo.merged(&TodoChanges {
            status: Some(TodoStatus::Done),
            ..Default::default()
        });
        assert_eq!(merged.status, TodoStatus::Done);
        assert_eq!(merged.title, "Submit timesheet");
        assert_eq!(merged.priority, TodoPriority::Low);
        assert_eq!(merged.due_date, todo.due_date);
    }
}
