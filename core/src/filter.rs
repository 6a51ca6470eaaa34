//! View filter over the todo list.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::Todo;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    #[default]
    All,
    Active,
    Completed,
}

impl Filter {
    pub const ALL: [Filter; 3] = [Filter::All, Filter::Active, Filter::Completed];

    pub fn matches(&self, todo: &Todo) -> bool {
        match self {
            Filter::All => true,
            Filter::Active => !todo.completed,
            Filter::Completed => todo.completed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Filter::All => "all",
            Filter::Active => "active",
            Filter::Completed => "completed",
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Filter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" | "" => Ok(Filter::All),
            "active" => Ok(Filter::Active),
            "completed" => Ok(Filter::Completed),
            other => Err(format!("unknown filter: {other}")),
        }
    }
}

/// The todos visible under `mode`, in store order.
pub fn project<'a>(todos: &'a [Todo], mode: Filter) -> Vec<&'a Todo> {
    todos.iter().filter(|todo| mode.matches(todo)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn todos() -> Vec<Todo> {
        [(1, false), (2, true), (3, false)]
            .into_iter()
            .map(|(id, completed)| Todo {
                id,
                owner_id: 1,
                title: format!("t{id}"),
                completed,
            })
            .collect()
    }

    fn ids(todos: Vec<&Todo>) -> Vec<i64> {
        todos.into_iter().map(|t| t.id).collect()
    }

    #[test]
    fn project_by_mode() {
        let todos = todos();
        assert_eq!(ids(project(&todos, Filter::All)), vec![1, 2, 3]);
        assert_eq!(ids(project(&todos, Filter::Active)), vec![1, 3]);
        assert_eq!(ids(project(&todos, Filter::Completed)), vec![2]);
    }

    #[test]
    fn active_and_completed_partition_all() {
        let todos = todos();
        let active = project(&todos, Filter::Active).len();
        let completed = project(&todos, Filter::Completed).len();
        assert_eq!(active + completed, todos.len());
    }

    #[test]
    fn parses_names() {
        for mode in Filter::ALL {
            assert_eq!(mode.as_str().parse::<Filter>().unwrap(), mode);
        }
        assert_eq!(" Active ".parse::<Filter>().unwrap(), Filter::Active);
        assert!("done".parse::<Filter>().is_err());
    }
}
