//! Order key assignment for a sibling list.
//!
//! Keys are rank based: walking the final list, the n-th member gets `n * step`.
//! Only siblings whose key changes are reported back for rewriting.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::core::OrderKey;
use crate::operation::error::OperationError;

/// Where a member goes among its siblings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InsertPosition {
    First,
    Last,
    Before(String),
    After(String),
}

impl InsertPosition {
    /// Sibling name the position refers to
    pub fn target(&self) -> Option<&str> {
        match self {
            InsertPosition::Before(target) | InsertPosition::After(target) => Some(target),
            _ => None,
        }
    }
}

impl fmt::Display for InsertPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InsertPosition::First => write!(f, "first"),
            InsertPosition::Last => write!(f, "last"),
            InsertPosition::Before(target) => write!(f, "before:{}", target),
            InsertPosition::After(target) => write!(f, "after:{}", target),
        }
    }
}

impl FromStr for InsertPosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some(("before", target)) if !target.is_empty() => {
                Ok(InsertPosition::Before(target.to_string()))
            }
            Some(("after", target)) if !target.is_empty() => {
                Ok(InsertPosition::After(target.to_string()))
            }
            None if s == "first" => Ok(InsertPosition::First),
            None if s == "last" => Ok(InsertPosition::Last),
            _ => Err(format!(
                "invalid position {:?} (expected first, last, before:NAME or after:NAME)",
                s
            )),
        }
    }
}

/// An existing member as seen by the assigner
#[derive(Debug, Clone, PartialEq)]
pub struct Sibling {
    pub name: String,
    pub order: Option<OrderKey>,
}

impl Sibling {
    pub fn new(name: impl Into<String>, order: Option<OrderKey>) -> Self {
        Self {
            name: name.into(),
            order,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderAssignment {
    /// Key of the new member
    pub key: OrderKey,
    /// Sibling to place the new member before; `None` appends to the container
    pub anchor: Option<String>,
    /// Existing siblings whose key must change
    pub reassignments: Vec<(String, OrderKey)>,
}

#[derive(Debug, Clone, Copy)]
pub struct OrderKeyAssigner {
    step: f64,
}

impl Default for OrderKeyAssigner {
    fn default() -> Self {
        Self { step: 10.0 }
    }
}

impl OrderKeyAssigner {
    pub fn new(step: f64) -> Self {
        Self { step }
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn assign(
        &self,
        siblings: &[Sibling],
        position: &InsertPosition,
    ) -> Result<OrderAssignment, OperationError> {
        let target_index = match position.target() {
            Some(target) => Some(
                siblings
                    .iter()
                    .position(|sibling| sibling.name == target)
                    .ok_or_else(|| OperationError::target_not_found(target))?,
            ),
            None => None,
        };

        // Index in the final list at which the new member lands
        let slot = match (position, target_index) {
            (InsertPosition::First, _) => 0,
            (InsertPosition::Last, _) => siblings.len(),
            (InsertPosition::Before(_), Some(index)) => index,
            (InsertPosition::After(_), Some(index)) => index + 1,
            _ => siblings.len(),
        };

        let mut reassignments = Vec::new();
        for (index, sibling) in siblings.iter().enumerate() {
            let rank = if index < slot { index + 1 } else { index + 2 };
            let key = OrderKey::nth(rank, self.step);
            if sibling.order != Some(key) {
                reassignments.push((sibling.name.clone(), key));
            }
        }

        let assignment = OrderAssignment {
            key: OrderKey::nth(slot + 1, self.step),
            anchor: siblings.get(slot).map(|sibling| sibling.name.clone()),
            reassignments,
        };
        debug!(
            "Assigned order {} at {} ({} siblings rekeyed)",
            assignment.key,
            position,
            assignment.reassignments.len()
        );
        Ok(assignment)
    }
}

impl OrderKeyAssigner {
    /// Rank keys for `siblings` after one of them left; only changed keys are returned
    pub fn compact(&self, siblings: &[Sibling]) -> Vec<(String, OrderKey)> {
        siblings
            .iter()
            .enumerate()
            .filter_map(|(index, sibling)| {
                let key = OrderKey::nth(index + 1, self.step);
                (sibling.order != Some(key)).then(|| (sibling.name.clone(), key))
            })
            .collect()
    }
}
