#![forbid(unsafe_code)]

//! Query error model.
//!
//! # Design Principles
//!
//! 1. **Usage errors are values**: a single-node operation on the wrong
//!    number of nodes, an index past the end, or a state operation on a node
//!    without an instance returns `Err`, never panics.
//! 2. **Name the call**: every variant carries the operation (and argument,
//!    where there is one) so a failing assertion reads like the call site.
//! 3. **Absence is not an error**: missing attributes, missing handlers and
//!    absent structure come back as `None`/`false`/empty instead.
//!
//! Nodes beyond the depth budget are never an error: they are replaced by
//! inert placeholders before they can run.

use std::fmt;

/// Error raised by a query operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// A single-node operation ran on a result holding zero or several nodes.
    NotSingleNode {
        operation: &'static str,
        argument: Option<String>,
        found: usize,
    },
    /// `at(index)` past the end of the result.
    IndexOutOfRange {
        operation: &'static str,
        index: usize,
        len: usize,
    },
    /// `first()`/`last()` on an empty result.
    EmptyResult { operation: &'static str },
    /// The node is not a component reference.
    NotComponent { operation: &'static str },
    /// The node is a component but has no live stateful instance.
    NoInstance {
        operation: &'static str,
        component: String,
    },
}

/// Standard result type for query APIs.
pub type Result<T> = std::result::Result<T, QueryError>;

impl QueryError {
    /// The operation that failed, e.g. `"attr"`.
    #[must_use]
    pub fn operation(&self) -> &'static str {
        match self {
            Self::NotSingleNode { operation, .. }
            | Self::IndexOutOfRange { operation, .. }
            | Self::EmptyResult { operation }
            | Self::NotComponent { operation }
            | Self::NoInstance { operation, .. } => operation,
        }
    }

    /// Error type label for tracing.
    #[must_use]
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::NotSingleNode { .. } => "not_single_node",
            Self::IndexOutOfRange { .. } => "index_out_of_range",
            Self::EmptyResult { .. } => "empty_result",
            Self::NotComponent { .. } => "not_component",
            Self::NoInstance { .. } => "no_instance",
        }
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotSingleNode {
                operation,
                argument,
                found,
            } => {
                let argument = argument.as_deref().unwrap_or_default();
                write!(
                    f,
                    "rspy: .{operation}({argument}) needs exactly 1 result, found {found}"
                )
            }
            Self::IndexOutOfRange {
                operation,
                index,
                len,
            } => write!(
                f,
                "rspy: .{operation}({index}) needs at least {} results, found {len}",
                index + 1
            ),
            Self::EmptyResult { operation } => {
                write!(f, "rspy: .{operation}() needs at least one result")
            }
            Self::NotComponent { operation } => write!(
                f,
                "rspy: .{operation}() needs a function or stateful component node"
            ),
            Self::NoInstance {
                operation,
                component,
            } => write!(
                f,
                "rspy: .{operation}() found no stateful instance for <{component}>"
            ),
        }
    }
}

impl std::error::Error for QueryError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_call() {
        let err = QueryError::NotSingleNode {
            operation: "attr",
            argument: Some("class".into()),
            found: 2,
        };
        assert_eq!(
            err.to_string(),
            "rspy: .attr(class) needs exactly 1 result, found 2"
        );
        assert_eq!(err.operation(), "attr");

        let err = QueryError::IndexOutOfRange {
            operation: "at",
            index: 2,
            len: 2,
        };
        assert_eq!(
            err.to_string(),
            "rspy: .at(2) needs at least 3 results, found 2"
        );
        assert_eq!(err.error_type(), "index_out_of_range");
    }

    #[test]
    fn instance_errors_name_the_component() {
        let err = QueryError::NoInstance {
            operation: "component",
            component: "Label".into(),
        };
        assert_eq!(
            err.to_string(),
            "rspy: .component() found no stateful instance for <Label>"
        );
    }
}
