// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for rq-core operations.

use thiserror::Error;

/// All possible errors that can occur in rq-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("requirement not found: {0}")]
    RequirementNotFound(String),

    #[error("hierarchy references unknown record '{0}'\n  hint: the source hierarchy is inconsistent with its record list")]
    UnknownHierarchyRef(String),

    #[error("record '{0}' appears more than once in the hierarchy")]
    DuplicateHierarchyRef(String),

    #[error("cannot move {node} under {parent}\n  hint: a record cannot become a descendant of itself")]
    HierarchyCycle { node: String, parent: String },

    #[error("invalid category: '{0}'\n  hint: valid categories are: {valid}", valid = crate::requirement::Category::valid_values())]
    InvalidCategory(String),

    #[error("invalid status: '{0}'\n  hint: valid statuses are: {valid}", valid = crate::requirement::Status::valid_values())]
    InvalidStatus(String),

    #[error("invalid customer status: '{0}'\n  hint: valid customer statuses are: {valid}", valid = crate::requirement::CustomerStatus::valid_values())]
    InvalidCustomerStatus(String),

    #[error("invalid ASIL: '{0}'\n  hint: valid levels are: {valid}", valid = crate::requirement::Asil::valid_values())]
    InvalidAsil(String),

    #[error("invalid test level: '{0}'\n  hint: valid test levels are: {valid}", valid = crate::requirement::TestLevel::valid_values())]
    InvalidTestLevel(String),

    #[error("unknown attribute: '{0}'")]
    UnknownAttribute(String),
}

/// A specialized Result type for rq-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
