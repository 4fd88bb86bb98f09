//! Error types for Jenkinsfile parsing and rewriting

use thiserror::Error;

/// Errors that can occur while parsing or rewriting a Jenkinsfile
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JenkinsfileError {
    /// Neither dialect marker was found in the file
    #[error("unable to detect the pipeline syntax: no line starts with 'pipeline {{' or 'node {{'")]
    SyntaxUnrecognized,

    /// A section required by the declarative layout is missing
    #[error("no '{section}' section found")]
    StructuralNotFound {
        /// Name of the missing section.
        section: &'static str,
    },

    /// A block opened but never closed before the end of the file
    #[error("unbalanced braces: the block opened at offset {offset} never closes")]
    UnbalancedBlock {
        /// Byte offset of the opening brace.
        offset: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = JenkinsfileError::StructuralNotFound { section: "pipeline" };
        assert_eq!(err.to_string(), "no 'pipeline' section found");

        let err = JenkinsfileError::UnbalancedBlock { offset: 42 };
        assert!(err.to_string().contains("offset 42"));

        let err = JenkinsfileError::SyntaxUnrecognized;
        assert!(err.to_string().contains("pipeline {"));
    }
}
