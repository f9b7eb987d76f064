// /////////////////////////////////////////////////////////////////////////////
// Pipeline Flow Engine
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Security validation layer: every path and free-form string argument
//! passes through here before it reaches a use case, so a folder alias or a
//! pipeline path can never carry a shell metacharacter or directory-traversal
//! sequence into a command built later downstream.

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ParseError {
    #[error("path does not exist: {0}")]
    PathNotFound(String),

    #[error("invalid argument \"{0}\": {1}")]
    InvalidArgument(String, &'static str),

    #[error("CLI parsing failed: {0}")]
    ClapError(String),
}

const DANGEROUS_CHARS: &[char] = &[';', '|', '&', '$', '`', '\n', '\r', '<', '>'];

pub struct SecureArgParser;

impl SecureArgParser {
    /// Validates that `raw` exists on disk and contains no shell
    /// metacharacters or `..` traversal segments, returning its canonical
    /// form.
    pub fn validate_path(raw: &str) -> Result<PathBuf, ParseError> {
        Self::validate_argument(raw)?;
        let path = Path::new(raw);
        if !path.exists() {
            return Err(ParseError::PathNotFound(raw.to_string()));
        }
        path.canonicalize().map_err(|_| ParseError::PathNotFound(raw.to_string()))
    }

    /// Validates a free-form string argument (a path that may not exist yet,
    /// a folder alias, a log-format name): no shell metacharacters, no `..`
    /// traversal, non-empty.
    pub fn validate_argument(raw: &str) -> Result<(), ParseError> {
        if raw.is_empty() {
            return Err(ParseError::InvalidArgument(raw.to_string(), "must not be empty"));
        }
        if raw.chars().any(|c| DANGEROUS_CHARS.contains(&c)) {
            return Err(ParseError::InvalidArgument(raw.to_string(), "contains a disallowed character"));
        }
        if raw.split(['/', '\\']).any(|segment| segment == "..") {
            return Err(ParseError::InvalidArgument(raw.to_string(), "directory traversal is not allowed"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_argument() {
        assert!(SecureArgParser::validate_argument("").is_err());
    }

    #[test]
    fn rejects_shell_metacharacters() {
        assert!(SecureArgParser::validate_argument("foo; rm -rf /").is_err());
    }

    #[test]
    fn rejects_directory_traversal() {
        assert!(SecureArgParser::validate_argument("../../etc/passwd").is_err());
    }

    #[test]
    fn accepts_plain_relative_path() {
        assert!(SecureArgParser::validate_argument("folders/incoming.json").is_ok());
    }

    #[test]
    fn validate_path_rejects_missing_file() {
        assert!(matches!(SecureArgParser::validate_path("/nonexistent/definitely/missing.json"), Err(ParseError::PathNotFound(_))));
    }
}
