// Copyright 2026 The Hive Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0

//! Status/error types shared across the workspace.
//!
//! Fallible operations return `Result<T, RayError>`; the code discriminates
//! the failure class for callers that branch on it (timeouts, invalid
//! arguments, dead actors).

use std::fmt;

/// Failure classes for cross-component errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i8)]
pub enum StatusCode {
    Ok = 0,
    OutOfMemory = 1,
    KeyError = 2,
    Invalid = 4,
    IoError = 5,
    UnknownError = 9,
    NotImplemented = 10,
    TimedOut = 12,
    Interrupted = 13,
    NotFound = 17,
    Disconnected = 18,
    ObjectExists = 21,
    ObjectNotFound = 22,
    ObjectAlreadySealed = 23,
    ObjectStoreFull = 24,
    ObjectUnknownOwner = 29,
    RpcError = 30,
}

impl StatusCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::OutOfMemory => "OutOfMemory",
            Self::KeyError => "KeyError",
            Self::Invalid => "Invalid",
            Self::IoError => "IOError",
            Self::UnknownError => "UnknownError",
            Self::NotImplemented => "NotImplemented",
            Self::TimedOut => "TimedOut",
            Self::Interrupted => "Interrupted",
            Self::NotFound => "NotFound",
            Self::Disconnected => "Disconnected",
            Self::ObjectExists => "ObjectExists",
            Self::ObjectNotFound => "ObjectNotFound",
            Self::ObjectAlreadySealed => "ObjectAlreadySealed",
            Self::ObjectStoreFull => "ObjectStoreFull",
            Self::ObjectUnknownOwner => "ObjectUnknownOwner",
            Self::RpcError => "RpcError",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The primary error type for cross-component operations.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{code}: {message}")]
pub struct RayError {
    pub code: StatusCode,
    pub message: String,
}

impl RayError {
    pub fn new(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::new(StatusCode::Invalid, message)
    }

    pub fn io_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::IoError, message)
    }

    pub fn timed_out(message: impl Into<String>) -> Self {
        Self::new(StatusCode::TimedOut, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NotFound, message)
    }

    pub fn is_timed_out(&self) -> bool {
        self.code == StatusCode::TimedOut
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RayError::invalid("duplicate object IDs");
        assert_eq!(err.to_string(), "Invalid: duplicate object IDs");
        assert_eq!(err.code, StatusCode::Invalid);
    }

    #[test]
    fn test_timed_out_predicate() {
        assert!(RayError::timed_out("get").is_timed_out());
        assert!(!RayError::io_error("x").is_timed_out());
    }
}
