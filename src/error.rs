// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Error types for bitsketch operations

use std::fmt;
use std::io;

/// The failure classes an [`Error`] can carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A structure was configured with out-of-range or inconsistent
    /// parameters (address bits outside `6..=46`, a band width larger than
    /// the register count, schedule arrays of different lengths, ...).
    Configuration,
    /// A value does not fit the serialized representation (more than 255
    /// seeds, or a hash count wider than the header byte).
    Capacity,
    /// A set operation was attempted between filters built with different
    /// parameters.
    MismatchedParameters,
    /// A sketch was presented with the wrong number of registers.
    SizeMismatch,
    /// The underlying storage failed during a read or write.
    Io,
}

impl ErrorKind {
    /// The name of this kind as a static string.
    pub const fn into_static(self) -> &'static str {
        match self {
            ErrorKind::Configuration => "Configuration",
            ErrorKind::Capacity => "Capacity",
            ErrorKind::MismatchedParameters => "MismatchedParameters",
            ErrorKind::SizeMismatch => "SizeMismatch",
            ErrorKind::Io => "Io",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.into_static())
    }
}

/// The error type returned by every fallible bitsketch operation.
///
/// Carries a [`ErrorKind`], a message, and optional key/value context
/// identifying the inputs that triggered the failure.
///
/// # Examples
///
/// ```
/// # use bitsketch::error::Error;
/// # use bitsketch::error::ErrorKind;
/// let err = Error::new(ErrorKind::Configuration, "bad input");
/// assert_eq!(err.kind(), ErrorKind::Configuration);
/// assert_eq!(err.message(), "bad input");
/// ```
pub struct Error {
    kind: ErrorKind,
    message: String,
    context: Vec<(&'static str, String)>,
}

impl Error {
    /// Creates an error of the given kind with a human-readable message.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            context: Vec::new(),
        }
    }

    /// Attaches a key/value pair describing where the error arose.
    pub fn with_context(mut self, key: &'static str, value: impl ToString) -> Self {
        self.context.push((key, value.to_string()));
        self
    }

    /// The failure class of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The human-readable message this error carries.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }
}

// Convenience constructors, one per failure class.
impl Error {
    pub(crate) fn configuration(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, msg)
    }

    pub(crate) fn capacity(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Capacity, msg)
    }

    pub(crate) fn mismatched_parameters(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::MismatchedParameters, msg)
    }

    pub(crate) fn size_mismatch(expected: usize, actual: usize) -> Self {
        Self::new(ErrorKind::SizeMismatch, "wrong register count")
            .with_context("expected", expected)
            .with_context("actual", actual)
    }

    pub(crate) fn insufficient_data(field: impl fmt::Display) -> Self {
        Self::new(ErrorKind::Io, format!("insufficient data: {field}"))
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self::new(ErrorKind::Io, err.to_string())
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // {:#?} gets the structural form; {:?} a compact multi-line report.
        if f.alternate() {
            return f
                .debug_struct("Error")
                .field("kind", &self.kind)
                .field("message", &self.message)
                .field("context", &self.context)
                .finish();
        }

        write!(f, "{}", self.kind)?;
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        for (key, value) in &self.context {
            write!(f, "\n    {key} = {value}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if !self.context.is_empty() {
            write!(f, " (")?;
            for (i, (key, value)) in self.context.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {}
