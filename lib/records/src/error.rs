//! Validation errors for record requests.
//!
//! The `Display` text of each variant is the message returned to API clients.

use std::fmt;

/// A create or update request was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// A create request omitted a field or sent it empty.
    MissingFields,
    /// An update request carried no usable field.
    NoChanges,
    InvalidEmail,
    InvalidGender,
    InvalidAgeGroup,
    /// Another patient already uses the email address.
    DuplicateEmail,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            Self::MissingFields => "All fields are required",
            Self::NoChanges => "At least one field must be provided",
            Self::InvalidEmail => "Invalid email format",
            Self::InvalidGender => "Invalid gender. Must be Male, Female, or Other",
            Self::InvalidAgeGroup => "Invalid ageGroup. Must be 18-30, 31-50, or 51+",
            Self::DuplicateEmail => "Email already exists",
        };
        f.write_str(message)
    }
}

impl std::error::Error for ValidationError {}
