//! Customer identity collected on the checkout form.
//!
//! Validation is all-or-nothing: [`CustomerForm::validate`] checks every
//! field and reports each failure so the form can flag all of them at once.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{Email, EmailError};

/// Errors that can occur when parsing a [`CustomerName`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    #[error("name must be at least {min} characters")]
    TooShort { min: usize },
    #[error("name must be at most {max} characters")]
    TooLong { max: usize },
}

/// A customer's display name, trimmed, 3-100 characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerName(String);

impl CustomerName {
    pub const MIN_LENGTH: usize = 3;
    pub const MAX_LENGTH: usize = 100;

    /// Parse a name, counting characters rather than bytes.
    ///
    /// # Errors
    ///
    /// Returns `NameError` if the trimmed name is shorter than 3 or longer
    /// than 100 characters.
    pub fn parse(s: &str) -> Result<Self, NameError> {
        let trimmed = s.trim();
        let len = trimmed.chars().count();

        if len < Self::MIN_LENGTH {
            return Err(NameError::TooShort {
                min: Self::MIN_LENGTH,
            });
        }
        if len > Self::MAX_LENGTH {
            return Err(NameError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        Ok(Self(trimmed.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CustomerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Raw checkout form input, exactly as submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

/// Validated customer identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub name: CustomerName,
    pub email: Email,
}

/// Field-level validation failures for the checkout form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CustomerErrors {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl CustomerErrors {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none()
    }
}

impl fmt::Display for CustomerErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = [self.name.as_deref(), self.email.as_deref()]
            .into_iter()
            .flatten()
            .collect();
        f.write_str(&messages.join("; "))
    }
}

impl std::error::Error for CustomerErrors {}

impl CustomerForm {
    /// Validate every field.
    ///
    /// # Errors
    ///
    /// Returns `CustomerErrors` with a message for each invalid field.
    pub fn validate(&self) -> Result<CustomerInfo, CustomerErrors> {
        let name = CustomerName::parse(&self.name);
        let email = Email::parse(&self.email);

        match (name, email) {
            (Ok(name), Ok(email)) => Ok(CustomerInfo { name, email }),
            (name, email) => Err(CustomerErrors {
                name: name.err().map(|e| name_message(&e)),
                email: email.err().map(|e| email_message(&e)),
            }),
        }
    }
}

fn name_message(err: &NameError) -> String {
    match err {
        NameError::TooShort { min } => format!("El nombre debe tener al menos {min} caracteres"),
        NameError::TooLong { max } => format!("El nombre no puede superar {max} caracteres"),
    }
}

fn email_message(err: &EmailError) -> String {
    match err {
        EmailError::Empty => "El email es obligatorio".to_string(),
        _ => "Introduce un email válido".to_string(),
    }
}
