//! Secret resolution
//!
//! Passwords never live in the configuration file. The file names an
//! environment variable and the value is looked up at startup.

use contracts::ContractError;

/// Read the secret stored in environment variable `name`
///
/// # Errors
/// `ContractError::MissingSecret` when the variable is unset, not valid
/// unicode, or empty.
pub fn resolve_secret(name: &str) -> Result<String, ContractError> {
    match std::env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(ContractError::missing_secret(name)),
    }
}
