use crate::{ConfigError, ConfigResult};

/// Trait for configuration validation
pub trait ConfigValidator {
    fn validate(&self) -> ConfigResult<()>;
}

/// General validation utilities
pub struct ValidationUtils;

impl ValidationUtils {
    /// Validate that a string is not empty
    pub fn validate_not_empty(value: &str, field_name: &str) -> ConfigResult<()> {
        if value.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "{field_name} cannot be empty"
            )));
        }
        Ok(())
    }

    /// Validate that a millisecond timeout is within (0, 1h]
    pub fn validate_timeout_ms(timeout_ms: u64, field_name: &str) -> ConfigResult<()> {
        if timeout_ms == 0 {
            return Err(ConfigError::Validation(format!(
                "{field_name} must be greater than 0"
            )));
        }
        if timeout_ms > 3_600_000 {
            return Err(ConfigError::Validation(format!(
                "{field_name} must be less than or equal to 3600000 ms"
            )));
        }
        Ok(())
    }

    /// Validate that every entry of a list is non-empty
    pub fn validate_entries_not_empty(values: &[String], field_name: &str) -> ConfigResult<()> {
        for value in values {
            Self::validate_not_empty(value, field_name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_timeout_ms_bounds() {
        assert!(ValidationUtils::validate_timeout_ms(0, "t").is_err());
        assert!(ValidationUtils::validate_timeout_ms(1, "t").is_ok());
        assert!(ValidationUtils::validate_timeout_ms(3_600_000, "t").is_ok());
        assert!(ValidationUtils::validate_timeout_ms(3_600_001, "t").is_err());
    }

    #[test]
    fn test_validate_not_empty() {
        assert!(ValidationUtils::validate_not_empty("  ", "name").is_err());
        assert!(ValidationUtils::validate_not_empty("a", "name").is_ok());
        let err = ValidationUtils::validate_entries_not_empty(
            &["ok".to_string(), "".to_string()],
            "list",
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Validation error: list cannot be empty");
    }
}
