use crate::validation::{ConfigValidator, ValidationUtils};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DispatchSettings {
    pub requester: String,
    /// 无需任何前置校验即可直接派发的动作
    pub unconditioned_actions: Vec<String>,
    pub action_duration_estimate_ms: u64,
    pub couple_estimated_duration_secs: u64,
    pub min_coupled_robots: u32,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            requester: "rmf_demos_tasks".to_string(),
            unconditioned_actions: vec!["arm_action".to_string()],
            action_duration_estimate_ms: 60000,
            couple_estimated_duration_secs: 60,
            min_coupled_robots: 2,
        }
    }
}

impl DispatchSettings {
    pub fn is_unconditioned(&self, action: &str) -> bool {
        self.unconditioned_actions.iter().any(|a| a == action)
    }
}

impl ConfigValidator for DispatchSettings {
    fn validate(&self) -> crate::ConfigResult<()> {
        ValidationUtils::validate_not_empty(&self.requester, "dispatch.requester")?;
        ValidationUtils::validate_entries_not_empty(
            &self.unconditioned_actions,
            "dispatch.unconditioned_actions",
        )?;

        if self.action_duration_estimate_ms == 0 {
            return Err(crate::ConfigError::Validation(
                "dispatch.action_duration_estimate_ms must be greater than 0".to_string(),
            ));
        }

        if self.min_coupled_robots < 2 {
            return Err(crate::ConfigError::Validation(
                "dispatch.min_coupled_robots must be at least 2".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unconditioned_actions() {
        let settings = DispatchSettings::default();
        assert!(settings.is_unconditioned("arm_action"));
        assert!(!settings.is_unconditioned("scan"));
    }

    #[test]
    fn test_dispatch_settings_validation() {
        assert!(DispatchSettings::default().validate().is_ok());

        let settings = DispatchSettings {
            min_coupled_robots: 1,
            ..DispatchSettings::default()
        };
        assert!(settings.validate().is_err());
    }
}
