//! Engine configuration.

/// Ledger engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum read-compute-commit cycles per balance mutation before the
    /// operation fails with a transient-conflict error.
    pub max_commit_attempts: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_commit_attempts: 5,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(attempts) = std::env::var("TELLER_MAX_COMMIT_ATTEMPTS") {
            if let Ok(attempts) = attempts.parse() {
                config.max_commit_attempts = attempts;
            }
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_commit_attempts == 0 {
            return Err("Commit attempt budget cannot be 0".to_string());
        }

        Ok(())
    }
}
