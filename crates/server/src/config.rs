use anyhow::{bail, Context, Result};

/// Knobs the core consumes via explicit parameters.
///
/// Resolved once at startup; the service functions never read the
/// environment themselves.
#[derive(Debug, Clone, Copy)]
pub struct ServiceConfig {
    /// Reproducibility seed mixed into every salt derivation.
    pub seed: i64,
    /// Probability in [0,1] that a resource terminates as `error`.
    pub failure_rate: f64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            failure_rate: 0.3,
        }
    }
}

impl ServiceConfig {
    /// Read `CI_RUN_SEED` (default 0) and `FAILURE_RATE` (default 0.3).
    pub fn from_env() -> Result<Self> {
        let seed = match std::env::var("CI_RUN_SEED") {
            Ok(raw) => raw
                .trim()
                .parse::<i64>()
                .context("CI_RUN_SEED must be an integer")?,
            Err(_) => 0,
        };

        let failure_rate = match std::env::var("FAILURE_RATE") {
            Ok(raw) => raw
                .trim()
                .parse::<f64>()
                .context("FAILURE_RATE must be a float")?,
            Err(_) => 0.3,
        };
        if !(0.0..=1.0).contains(&failure_rate) {
            bail!("FAILURE_RATE must be in [0,1], got {failure_rate}");
        }

        Ok(Self { seed, failure_rate })
    }
}
