//! Configuration validation
//!
//! Validates each section after parsing:
//! - Attribute name, when given, is non-empty
//! - Channel count is a positive integer within range
//! - Queue size and metrics interval are non-zero

use crate::Config;
use crate::error::Result;

/// Validate the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    config.distributor.validate()?;
    config.pipeline.validate()?;
    config.metrics.validate()?;

    if config.distributor.attribute_name.is_none() {
        tracing::debug!("no attribute_name in config; it must be supplied before routing");
    }

    Ok(())
}
