use audit_config::load_config;
use audit_config::shared::AuditorConfig;

/// Loads and validates the auditor configuration.
///
/// Uses the standard hierarchical loading mechanism from [`audit_config`] and
/// validates the resulting [`AuditorConfig`] before returning it.
pub fn load_auditor_config() -> anyhow::Result<AuditorConfig> {
    let config = load_config::<AuditorConfig>()?;
    config.validate()?;

    Ok(config)
}
