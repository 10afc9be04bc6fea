use analytics_core::AppConfig;
use anyhow::Result;

/// Prints the resolved configuration with every credential masked.
///
/// # Errors
/// Returns an error if the configuration cannot be serialized.
pub fn run_show_config(config: &AppConfig) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&config.redacted())?);
    Ok(())
}
