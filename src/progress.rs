use std::{borrow::Cow, time::Duration};

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};

const TICK_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct ProgressConfig {
    is_enabled: bool,
    template: String,
}

impl ProgressConfig {
    pub fn new(is_enabled: bool, template: String) -> Self {
        ProgressConfig {
            is_enabled,
            template,
        }
    }

    pub fn disabled() -> Self {
        ProgressConfig {
            is_enabled: false,
            template: "".to_string(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.is_enabled
    }

    pub fn style(&self) -> Result<ProgressStyle> {
        Ok(ProgressStyle::default_spinner().template(&self.template)?)
    }

    /// Spinner that ticks on its own until finished
    pub fn build_spinner(&self, message: impl Into<Cow<'static, str>>) -> Result<ProgressBar> {
        if !self.is_enabled() {
            return Ok(ProgressBar::hidden());
        }
        let pb = ProgressBar::new_spinner();
        pb.set_style(self.style()?);
        pb.set_message(message);
        pb.enable_steady_tick(TICK_INTERVAL);

        Ok(pb)
    }
}

impl Default for ProgressConfig {
    fn default() -> Self {
        ProgressConfig {
            is_enabled: true,
            template: "{spinner:.green} [{elapsed_precise}] {msg}".to_string(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_disabled_spinner_is_hidden() -> Result<()> {
        let pb = ProgressConfig::disabled().build_spinner("Recoloring...")?;
        assert!(pb.is_hidden());
        Ok(())
    }

    #[test]
    fn test_default_template_is_valid() {
        assert!(ProgressConfig::default().style().is_ok());
    }

    #[test]
    fn test_enabled_spinner_carries_message() -> Result<()> {
        let config = ProgressConfig::new(true, "{spinner} {msg}".to_string());
        let pb = config.build_spinner("Recoloring...")?;
        assert_eq!(pb.message(), "Recoloring...");
        pb.finish_and_clear();
        Ok(())
    }
}
