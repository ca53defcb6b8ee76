//! Runtime settings derived from the bootstrap configuration
//!
//! Optional capabilities are resolved once at startup. Jobs only ever see the
//! resolved value, never probe for a capability themselves.

use crate::cleaning::LanguageDetector;
use sentiprep_common::config::{KeywordConfig, MissingColumnPolicy, TomlConfig};
use std::sync::Arc;
use tracing::info;

/// Optional features available to jobs
#[derive(Debug, Clone, Default)]
pub struct Capabilities {
    language_detector: Option<Arc<dyn LanguageDetector>>,
}

impl Capabilities {
    /// No optional features
    pub fn none() -> Self {
        Self::default()
    }

    /// Resolve capabilities from configuration and compiled-in features
    pub fn resolve(config: &TomlConfig) -> Self {
        let mut capabilities = Self::none();
        if !config.language_detection {
            info!("Language detection disabled by configuration");
            return capabilities;
        }

        #[cfg(feature = "language-detection")]
        {
            capabilities.language_detector = Some(Arc::new(crate::cleaning::language::WhatlangDetector));
            info!("Language detection available");
        }

        #[cfg(not(feature = "language-detection"))]
        tracing::warn!("Language detection requested but not compiled in; language filters will be skipped");

        capabilities
    }

    pub fn with_language_detector(mut self, detector: Arc<dyn LanguageDetector>) -> Self {
        self.language_detector = Some(detector);
        self
    }

    pub fn language_detector(&self) -> Option<&dyn LanguageDetector> {
        self.language_detector.as_deref()
    }
}

/// Job behaviour settings
#[derive(Debug, Clone, Default)]
pub struct ServiceSettings {
    pub missing_columns: MissingColumnPolicy,
    pub keywords: KeywordConfig,
}

impl ServiceSettings {
    pub fn from_config(config: &TomlConfig) -> Self {
        Self {
            missing_columns: config.validation.missing_columns,
            keywords: config.keywords.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_detection_yields_no_detector() {
        let config = TomlConfig {
            language_detection: false,
            ..Default::default()
        };
        assert!(Capabilities::resolve(&config).language_detector().is_none());
    }

    #[cfg(feature = "language-detection")]
    #[test]
    fn test_enabled_detection_yields_detector() {
        let config = TomlConfig::default();
        assert!(Capabilities::resolve(&config).language_detector().is_some());
    }

    #[test]
    fn test_settings_follow_config() {
        let mut config = TomlConfig::default();
        config.validation.missing_columns = MissingColumnPolicy::Fail;
        let settings = ServiceSettings::from_config(&config);
        assert_eq!(settings.missing_columns, MissingColumnPolicy::Fail);
        assert_eq!(settings.keywords.positives, "keywords/positives.txt");
    }
}
