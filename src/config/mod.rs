use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub processing: ProcessingConfig,
    pub consortium: ConsortiumConfig,
    pub api: ApiConfig,
    pub catalog: CatalogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    pub max_concurrency: usize,
    pub propagate_associated_records: bool,
    pub propagation_concurrency: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsortiumConfig {
    /// Acting tenant for requests that name none
    pub central_tenant: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// JSON or YAML fixture seeding the in-memory catalog
    pub fixture_path: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Processing overrides
        if let Ok(v) = env::var("BULK_EDIT_MAX_CONCURRENCY") {
            self.processing.max_concurrency = v.parse().unwrap_or(self.processing.max_concurrency);
        }
        if let Ok(v) = env::var("BULK_EDIT_PROPAGATE_ASSOCIATED_RECORDS") {
            self.processing.propagate_associated_records =
                v.parse().unwrap_or(self.processing.propagate_associated_records);
        }
        if let Ok(v) = env::var("BULK_EDIT_PROPAGATION_CONCURRENCY") {
            self.processing.propagation_concurrency = v.parse().unwrap_or(self.processing.propagation_concurrency);
        }

        // Consortium overrides
        if let Ok(v) = env::var("BULK_EDIT_CENTRAL_TENANT") {
            self.consortium.central_tenant = Some(v.trim().to_string()).filter(|t| !t.is_empty());
        }

        // API overrides
        if let Ok(v) = env::var("BULK_EDIT_PORT") {
            self.api.port = v.parse().unwrap_or(self.api.port);
        }
        if let Ok(v) = env::var("BULK_EDIT_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("BULK_EDIT_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Catalog overrides
        if let Ok(v) = env::var("BULK_EDIT_CATALOG_FIXTURE") {
            self.catalog.fixture_path = Some(v).filter(|p| !p.trim().is_empty());
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            processing: ProcessingConfig {
                max_concurrency: 4,
                propagate_associated_records: true,
                propagation_concurrency: 2,
            },
            consortium: ConsortiumConfig { central_tenant: None },
            api: ApiConfig {
                port: 9001,
                enable_request_logging: true,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            catalog: CatalogConfig { fixture_path: None },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            processing: ProcessingConfig {
                max_concurrency: 8,
                propagate_associated_records: true,
                propagation_concurrency: 4,
            },
            consortium: ConsortiumConfig { central_tenant: None },
            api: ApiConfig {
                port: 9001,
                enable_request_logging: true,
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
            },
            catalog: CatalogConfig { fixture_path: None },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            processing: ProcessingConfig {
                max_concurrency: 16,
                propagate_associated_records: true,
                propagation_concurrency: 8,
            },
            consortium: ConsortiumConfig { central_tenant: None },
            api: ApiConfig {
                port: 9001,
                enable_request_logging: false,
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
            },
            catalog: CatalogConfig { fixture_path: None },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_production {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Production)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.processing.max_concurrency, 4);
        assert!(config.processing.propagate_associated_records);
        assert!(config.api.enable_request_logging);
        assert!(config.catalog.fixture_path.is_none());
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.processing.max_concurrency, 16);
        assert!(!config.api.enable_request_logging);
        assert_eq!(config.api.max_request_size_bytes, 2 * 1024 * 1024);
    }
}
