use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ScribeSettings {
    pub application: ApplicationSettings,
    pub cognito: CognitoSettings,
    pub aws: AwsCredentialSettings,
    pub logging: LoggingSettings,
    pub bootstrap: BootstrapSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
    pub cors_origins: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CognitoSettings {
    pub user_pool_id: String,
    pub user_pool_client_id: String,
    /// Only needed when the app client was created with a secret
    pub user_pool_client_secret: Option<String>,
    /// Derived from the user pool id when unset
    pub region: Option<String>,
    /// Overrides `https://cognito-idp.{region}.amazonaws.com/`, for local emulators
    pub endpoint: Option<String>,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AwsCredentialSettings {
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub session_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

/// Optional first-run provisioning of the pool groups and an administrator
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BootstrapSettings {
    pub admin_username: Option<String>,
    pub admin_email: Option<String>,

    // Direct value (can be overridden by environment variable)
    pub admin_password: Option<String>,
    // Environment variable name for override
    pub admin_password_env: Option<String>,
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cors_origins: "http://localhost:3000,http://localhost:8080".to_string(),
        }
    }
}

impl Default for CognitoSettings {
    fn default() -> Self {
        Self {
            user_pool_id: String::new(),
            user_pool_client_id: String::new(),
            user_pool_client_secret: None,
            region: None,
            endpoint: None,
            timeout_seconds: 10,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl ScribeSettings {
    /// Load settings from configuration files and environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Settings file cannot be read or parsed
    /// - TOML parsing fails
    /// - The user pool is not configured
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        Self::load_env_file();

        // Load base settings from TOML or defaults
        let secrets_dir = std::env::var("SCRIBE_SECRETS_DIR").ok();
        let mut settings = Self::load_base_settings(Path::new("."), secrets_dir.as_deref())?;

        // Apply environment variable overrides
        Self::apply_env_overrides(&mut settings);

        settings.validate()?;
        Ok(settings)
    }

    /// Initialize the global logger from `logging.level`
    ///
    /// # Errors
    ///
    /// Returns an error if a logger was already installed
    pub fn init_logging(&self) -> Result<(), log::SetLoggerError> {
        env_logger::Builder::new()
            .parse_filters(&self.logging.level)
            .try_init()
    }

    /// Load base settings from TOML file(s) or use defaults
    /// Settings are loaded with the following priority (highest to lowest):
    /// 1. Environment variables (applied separately after loading base settings)
    /// 2. Settings.toml in `SCRIBE_SECRETS_DIR` (if specified and exists)
    /// 3. Settings.toml in the working directory (if exists)
    /// 4. Default settings
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Settings file cannot be read
    /// - TOML parsing fails
    pub fn load_base_settings(
        working_dir: &Path,
        secrets_dir: Option<&str>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let mut settings = Self::default();

        let default_config_path = working_dir.join("Settings.toml");
        if default_config_path.exists() {
            let toml_content = fs::read_to_string(&default_config_path)?;
            settings = basic_toml::from_str(&toml_content)?;
            println!(
                "✓ Loaded base settings from {}",
                default_config_path.display()
            );
        }

        if let Some(secrets_dir) = secrets_dir {
            let secrets_path = Path::new(secrets_dir).join("Settings.toml");
            if secrets_path.exists() {
                let secrets_toml_content = fs::read_to_string(&secrets_path)?;
                settings = basic_toml::from_str(&secrets_toml_content)?;
                println!("✓ Overriding settings from {}", secrets_path.display());
            } else {
                println!(
                    "ℹ SCRIBE_SECRETS_DIR set but no Settings.toml found at: {}",
                    secrets_path.display()
                );
            }
        }

        Ok(settings)
    }

    /// Apply environment variable overrides to settings
    pub fn apply_env_overrides(settings: &mut Self) {
        Self::apply_application_env_overrides(&mut settings.application);
        Self::apply_cognito_env_overrides(&mut settings.cognito);
        Self::apply_aws_env_overrides(&mut settings.aws);
        Self::apply_logging_env_overrides(&mut settings.logging);
        Self::apply_bootstrap_env_overrides(&mut settings.bootstrap);
    }

    fn apply_application_env_overrides(app_settings: &mut ApplicationSettings) {
        if let Ok(host) = std::env::var("HOST") {
            app_settings.host = host;
        }
        if let Ok(port_str) = std::env::var("PORT") {
            if let Ok(port) = port_str.parse::<u16>() {
                app_settings.port = port;
            }
        }
        if let Ok(cors_origins) = std::env::var("CORS_ORIGINS") {
            app_settings.cors_origins = cors_origins;
        }
    }

    /// Apply environment overrides for the user pool settings
    pub fn apply_cognito_env_overrides(cognito: &mut CognitoSettings) {
        if let Ok(pool_id) = std::env::var("USER_POOL_ID") {
            cognito.user_pool_id = pool_id;
        }
        if let Ok(client_id) = std::env::var("USER_POOL_CLIENT_ID") {
            cognito.user_pool_client_id = client_id;
        }
        Self::apply_optional_env_override("USER_POOL_CLIENT_SECRET", &mut cognito.user_pool_client_secret);
        Self::apply_optional_env_override("COGNITO_ENDPOINT", &mut cognito.endpoint);
        if cognito.region.is_none() || std::env::var("AWS_REGION").is_ok() {
            Self::apply_optional_env_override("AWS_DEFAULT_REGION", &mut cognito.region);
            Self::apply_optional_env_override("AWS_REGION", &mut cognito.region);
        }
        if let Ok(timeout) = std::env::var("COGNITO_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse::<u64>() {
                cognito.timeout_seconds = value;
            }
        }
    }

    fn apply_aws_env_overrides(aws: &mut AwsCredentialSettings) {
        Self::apply_optional_env_override("AWS_ACCESS_KEY_ID", &mut aws.access_key_id);
        Self::apply_optional_env_override("AWS_SECRET_ACCESS_KEY", &mut aws.secret_access_key);
        Self::apply_optional_env_override("AWS_SESSION_TOKEN", &mut aws.session_token);
    }

    fn apply_logging_env_overrides(logging_settings: &mut LoggingSettings) {
        if let Ok(log_level) = std::env::var("RUST_LOG") {
            logging_settings.level = log_level;
        }
    }

    fn apply_bootstrap_env_overrides(bootstrap: &mut BootstrapSettings) {
        Self::apply_optional_env_override("BOOTSTRAP_ADMIN_USERNAME", &mut bootstrap.admin_username);
        Self::apply_optional_env_override("BOOTSTRAP_ADMIN_EMAIL", &mut bootstrap.admin_email);
        Self::apply_optional_env_override("BOOTSTRAP_ADMIN_PASSWORD", &mut bootstrap.admin_password);
    }

    /// Helper to override an optional string, ignoring empty values
    fn apply_optional_env_override(env_var: &str, target: &mut Option<String>) {
        if let Ok(value) = std::env::var(env_var) {
            if !value.is_empty() {
                *target = Some(value);
            }
        }
    }

    /// Check that the settings describe a usable user pool
    ///
    /// # Errors
    ///
    /// Returns an error naming the first missing setting
    pub fn validate(&self) -> Result<(), String> {
        if self.cognito.user_pool_id.is_empty() {
            return Err("cognito.user_pool_id (USER_POOL_ID) is not configured".to_string());
        }
        if self.cognito.user_pool_client_id.is_empty() {
            return Err(
                "cognito.user_pool_client_id (USER_POOL_CLIENT_ID) is not configured".to_string(),
            );
        }
        if self.cognito.region().is_none() {
            return Err("cognito.region could not be determined from settings or USER_POOL_ID".to_string());
        }
        Ok(())
    }

    /// Load environment variables from .env file
    fn load_env_file() {
        if let Ok(contents) = std::fs::read_to_string(".env") {
            for line in contents.lines() {
                let line = line.trim();
                if line.starts_with('#') {
                    continue;
                }
                if let Some((key, value)) = line.split_once('=') {
                    std::env::set_var(key.trim(), value.trim());
                }
            }
        }
    }

    /// Get the bind address for the server
    #[must_use]
    pub fn get_bind_address(&self) -> String {
        format!("{}:{}", self.application.host, self.application.port)
    }

    /// Get CORS origins as a vector of strings
    #[must_use]
    pub fn get_cors_origins(&self) -> Vec<String> {
        self.application
            .cors_origins
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

impl CognitoSettings {
    /// Region of the user pool: explicit setting first, then the pool id prefix
    /// (`us-east-1_AbCdEf` lives in `us-east-1`)
    #[must_use]
    pub fn region(&self) -> Option<String> {
        if let Some(region) = self.region.as_ref().filter(|r| !r.is_empty()) {
            return Some(region.clone());
        }
        self.user_pool_id
            .split_once('_')
            .map(|(region, _)| region.to_string())
            .filter(|region| !region.is_empty())
    }
}

impl BootstrapSettings {
    /// Get the admin password, checking environment variable first, then falling back to direct value
    #[must_use]
    pub fn get_admin_password(&self) -> Option<String> {
        if let Some(env_var) = &self.admin_password_env {
            if let Ok(value) = std::env::var(env_var) {
                return Some(value);
            }
        }
        self.admin_password.clone()
    }

    /// Whether enough is configured to provision an administrator
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.admin_username.is_some() && self.admin_email.is_some()
    }
}
