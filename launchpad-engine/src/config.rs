//! Provisioner configuration
//!
//! Process-wide settings resolved once at startup: credentials, the target
//! cloud project and region, upstream endpoints, and the per-step bounds of
//! a run. Components receive the finished [`Config`] by reference and never
//! read the environment themselves.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;

/// Values substituted into the deploy workflow must match these
static SECRET_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z_][A-Z0-9_]*$").expect("static regex"));
static CLOUD_IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9-]*[a-z0-9]$").expect("static regex"));
static BRANCH_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._/-]*$").expect("static regex"));

pub const DEFAULT_REGION: &str = "asia-northeast1";
pub const DEFAULT_PLATFORM_DOMAIN: &str = "run.app";
pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_COMPLETION_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_SOURCE_HOST_API: &str = "https://api.github.com";
pub const DEFAULT_SOURCE_HOST: &str = "github.com";
pub const DEFAULT_SECRET_NAME: &str = "GCP_SA_KEY";
pub const DEFAULT_BRANCH: &str = "main";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable not set")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },

    #[error("failed to read deploy credential from {path}: {source}")]
    CredentialUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Service-account key handed to the remote CI system
///
/// Holds the decoded JSON document. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct DeployCredential(String);

impl DeployCredential {
    /// Decodes a credential file body
    ///
    /// The file normally holds base64 of the JSON key; a raw JSON document is
    /// accepted as well.
    pub fn decode(raw: &str) -> Result<Self, ConfigError> {
        let raw = raw.trim();
        let json = if raw.starts_with('{') {
            raw.to_string()
        } else {
            let compact: String = raw.split_whitespace().collect();
            let bytes = STANDARD.decode(compact).map_err(|e| ConfigError::Invalid {
                name: "GCP_SA_KEY_FILE",
                reason: format!("not base64 or JSON: {}", e),
            })?;
            String::from_utf8(bytes).map_err(|_| ConfigError::Invalid {
                name: "GCP_SA_KEY_FILE",
                reason: "decoded credential is not UTF-8".to_string(),
            })?
        };

        match serde_json::from_str::<serde_json::Value>(&json) {
            Ok(value) if value.is_object() => Ok(Self(json.trim().to_string())),
            _ => Err(ConfigError::Invalid {
                name: "GCP_SA_KEY_FILE",
                reason: "credential is not a JSON object".to_string(),
            }),
        }
    }

    /// Reads and decodes a credential file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::CredentialUnreadable {
            path: path.to_path_buf(),
            source,
        })?;
        Self::decode(&raw)
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl std::fmt::Debug for DeployCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DeployCredential(<redacted>)")
    }
}

/// Provisioner configuration
#[derive(Clone)]
pub struct Config {
    /// Bearer credential for the source host
    pub github_token: String,

    /// Account that owns created repositories
    pub github_user: String,

    /// Completion service credential
    pub openai_api_key: String,

    /// Credential registered as a repository secret on every run
    pub deploy_credential: DeployCredential,

    /// Cloud project id used for image tags
    pub gcp_project: String,

    /// Numeric project id for the predicted URL; looked up on the
    /// metadata server when absent
    pub project_number: Option<u64>,

    /// Deploy region
    pub region: String,

    /// Domain suffix of deployed services
    pub platform_domain: String,

    pub openai_model: String,
    pub openai_base_url: String,
    pub github_api_url: String,

    /// Host used to build token-authenticated push URLs
    pub github_host: String,

    /// Name of the registered deploy secret
    pub deploy_secret_name: String,

    /// Pushed branch and dispatch ref
    pub default_branch: String,

    /// Parent directory of per-run workspaces
    pub workspace_root: PathBuf,

    /// Bound on every suspension point of a run
    pub step_timeout: Duration,

    /// Dispatch attempts while a new workflow is not yet visible
    pub dispatch_retries: u32,

    /// First dispatch backoff, doubled per attempt
    pub dispatch_backoff: Duration,

    /// Repository visibility
    pub private_repos: bool,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("github_token", &"<redacted>")
            .field("github_user", &self.github_user)
            .field("openai_api_key", &"<redacted>")
            .field("deploy_credential", &self.deploy_credential)
            .field("gcp_project", &self.gcp_project)
            .field("project_number", &self.project_number)
            .field("region", &self.region)
            .field("platform_domain", &self.platform_domain)
            .field("openai_model", &self.openai_model)
            .field("openai_base_url", &self.openai_base_url)
            .field("github_api_url", &self.github_api_url)
            .field("github_host", &self.github_host)
            .field("deploy_secret_name", &self.deploy_secret_name)
            .field("default_branch", &self.default_branch)
            .field("workspace_root", &self.workspace_root)
            .field("step_timeout", &self.step_timeout)
            .field("dispatch_retries", &self.dispatch_retries)
            .field("dispatch_backoff", &self.dispatch_backoff)
            .field("private_repos", &self.private_repos)
            .finish()
    }
}

impl Config {
    /// Creates a configuration with defaults for everything optional
    pub fn new(
        github_token: String,
        github_user: String,
        openai_api_key: String,
        deploy_credential: DeployCredential,
        gcp_project: String,
    ) -> Self {
        Self {
            github_token,
            github_user,
            openai_api_key,
            deploy_credential,
            gcp_project,
            project_number: None,
            region: DEFAULT_REGION.to_string(),
            platform_domain: DEFAULT_PLATFORM_DOMAIN.to_string(),
            openai_model: DEFAULT_MODEL.to_string(),
            openai_base_url: DEFAULT_COMPLETION_URL.to_string(),
            github_api_url: DEFAULT_SOURCE_HOST_API.to_string(),
            github_host: DEFAULT_SOURCE_HOST.to_string(),
            deploy_secret_name: DEFAULT_SECRET_NAME.to_string(),
            default_branch: DEFAULT_BRANCH.to_string(),
            workspace_root: std::env::temp_dir().join("launchpad"),
            step_timeout: Duration::from_secs(120),
            dispatch_retries: 5,
            dispatch_backoff: Duration::from_millis(2000),
            private_repos: false,
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Required environment variables:
    /// - GITHUB_TOKEN, GITHUB_USER
    /// - OPENAI_API_KEY
    /// - GCP_SA_KEY_FILE (path to the deploy credential)
    /// - GOOGLE_CLOUD_PROJECT
    ///
    /// Optional environment variables:
    /// - PROJECT_NUMBER (default: metadata server lookup)
    /// - CLOUD_RUN_REGION (default: asia-northeast1)
    /// - PLATFORM_DOMAIN (default: run.app)
    /// - OPENAI_MODEL, OPENAI_BASE_URL
    /// - GITHUB_API_URL, GITHUB_HOST
    /// - DEPLOY_SECRET_NAME (default: GCP_SA_KEY)
    /// - DEFAULT_BRANCH (default: main)
    /// - WORKSPACE_ROOT (default: $TMPDIR/launchpad)
    /// - STEP_TIMEOUT (seconds, default: 120)
    /// - DISPATCH_RETRIES (default: 5)
    /// - DISPATCH_BACKOFF_MS (default: 2000)
    /// - PRIVATE_REPOS (default: false)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Creates configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let github_token = require("GITHUB_TOKEN")?;
        let github_user = require("GITHUB_USER")?;
        let openai_api_key = require("OPENAI_API_KEY")?;
        let credential_path = require("GCP_SA_KEY_FILE")?;
        let gcp_project = require("GOOGLE_CLOUD_PROJECT")?;

        let deploy_credential = DeployCredential::from_file(Path::new(&credential_path))?;
        let mut config = Self::new(
            github_token,
            github_user,
            openai_api_key,
            deploy_credential,
            gcp_project,
        );

        config.project_number = get("PROJECT_NUMBER")
            .map(|v| parse("PROJECT_NUMBER", &v))
            .transpose()?;

        if let Some(region) = get("CLOUD_RUN_REGION") {
            config.region = region;
        }
        if let Some(domain) = get("PLATFORM_DOMAIN") {
            config.platform_domain = domain;
        }
        if let Some(model) = get("OPENAI_MODEL") {
            config.openai_model = model;
        }
        if let Some(url) = get("OPENAI_BASE_URL") {
            config.openai_base_url = url;
        }
        if let Some(url) = get("GITHUB_API_URL") {
            config.github_api_url = url;
        }
        if let Some(host) = get("GITHUB_HOST") {
            config.github_host = host;
        }
        if let Some(name) = get("DEPLOY_SECRET_NAME") {
            config.deploy_secret_name = name;
        }
        if let Some(branch) = get("DEFAULT_BRANCH") {
            config.default_branch = branch;
        }
        if let Some(root) = get("WORKSPACE_ROOT") {
            config.workspace_root = PathBuf::from(root);
        }
        if let Some(secs) = get("STEP_TIMEOUT") {
            config.step_timeout = Duration::from_secs(parse("STEP_TIMEOUT", &secs)?);
        }
        if let Some(retries) = get("DISPATCH_RETRIES") {
            config.dispatch_retries = parse("DISPATCH_RETRIES", &retries)?;
        }
        if let Some(ms) = get("DISPATCH_BACKOFF_MS") {
            config.dispatch_backoff = Duration::from_millis(parse("DISPATCH_BACKOFF_MS", &ms)?);
        }
        if let Some(private) = get("PRIVATE_REPOS") {
            config.private_repos = parse_bool("PRIVATE_REPOS", &private)?;
        }

        Ok(config)
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("GITHUB_TOKEN", &self.github_token),
            ("GITHUB_USER", &self.github_user),
            ("OPENAI_API_KEY", &self.openai_api_key),
            ("GOOGLE_CLOUD_PROJECT", &self.gcp_project),
        ] {
            if value.is_empty() {
                return Err(ConfigError::Missing(name));
            }
        }

        for (name, url) in [
            ("OPENAI_BASE_URL", &self.openai_base_url),
            ("GITHUB_API_URL", &self.github_api_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::Invalid {
                    name,
                    reason: "must start with http:// or https://".to_string(),
                });
            }
        }

        for (name, value, pattern, expected) in [
            (
                "GOOGLE_CLOUD_PROJECT",
                &self.gcp_project,
                &CLOUD_IDENTIFIER,
                "lowercase letters, digits and '-'",
            ),
            (
                "CLOUD_RUN_REGION",
                &self.region,
                &CLOUD_IDENTIFIER,
                "lowercase letters, digits and '-'",
            ),
            (
                "DEPLOY_SECRET_NAME",
                &self.deploy_secret_name,
                &SECRET_NAME,
                "uppercase letters, digits and '_', not starting with a digit",
            ),
            (
                "DEFAULT_BRANCH",
                &self.default_branch,
                &BRANCH_NAME,
                "letters, digits, '.', '_', '/' and '-'",
            ),
        ] {
            if !pattern.is_match(value) {
                return Err(ConfigError::Invalid {
                    name,
                    reason: format!("{:?} must contain only {}", value, expected),
                });
            }
        }

        if self.step_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                name: "STEP_TIMEOUT",
                reason: "must be greater than 0".to_string(),
            });
        }

        if self.dispatch_retries == 0 {
            return Err(ConfigError::Invalid {
                name: "DISPATCH_RETRIES",
                reason: "must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

fn parse<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| ConfigError::Invalid {
        name,
        reason: e.to_string(),
    })
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::Invalid {
            name,
            reason: format!("expected a boolean, got {:?}", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    const SA_JSON: &str = r#"{"type": "service_account", "project_id": "demo"}"#;

    fn credential_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn env(file: &tempfile::NamedTempFile) -> HashMap<&'static str, String> {
        HashMap::from([
            ("GITHUB_TOKEN", "ghp_x".to_string()),
            ("GITHUB_USER", "octocat".to_string()),
            ("OPENAI_API_KEY", "sk-x".to_string()),
            ("GCP_SA_KEY_FILE", file.path().display().to_string()),
            ("GOOGLE_CLOUD_PROJECT", "demo-project".to_string()),
        ])
    }

    fn load(vars: &HashMap<&'static str, String>) -> Result<Config, ConfigError> {
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_apply() {
        let file = credential_file(&STANDARD.encode(SA_JSON));
        let config = load(&env(&file)).unwrap();

        assert_eq!(config.region, "asia-northeast1");
        assert_eq!(config.platform_domain, "run.app");
        assert_eq!(config.deploy_secret_name, "GCP_SA_KEY");
        assert_eq!(config.default_branch, "main");
        assert_eq!(config.step_timeout, Duration::from_secs(120));
        assert_eq!(config.project_number, None);
        assert!(!config.private_repos);
        assert_eq!(config.deploy_credential.as_bytes(), SA_JSON.as_bytes());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_required_variable() {
        let file = credential_file(SA_JSON);
        let mut vars = env(&file);
        vars.remove("GITHUB_USER");

        assert!(matches!(load(&vars), Err(ConfigError::Missing("GITHUB_USER"))));
    }

    #[test]
    fn test_blank_variable_counts_as_missing() {
        let file = credential_file(SA_JSON);
        let mut vars = env(&file);
        vars.insert("OPENAI_API_KEY", "   ".to_string());

        assert!(matches!(load(&vars), Err(ConfigError::Missing("OPENAI_API_KEY"))));
    }

    #[test]
    fn test_workflow_values_are_validated() {
        let file = credential_file(SA_JSON);
        let cases = [
            ("DEPLOY_SECRET_NAME", "gcp-key"),
            ("DEPLOY_SECRET_NAME", "1KEY"),
            ("CLOUD_RUN_REGION", "us-central1: x"),
            ("GOOGLE_CLOUD_PROJECT", "demo\nproject"),
            ("DEFAULT_BRANCH", "main\n  evil: true"),
        ];

        for (name, value) in cases {
            let mut vars = env(&file);
            vars.insert(name, value.to_string());
            let config = load(&vars).unwrap();
            assert!(
                matches!(config.validate(), Err(ConfigError::Invalid { name: n, .. }) if n == name),
                "{name}={value:?} accepted"
            );
        }

        let mut vars = env(&file);
        vars.insert("DEPLOY_SECRET_NAME", "DEPLOY_KEY_2".to_string());
        vars.insert("DEFAULT_BRANCH", "release/v1.2".to_string());
        assert!(load(&vars).unwrap().validate().is_ok());
    }

    #[test]
    fn test_overrides_are_parsed() {
        let file = credential_file(SA_JSON);
        let mut vars = env(&file);
        vars.insert("PROJECT_NUMBER", "123456789".to_string());
        vars.insert("CLOUD_RUN_REGION", "us-central1".to_string());
        vars.insert("STEP_TIMEOUT", "30".to_string());
        vars.insert("DISPATCH_BACKOFF_MS", "10".to_string());
        vars.insert("PRIVATE_REPOS", "true".to_string());

        let config = load(&vars).unwrap();
        assert_eq!(config.project_number, Some(123456789));
        assert_eq!(config.region, "us-central1");
        assert_eq!(config.step_timeout, Duration::from_secs(30));
        assert_eq!(config.dispatch_backoff, Duration::from_millis(10));
        assert!(config.private_repos);
    }

    #[test]
    fn test_invalid_number_is_rejected() {
        let file = credential_file(SA_JSON);
        let mut vars = env(&file);
        vars.insert("PROJECT_NUMBER", "my-project".to_string());

        assert!(matches!(
            load(&vars),
            Err(ConfigError::Invalid { name: "PROJECT_NUMBER", .. })
        ));
    }

    #[test]
    fn test_unreadable_credential_file() {
        let file = credential_file(SA_JSON);
        let mut vars = env(&file);
        vars.insert("GCP_SA_KEY_FILE", "/nonexistent/launchpad/key".to_string());

        assert!(matches!(load(&vars), Err(ConfigError::CredentialUnreadable { .. })));
    }

    #[test]
    fn test_credential_decoding() {
        assert_eq!(
            DeployCredential::decode(SA_JSON).unwrap().as_bytes(),
            SA_JSON.as_bytes()
        );

        let wrapped = STANDARD.encode(SA_JSON);
        let wrapped = format!("{}\n{}\n", &wrapped[..10], &wrapped[10..]);
        assert_eq!(
            DeployCredential::decode(&wrapped).unwrap().as_bytes(),
            SA_JSON.as_bytes()
        );

        assert!(DeployCredential::decode("%%%").is_err());
        assert!(DeployCredential::decode(&STANDARD.encode("[1, 2]")).is_err());
    }

    #[test]
    fn test_config_validation() {
        let file = credential_file(SA_JSON);
        let mut config = load(&env(&file)).unwrap();

        config.github_api_url = "api.github.com".to_string();
        assert!(config.validate().is_err());
        config.github_api_url = "https://api.github.com".to_string();

        config.step_timeout = Duration::ZERO;
        assert!(config.validate().is_err());
        config.step_timeout = Duration::from_secs(1);

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let file = credential_file(SA_JSON);
        let config = load(&env(&file)).unwrap();
        let debug = format!("{config:?}");

        assert!(!debug.contains("ghp_x"));
        assert!(!debug.contains("sk-x"));
        assert!(!debug.contains("service_account"));
    }
}
