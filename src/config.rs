use serde::Deserialize;
use std::env;
use std::sync::OnceLock;
use thiserror::Error;

const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-large";
const DEFAULT_PINECONE_NAMESPACE: &str = "plans";
const DEFAULT_EXTRACTOR_URL: &str = "http://127.0.0.1:5001";
const DEFAULT_FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com";
const DEFAULT_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const DEFAULT_SERVER_PORT: u16 = 8080;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the Planwright server.
#[derive(Debug, Clone)]
pub struct Config {
    /// Service account used for Firestore access and ID-token audience checks.
    pub service_account: ServiceAccount,
    /// API key for the Gemini `generateContent` endpoint.
    pub gemini_api_key: String,
    /// Gemini model identifier.
    pub gemini_model: String,
    /// Base URL of the Gemini API.
    pub gemini_base_url: String,
    /// API key for the OpenAI embeddings endpoint.
    pub openai_api_key: String,
    /// Base URL of the OpenAI API.
    pub openai_base_url: String,
    /// Embedding model identifier passed to the provider.
    pub embedding_model: String,
    /// API key for the Pinecone index.
    pub pinecone_api_key: String,
    /// Fully qualified Pinecone index host.
    pub pinecone_host: String,
    /// Namespace that keeps plan vectors apart from other data.
    pub pinecone_namespace: String,
    /// Base URL of the text-extraction service.
    pub extractor_url: String,
    /// Base URL of the Firestore REST API.
    pub firestore_base_url: String,
    /// URL of the JSON Web Key Set used to verify ID tokens.
    pub jwks_url: String,
    /// Where generate-plan looks for reference plans.
    pub reference_source: ReferenceSource,
    /// Upper bound on request bodies accepted by extract-text.
    pub max_upload_bytes: usize,
    /// Port the HTTP server binds to.
    pub server_port: u16,
    /// Origins allowed by CORS. Empty means any origin.
    pub allowed_origins: Vec<String>,
}

/// Subset of a Google service-account key file used by this server.
#[derive(Clone, Deserialize)]
pub struct ServiceAccount {
    /// Firebase / GCP project identifier.
    pub project_id: String,
    /// Service account e-mail, used as the assertion issuer.
    pub client_email: String,
    /// PEM-encoded RSA private key.
    pub private_key: String,
    /// OAuth token endpoint.
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl std::fmt::Debug for ServiceAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccount")
            .field("project_id", &self.project_id)
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// Retrieval strategy used to find reference plans for a new generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceSource {
    /// Nearest neighbours from the vector index.
    Vector,
    /// Most recent matching plans from the document store.
    Store,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String, ConfigError> {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingVariable(key.to_string()))
        };
        let optional = |key: &str| -> Option<String> {
            lookup(key).filter(|value| !value.trim().is_empty())
        };

        let service_account: ServiceAccount =
            serde_json::from_str(&required("FIREBASE_SERVICE_ACCOUNT_JSON")?).map_err(|_| {
                ConfigError::InvalidValue("FIREBASE_SERVICE_ACCOUNT_JSON".to_string())
            })?;

        let pinecone_index = required("PINECONE_INDEX")?;
        let pinecone_host = match optional("PINECONE_HOST") {
            Some(host) => host,
            None => {
                let environment = required("PINECONE_ENV")?;
                format!("https://{pinecone_index}-{environment}.svc.pinecone.io")
            }
        };

        Ok(Self {
            service_account,
            gemini_api_key: required("GEMINI_API_KEY")?,
            gemini_model: optional("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.into()),
            gemini_base_url: optional("GEMINI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.into()),
            openai_api_key: required("OPENAI_API_KEY")?,
            openai_base_url: optional("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.into()),
            embedding_model: optional("EMBEDDING_MODEL")
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.into()),
            pinecone_api_key: required("PINECONE_API_KEY")?,
            pinecone_host,
            pinecone_namespace: optional("PINECONE_NAMESPACE")
                .unwrap_or_else(|| DEFAULT_PINECONE_NAMESPACE.into()),
            extractor_url: optional("EXTRACTOR_URL")
                .unwrap_or_else(|| DEFAULT_EXTRACTOR_URL.into()),
            firestore_base_url: optional("FIRESTORE_BASE_URL")
                .unwrap_or_else(|| DEFAULT_FIRESTORE_BASE_URL.into()),
            jwks_url: optional("FIREBASE_JWKS_URL").unwrap_or_else(|| DEFAULT_JWKS_URL.into()),
            reference_source: optional("REFERENCE_SOURCE")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|()| ConfigError::InvalidValue("REFERENCE_SOURCE".into()))
                })
                .transpose()?
                .unwrap_or(ReferenceSource::Vector),
            max_upload_bytes: optional("MAX_UPLOAD_BYTES")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("MAX_UPLOAD_BYTES".into()))
                })
                .transpose()?
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            server_port: optional("PORT")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("PORT".into()))
                })
                .transpose()?
                .unwrap_or(DEFAULT_SERVER_PORT),
            allowed_origins: optional("ALLOWED_ORIGINS")
                .map(|value| parse_origins(&value))
                .unwrap_or_default(),
        })
    }
}

fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(|origin| origin.trim_end_matches('/').to_string())
        .collect()
}

impl std::str::FromStr for ReferenceSource {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "vector" | "pinecone" => Ok(Self::Vector),
            "store" | "firestore" => Ok(Self::Store),
            _ => Err(()),
        }
    }
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Load configuration from the environment and install it in the global cache.
///
/// Calling this more than once returns the configuration installed first.
pub fn init_config() -> Result<&'static Config, ConfigError> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    tracing::debug!(
        project = %config.service_account.project_id,
        pinecone_host = %config.pinecone_host,
        namespace = %config.pinecone_namespace,
        extractor_url = %config.extractor_url,
        reference_source = ?config.reference_source,
        server_port = config.server_port,
        "Loaded configuration"
    );
    Ok(CONFIG.get_or_init(|| config))
}
