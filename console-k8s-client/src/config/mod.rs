//! Kubernetes configuration objects from the console environment, `~/.kube/config` or `$KUBECONFIG`.
//!
//! # Usage
//! The [`Config`] has several constructors plus logic to infer environment.
//!
//! Unless you have issues, prefer using [`Config::infer`], and pass it to a [`Client`][crate::Client].
mod file_config;
mod file_loader;

use file_loader::ConfigLoader;
pub use file_loader::KubeConfigOptions;

use http::header::{HeaderName, HeaderValue};
use secrecy::SecretString;
use std::{path::PathBuf, time::Duration};
use thiserror::Error;

/// Environment variable holding the cluster url, usually the console's own api proxy
pub const API_URL_ENV: &str = "CONSOLE_K8S_API_URL";
/// Environment variable holding a bearer token
pub const TOKEN_ENV: &str = "CONSOLE_K8S_TOKEN";
/// Environment variable holding the default namespace
pub const NAMESPACE_ENV: &str = "CONSOLE_K8S_NAMESPACE";

/// Failed to infer config
#[derive(Error, Debug)]
#[error("failed to infer config: env: ({env}), kubeconfig: ({kubeconfig})")]
pub struct InferConfigError {
    env: EnvConfigError,
    #[source]
    kubeconfig: KubeconfigError,
}

/// Possible errors when loading config from the environment
#[derive(Error, Debug)]
pub enum EnvConfigError {
    /// The cluster url variable is not set
    #[error("environment variable {0} is not set")]
    MissingUrl(&'static str),

    /// The cluster url variable does not hold a url
    #[error("failed to parse cluster url: {0}")]
    ParseClusterUrl(#[source] http::uri::InvalidUri),
}

/// Possible errors when loading kubeconfig
#[derive(Error, Debug)]
pub enum KubeconfigError {
    /// Failed to determine current context
    #[error("failed to determine current context")]
    CurrentContextNotSet,

    /// Kubeconfigs with mismatching kind cannot be merged
    #[error("kubeconfigs with mismatching kind cannot be merged")]
    KindMismatch,

    /// Kubeconfigs with mismatching api version cannot be merged
    #[error("kubeconfigs with mismatching api version cannot be merged")]
    ApiVersionMismatch,

    /// Failed to load current context
    #[error("failed to load current context: {0}")]
    LoadContext(String),

    /// Failed to load the cluster of context
    #[error("failed to load the cluster of context: {0}")]
    LoadClusterOfContext(String),

    /// Failed to find named user
    #[error("failed to find named user: {0}")]
    FindUser(String),

    /// Failed to find the path of kubeconfig
    #[error("failed to find the path of kubeconfig")]
    FindPath,

    /// Failed to read kubeconfig
    #[error("failed to read kubeconfig from '{1:?}': {0}")]
    ReadConfig(#[source] std::io::Error, PathBuf),

    /// Failed to parse kubeconfig YAML
    #[error("failed to parse kubeconfig YAML: {0}")]
    Parse(#[source] serde_yaml::Error),

    /// The structure of the parsed kubeconfig is invalid
    #[error("the structure of the parsed kubeconfig is invalid: {0}")]
    InvalidStructure(#[source] serde_yaml::Error),

    /// The selected cluster has no server
    #[error("cluster url is missing")]
    MissingClusterUrl,

    /// Failed to parse cluster url
    #[error("failed to parse cluster url: {0}")]
    ParseClusterUrl(#[source] http::uri::InvalidUri),

    /// Failed to load certificate authority
    #[error("failed to load certificate authority: {0}")]
    LoadCertificateAuthority(#[source] LoadDataError),

    /// Failed to load client certificate
    #[error("failed to load client certificate: {0}")]
    LoadClientCertificate(#[source] LoadDataError),

    /// Failed to load client key
    #[error("failed to load client key: {0}")]
    LoadClientKey(#[source] LoadDataError),

    /// Failed to parse PEM-encoded certificates
    #[error("failed to parse PEM-encoded certificates: {0}")]
    ParseCertificates(#[source] pem::PemError),
}

/// Errors from loading data from a base64 string or a file
#[derive(Debug, Error)]
pub enum LoadDataError {
    /// Failed to decode base64 data
    #[error("failed to decode base64 data: {0}")]
    DecodeBase64(#[source] base64::DecodeError),

    /// Failed to read file
    #[error("failed to read file '{1:?}': {0}")]
    ReadFile(#[source] std::io::Error, PathBuf),

    /// No base64 data or file path was provided
    #[error("no base64 data or file")]
    NoBase64DataOrFile,
}

/// The identity the api server should act as for every request
///
/// Sent as one `Impersonate-User` header and one `Impersonate-Group` header per group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Impersonation {
    /// The user to act as
    pub user: String,
    /// The groups to act as
    pub groups: Vec<String>,
}

impl Impersonation {
    /// Act as a user
    pub fn user(name: impl Into<String>) -> Self {
        Self {
            user: name.into(),
            groups: vec![],
        }
    }

    /// Act as a group
    ///
    /// The api server needs a user next to any group, and the group name is used for it.
    pub fn group(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            user: name.clone(),
            groups: vec![name],
        }
    }

    /// Act as additional groups
    #[must_use]
    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups.extend(groups.into_iter().map(Into::into));
        self
    }

    fn from_auth_info(auth_info: &AuthInfo) -> Option<Self> {
        let groups = auth_info.impersonate_groups.clone().unwrap_or_default();
        match &auth_info.impersonate {
            Some(user) => Some(Self::user(user.as_str()).with_groups(groups)),
            None if !groups.is_empty() => {
                tracing::warn!("Ignoring impersonated groups without an impersonated user");
                None
            }
            None => None,
        }
    }
}

/// Configuration object detailing things like cluster URL, default namespace and credentials.
///
/// It holds the transport settings of a [`Client`](crate::Client) but does not open any connection.
#[cfg_attr(docsrs, doc(cfg(feature = "config")))]
#[derive(Debug, Clone)]
pub struct Config {
    /// The configured cluster url
    pub cluster_url: http::Uri,
    /// The configured default namespace
    pub default_namespace: String,
    /// Timeout for connecting to the Kubernetes API.
    ///
    /// A value of `None` means no timeout
    pub connect_timeout: Option<std::time::Duration>,
    /// Timeout for reading from the Kubernetes API.
    ///
    /// A value of `None` means no timeout
    pub read_timeout: Option<std::time::Duration>,
    /// Timeout for writing data to the Kubernetes API.
    ///
    /// A value of `None` means no timeout
    pub write_timeout: Option<std::time::Duration>,
    /// Stores information to tell the cluster who you are.
    pub auth_info: AuthInfo,
    /// The identity to act as, if any
    pub impersonate: Option<Impersonation>,
    /// Headers to pass with every request.
    pub headers: Vec<(HeaderName, HeaderValue)>,
    /// The configured root certificates, DER encoded
    pub root_cert: Option<Vec<Vec<u8>>>,
    /// Whether to accept invalid certificates
    pub accept_invalid_certs: bool,
    /// Client key and certificate, PEM encoded
    pub identity_pem: Option<Vec<u8>>,
}

impl Config {
    /// Construct a new config where only the `cluster_url` is set by the user.
    /// and everything else receives a default value.
    ///
    /// Most likely you want to use [`Config::infer`] to infer the config from
    /// the environment.
    pub fn new(cluster_url: http::Uri) -> Self {
        Self {
            cluster_url,
            default_namespace: String::from("default"),
            connect_timeout: Some(DEFAULT_CONNECT_TIMEOUT),
            read_timeout: Some(DEFAULT_READ_TIMEOUT),
            write_timeout: Some(DEFAULT_WRITE_TIMEOUT),
            auth_info: AuthInfo::default(),
            impersonate: None,
            headers: Vec::new(),
            root_cert: None,
            accept_invalid_certs: false,
            identity_pem: None,
        }
    }

    /// Infer a Kubernetes client configuration.
    ///
    /// First, the console environment variables are tried ([`Config::from_env`]).
    /// If they are not set, the local kubeconfig is loaded ([`Config::from_kubeconfig`]).
    pub async fn infer() -> Result<Self, InferConfigError> {
        match Self::from_env() {
            Ok(config) => Ok(config),
            Err(env) => {
                tracing::trace!("No console environment config found: {}", env);
                tracing::trace!("Falling back to local kubeconfig");
                Self::from_kubeconfig(&KubeConfigOptions::default())
                    .await
                    .map_err(|kubeconfig| InferConfigError { env, kubeconfig })
            }
        }
    }

    /// Create configuration from the console environment variables
    ///
    /// [`API_URL_ENV`] is required; [`TOKEN_ENV`] and [`NAMESPACE_ENV`] are optional.
    pub fn from_env() -> Result<Self, EnvConfigError> {
        let cluster_url = nonempty_var(API_URL_ENV)
            .ok_or(EnvConfigError::MissingUrl(API_URL_ENV))?
            .parse::<http::Uri>()
            .map_err(EnvConfigError::ParseClusterUrl)?;
        let mut config = Self::new(cluster_url);
        if let Some(ns) = nonempty_var(NAMESPACE_ENV) {
            config.default_namespace = ns;
        }
        config.auth_info.token = nonempty_var(TOKEN_ENV).map(SecretString::from);
        Ok(config)
    }

    /// Create configuration from the default local config file
    ///
    /// This will respect the `$KUBECONFIG` evar, but otherwise default to `~/.kube/config`.
    /// You can also customize what context/cluster/user you want to use here,
    /// but it will default to the current-context.
    pub async fn from_kubeconfig(options: &KubeConfigOptions) -> Result<Self, KubeconfigError> {
        let loader = ConfigLoader::new_from_options(options)?;
        Self::new_from_loader(loader)
    }

    /// Create configuration from a [`Kubeconfig`] struct
    ///
    /// Skips reading `$KUBECONFIG` and `~/.kube/config`.
    pub async fn from_custom_kubeconfig(
        kubeconfig: Kubeconfig,
        options: &KubeConfigOptions,
    ) -> Result<Self, KubeconfigError> {
        let loader = ConfigLoader::new_from_kubeconfig(kubeconfig, options)?;
        Self::new_from_loader(loader)
    }

    fn new_from_loader(loader: ConfigLoader) -> Result<Self, KubeconfigError> {
        let cluster_url = loader.cluster_url()?;
        let default_namespace = loader
            .current_context
            .namespace
            .clone()
            .unwrap_or_else(|| String::from("default"));

        let root_cert = loader.ca_bundle()?;
        let identity_pem = loader.user.identity_pem()?;
        let accept_invalid_certs = loader.cluster.insecure_skip_tls_verify.unwrap_or(false);
        if accept_invalid_certs {
            tracing::warn!("Server certificates of {} will not be verified", cluster_url);
        }

        Ok(Self {
            default_namespace,
            impersonate: Impersonation::from_auth_info(&loader.user),
            auth_info: loader.user,
            root_cert,
            accept_invalid_certs,
            identity_pem,
            ..Self::new(cluster_url)
        })
    }
}

/// Parse the DER contents of every `CERTIFICATE` block in a PEM bundle
pub(crate) fn certs(data: &[u8]) -> Result<Vec<Vec<u8>>, pem::PemError> {
    Ok(pem::parse_many(data)?
        .into_iter()
        .filter(|p| p.tag() == "CERTIFICATE")
        .map(|p| p.contents().to_vec())
        .collect())
}

fn nonempty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(295);
const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(295);

// Expose raw config structs
pub use file_config::{AuthInfo, Cluster, Context, Kubeconfig, NamedAuthInfo, NamedCluster, NamedContext};

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    const KUBECONFIG: &str = r#"
apiVersion: v1
kind: Config
current-context: console
clusters:
- name: proxy
  cluster:
    server: http://127.0.0.1:8001/api/kubernetes
contexts:
- name: console
  context:
    cluster: proxy
    user: admin
    namespace: openshift-console
users:
- name: admin
  user:
    token: abc
    as: jane
    as-groups: [ops, dev]
"#;

    #[tokio::test]
    async fn config_from_custom_kubeconfig() {
        let kubeconfig = Kubeconfig::from_yaml(KUBECONFIG).unwrap();
        let config = Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
            .await
            .unwrap();
        assert_eq!(config.cluster_url, "http://127.0.0.1:8001/api/kubernetes");
        assert_eq!(config.default_namespace, "openshift-console");
        assert_eq!(config.read_timeout, Some(DEFAULT_READ_TIMEOUT));
        assert_eq!(
            config.auth_info.token.as_ref().map(|t| t.expose_secret().to_string()),
            Some("abc".into())
        );
        assert_eq!(config.auth_info.impersonate.as_deref(), Some("jane"));
        assert_eq!(
            config.impersonate,
            Some(Impersonation::user("jane").with_groups(["ops", "dev"]))
        );
        assert!(config.root_cert.is_none());
        assert!(config.identity_pem.is_none());
        assert!(!config.accept_invalid_certs);
    }

    #[tokio::test]
    async fn tls_settings_from_kubeconfig() {
        use base64::Engine;
        let encode = |data: &[u8]| base64::engine::general_purpose::STANDARD.encode(data);
        let ca = pem::encode(&pem::Pem::new("CERTIFICATE", vec![1, 2, 3]));
        let cert = pem::encode(&pem::Pem::new("CERTIFICATE", vec![4, 5]));
        let key = pem::encode(&pem::Pem::new("PRIVATE KEY", vec![6]));
        let yaml = format!(
            r#"
apiVersion: v1
kind: Config
current-context: secure
clusters:
- name: secure
  cluster:
    server: https://api.example.com:6443
    certificate-authority-data: {}
    insecure-skip-tls-verify: true
contexts:
- name: secure
  context:
    cluster: secure
    user: cert-user
users:
- name: cert-user
  user:
    client-certificate-data: {}
    client-key-data: {}
    as-groups: [ops]
"#,
            encode(ca.as_bytes()),
            encode(cert.as_bytes()),
            encode(key.as_bytes()),
        );
        let kubeconfig = Kubeconfig::from_yaml(&yaml).unwrap();
        let config = Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
            .await
            .unwrap();
        assert_eq!(config.root_cert, Some(vec![vec![1, 2, 3]]));
        assert!(config.accept_invalid_certs);
        let identity = config.identity_pem.unwrap();
        let blocks = pem::parse_many(&identity).unwrap();
        let tags: Vec<_> = blocks.iter().map(|b| b.tag()).collect();
        assert_eq!(tags, vec!["PRIVATE KEY", "CERTIFICATE"]);
        // groups without a user are not sent
        assert!(config.impersonate.is_none());
    }

    // Environment variables are process global, so all env cases share one test
    #[tokio::test]
    async fn config_from_env_and_kubeconfig_file() {
        std::env::remove_var(API_URL_ENV);
        assert!(matches!(Config::from_env(), Err(EnvConfigError::MissingUrl(_))));

        let file = tempfile::NamedTempFile::new().expect("create config tempfile");
        std::fs::write(file.path(), KUBECONFIG).unwrap();
        std::env::set_var("KUBECONFIG", file.path());
        let config = Config::infer().await.unwrap();
        assert_eq!(config.cluster_url, "http://127.0.0.1:8001/api/kubernetes");

        std::env::set_var(API_URL_ENV, "http://localhost:9000");
        std::env::set_var(TOKEN_ENV, "env-token");
        std::env::set_var(NAMESPACE_ENV, "demo");
        let config = Config::infer().await.unwrap();
        assert_eq!(config.cluster_url, "http://localhost:9000/");
        assert_eq!(config.default_namespace, "demo");
        assert_eq!(
            config.auth_info.token.as_ref().map(|t| t.expose_secret().to_string()),
            Some("env-token".into())
        );

        std::env::set_var(API_URL_ENV, "not a url");
        assert!(matches!(Config::from_env(), Err(EnvConfigError::ParseClusterUrl(_))));

        for var in [API_URL_ENV, TOKEN_ENV, NAMESPACE_ENV, "KUBECONFIG"] {
            std::env::remove_var(var);
        }
    }
}
