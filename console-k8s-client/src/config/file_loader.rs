use super::{
    file_config::{AuthInfo, Cluster, Context, Kubeconfig},
    KubeconfigError,
};

/// KubeConfigOptions stores options used when loading kubeconfig file.
#[derive(Default, Clone, Debug)]
pub struct KubeConfigOptions {
    /// The named context to load
    pub context: Option<String>,
    /// The cluster to load
    pub cluster: Option<String>,
    /// The user to load
    pub user: Option<String>,
}

/// ConfigLoader loads current context, cluster, and authentication information
/// from a kubeconfig file.
#[derive(Clone, Debug)]
pub struct ConfigLoader {
    pub current_context: Context,
    pub cluster: Cluster,
    pub user: AuthInfo,
}

impl ConfigLoader {
    /// Returns a config loader based on the cluster information from the kubeconfig file.
    pub fn new_from_options(options: &KubeConfigOptions) -> Result<Self, KubeconfigError> {
        Self::new_from_kubeconfig(Kubeconfig::read()?, options)
    }

    pub fn new_from_kubeconfig(config: Kubeconfig, options: &KubeConfigOptions) -> Result<Self, KubeconfigError> {
        Self::load(
            config,
            options.context.as_ref(),
            options.cluster.as_ref(),
            options.user.as_ref(),
        )
    }

    pub fn load(
        config: Kubeconfig,
        context: Option<&String>,
        cluster: Option<&String>,
        user: Option<&String>,
    ) -> Result<Self, KubeconfigError> {
        let context_name = if let Some(name) = context {
            name
        } else if let Some(name) = &config.current_context {
            name
        } else {
            return Err(KubeconfigError::CurrentContextNotSet);
        };

        let current_context = config
            .contexts
            .iter()
            .find(|named_context| &named_context.name == context_name)
            .and_then(|named_context| named_context.context.clone())
            .ok_or_else(|| KubeconfigError::LoadContext(context_name.clone()))?;

        let cluster_name = cluster.unwrap_or(&current_context.cluster);
        let cluster = config
            .clusters
            .iter()
            .find(|named_cluster| &named_cluster.name == cluster_name)
            .and_then(|named_cluster| named_cluster.cluster.clone())
            .ok_or_else(|| KubeconfigError::LoadClusterOfContext(cluster_name.clone()))?;

        let user_name = user.unwrap_or(&current_context.user);
        let user = config
            .auth_infos
            .iter()
            .find(|named_user| &named_user.name == user_name)
            .and_then(|named_user| named_user.auth_info.clone())
            .ok_or_else(|| KubeconfigError::FindUser(user_name.clone()))?;

        Ok(ConfigLoader {
            current_context,
            cluster,
            user,
        })
    }

    /// Root certificates of the cluster, DER encoded
    pub fn ca_bundle(&self) -> Result<Option<Vec<Vec<u8>>>, KubeconfigError> {
        match self.cluster.load_certificate_authority()? {
            Some(bundle) => Ok(Some(super::certs(&bundle).map_err(KubeconfigError::ParseCertificates)?)),
            None => Ok(None),
        }
    }

    pub fn cluster_url(&self) -> Result<http::Uri, KubeconfigError> {
        self.cluster
            .server
            .as_deref()
            .ok_or(KubeconfigError::MissingClusterUrl)?
            .parse::<http::Uri>()
            .map_err(KubeconfigError::ParseClusterUrl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
current-context: dev
clusters:
- name: local
  cluster:
    server: http://localhost:8001
- name: broken
  cluster: {}
contexts:
- name: dev
  context:
    cluster: local
    user: dev
- name: nowhere
  context:
    cluster: broken
    user: dev
users:
- name: dev
  user:
    token: t
"#;

    #[test]
    fn loads_current_context() {
        let kc = Kubeconfig::from_yaml(CONFIG).unwrap();
        let loader = ConfigLoader::new_from_kubeconfig(kc, &KubeConfigOptions::default()).unwrap();
        assert_eq!(loader.current_context.cluster, "local");
        assert_eq!(loader.cluster_url().unwrap(), "http://localhost:8001/");
    }

    #[test]
    fn named_context_errors() {
        let kc = Kubeconfig::from_yaml(CONFIG).unwrap();
        let options = KubeConfigOptions {
            context: Some("missing".into()),
            ..Default::default()
        };
        assert!(matches!(
            ConfigLoader::new_from_kubeconfig(kc.clone(), &options),
            Err(KubeconfigError::LoadContext(name)) if name == "missing"
        ));

        let options = KubeConfigOptions {
            context: Some("nowhere".into()),
            ..Default::default()
        };
        let loader = ConfigLoader::new_from_kubeconfig(kc, &options).unwrap();
        assert!(matches!(loader.cluster_url(), Err(KubeconfigError::MissingClusterUrl)));
    }

    #[test]
    fn no_current_context() {
        assert!(matches!(
            ConfigLoader::new_from_kubeconfig(Kubeconfig::default(), &KubeConfigOptions::default()),
            Err(KubeconfigError::CurrentContextNotSet)
        ));
    }
}
