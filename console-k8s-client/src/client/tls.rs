//! TLS connector configuration for cluster urls served over https
/// Rustls client configuration
#[cfg(feature = "rustls-tls")]
pub mod rustls_tls {
    use std::sync::Arc;

    use rustls::{
        client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier},
        crypto::{ring, verify_tls12_signature, verify_tls13_signature, CryptoProvider},
        pki_types::{
            CertificateDer, PrivateKeyDer, PrivatePkcs1KeyDer, PrivatePkcs8KeyDer, PrivateSec1KeyDer,
            ServerName, UnixTime,
        },
        ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme,
    };
    use thiserror::Error;

    /// Errors from Rustls
    #[derive(Debug, Error)]
    pub enum Error {
        /// Identity PEM is invalid
        #[error("identity PEM is invalid: {0}")]
        InvalidIdentityPem(#[source] pem::PemError),

        /// Identity PEM is missing a private key: the key must be PKCS8, PKCS1 or SEC1
        #[error("identity PEM is missing a private key: the key must be PKCS8, PKCS1 or SEC1")]
        MissingPrivateKey,

        /// Identity PEM is missing certificate
        #[error("identity PEM is missing certificate")]
        MissingCertificate,

        /// Invalid private key
        #[error("invalid private key: {0}")]
        InvalidPrivateKey(#[source] rustls::Error),

        /// Failed to add a root certificate
        #[error("failed to add a root certificate: {0}")]
        AddRootCertificate(#[source] rustls::Error),

        /// No usable protocol versions
        #[error("no usable protocol versions: {0}")]
        ProtocolVersions(#[source] rustls::Error),
    }

    /// Create `rustls::ClientConfig`.
    pub fn rustls_client_config(
        identity_pem: Option<&[u8]>,
        root_certs: Option<&[Vec<u8>]>,
        accept_invalid: bool,
    ) -> Result<ClientConfig, Error> {
        let provider = Arc::new(ring::default_provider());
        let builder = ClientConfig::builder_with_provider(provider.clone())
            .with_safe_default_protocol_versions()
            .map_err(Error::ProtocolVersions)?;

        let builder = if accept_invalid {
            builder
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(NoCertificateVerification(provider)))
        } else {
            let mut roots = RootCertStore::empty();
            for der in root_certs.unwrap_or_default() {
                roots
                    .add(CertificateDer::from(der.clone()))
                    .map_err(Error::AddRootCertificate)?;
            }
            builder.with_root_certificates(roots)
        };

        match identity_pem {
            Some(identity_pem) => {
                let (chain, key) = client_auth(identity_pem)?;
                builder
                    .with_client_auth_cert(chain, key)
                    .map_err(Error::InvalidPrivateKey)
            }
            None => Ok(builder.with_no_client_auth()),
        }
    }

    fn client_auth(data: &[u8]) -> Result<(Vec<CertificateDer<'static>>, PrivateKeyDer<'static>), Error> {
        let mut cert_chain = Vec::new();
        let mut private_key = None;
        for block in pem::parse_many(data).map_err(Error::InvalidIdentityPem)? {
            let contents = block.contents().to_vec();
            match block.tag() {
                "CERTIFICATE" => cert_chain.push(CertificateDer::from(contents)),
                "PRIVATE KEY" => private_key = Some(PrivatePkcs8KeyDer::from(contents).into()),
                "RSA PRIVATE KEY" => private_key = Some(PrivatePkcs1KeyDer::from(contents).into()),
                "EC PRIVATE KEY" => private_key = Some(PrivateSec1KeyDer::from(contents).into()),
                _ => {}
            }
        }

        let private_key = private_key.ok_or(Error::MissingPrivateKey)?;
        if cert_chain.is_empty() {
            return Err(Error::MissingCertificate);
        }
        Ok((cert_chain, private_key))
    }

    // Accepts any server certificate, while still checking handshake signatures
    #[derive(Debug)]
    struct NoCertificateVerification(Arc<CryptoProvider>);

    impl ServerCertVerifier for NoCertificateVerification {
        fn verify_server_cert(
            &self,
            _end_entity: &CertificateDer<'_>,
            _intermediates: &[CertificateDer<'_>],
            _server_name: &ServerName<'_>,
            _ocsp_response: &[u8],
            _now: UnixTime,
        ) -> Result<ServerCertVerified, rustls::Error> {
            tracing::warn!("Server cert bypassed");
            Ok(ServerCertVerified::assertion())
        }

        fn verify_tls12_signature(
            &self,
            message: &[u8],
            cert: &CertificateDer<'_>,
            dss: &DigitallySignedStruct,
        ) -> Result<HandshakeSignatureValid, rustls::Error> {
            verify_tls12_signature(message, cert, dss, &self.0.signature_verification_algorithms)
        }

        fn verify_tls13_signature(
            &self,
            message: &[u8],
            cert: &CertificateDer<'_>,
            dss: &DigitallySignedStruct,
        ) -> Result<HandshakeSignatureValid, rustls::Error> {
            verify_tls13_signature(message, cert, dss, &self.0.signature_verification_algorithms)
        }

        fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
            self.0.signature_verification_algorithms.supported_schemes()
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        fn block(tag: &str, contents: &[u8]) -> String {
            pem::encode(&pem::Pem::new(tag, contents.to_vec()))
        }

        #[test]
        fn plain_config_builds() {
            assert!(rustls_client_config(None, None, false).is_ok());
            assert!(rustls_client_config(None, None, true).is_ok());
        }

        #[test]
        fn garbage_root_certificate_is_rejected() {
            let roots = vec![b"not a certificate".to_vec()];
            assert!(matches!(
                rustls_client_config(None, Some(&roots), false),
                Err(Error::AddRootCertificate(_))
            ));
        }

        #[test]
        fn identity_needs_key_and_certificate() {
            let cert_only = block("CERTIFICATE", &[1, 2, 3]);
            assert!(matches!(
                client_auth(cert_only.as_bytes()),
                Err(Error::MissingPrivateKey)
            ));

            let key_only = block("RSA PRIVATE KEY", &[4, 5, 6]);
            assert!(matches!(
                client_auth(key_only.as_bytes()),
                Err(Error::MissingCertificate)
            ));

            let both = format!("{}{}", block("EC PRIVATE KEY", &[7]), block("CERTIFICATE", &[8]));
            let (chain, key) = client_auth(both.as_bytes()).unwrap();
            assert_eq!(chain.len(), 1);
            assert!(matches!(key, PrivateKeyDer::Sec1(_)));
        }
    }
}
