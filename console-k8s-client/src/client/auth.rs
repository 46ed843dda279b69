use std::path::PathBuf;

use http::HeaderValue;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use crate::config::AuthInfo;

/// Possible errors when preparing request authentication
#[derive(Error, Debug)]
pub enum AuthError {
    /// Invalid bearer token
    #[error("invalid bearer token: {0}")]
    InvalidBearerToken(#[source] http::header::InvalidHeaderValue),

    /// Failed to read token file
    #[error("failed to read token file '{1:?}': {0}")]
    ReadTokenFile(#[source] std::io::Error, PathBuf),
}

#[derive(Debug, Clone)]
pub(crate) enum Auth {
    None,
    Basic(String, SecretString),
    Bearer(SecretString),
}

impl TryFrom<&AuthInfo> for Auth {
    type Error = AuthError;

    /// Basic auth wins over a token, and an inline token over a token file.
    fn try_from(auth_info: &AuthInfo) -> Result<Self, Self::Error> {
        if let (Some(u), Some(p)) = (&auth_info.username, &auth_info.password) {
            return Ok(Self::Basic(u.to_owned(), p.to_owned()));
        }

        let token = match (&auth_info.token, &auth_info.token_file) {
            (Some(token), _) => token.clone(),
            (None, Some(file)) => {
                let raw = std::fs::read_to_string(file)
                    .map_err(|source| AuthError::ReadTokenFile(source, file.into()))?;
                SecretString::from(raw.trim_end().to_string())
            }
            (None, None) => return Ok(Self::None),
        };
        HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
            .map_err(AuthError::InvalidBearerToken)?;
        Ok(Self::Bearer(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_info(token: &str) -> AuthInfo {
        AuthInfo {
            token: Some(SecretString::from(token.to_string())),
            ..Default::default()
        }
    }

    #[test]
    fn basic_wins_over_token() {
        let info = AuthInfo {
            username: Some("admin".into()),
            password: Some(SecretString::from("pw".to_string())),
            ..token_info("t")
        };
        assert!(matches!(Auth::try_from(&info).unwrap(), Auth::Basic(u, _) if u == "admin"));
        assert!(matches!(Auth::try_from(&AuthInfo::default()).unwrap(), Auth::None));
    }

    #[test]
    fn token_file_is_read_and_trimmed() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "file-token\n").unwrap();
        let info = AuthInfo {
            token_file: file.path().to_str().map(String::from),
            ..Default::default()
        };
        match Auth::try_from(&info).unwrap() {
            Auth::Bearer(token) => assert_eq!(token.expose_secret(), "file-token"),
            other => panic!("unexpected auth {other:?}"),
        }
    }

    #[test]
    fn invalid_token_is_rejected() {
        assert!(matches!(
            Auth::try_from(&token_info("\n")),
            Err(AuthError::InvalidBearerToken(_))
        ));
        let info = AuthInfo {
            token_file: Some("/nonexistent/console-token".into()),
            ..Default::default()
        };
        assert!(matches!(Auth::try_from(&info), Err(AuthError::ReadTokenFile(..))));
    }
}
