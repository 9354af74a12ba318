//! TSIG authentication mode selection
//!
//! Exactly one mode is chosen per target: an inline key when a secret is
//! configured, else a key file, else none.

use crate::config::TargetConfig;

/// Authentication passed to the external tools
#[derive(Clone, PartialEq, Eq)]
pub enum AuthMode {
    /// `-y algorithm:keyname:secret`
    InlineKey {
        algorithm: String,
        keyname: String,
        secret: String,
    },
    /// `-k path`
    KeyFile(String),
    /// No authentication
    None,
}

impl AuthMode {
    /// Select the authentication mode for a target
    pub fn from_target(target: &TargetConfig) -> Self {
        if let Some(secret) = &target.secret {
            AuthMode::InlineKey {
                algorithm: target.hmac.clone(),
                keyname: target.keyname.clone().unwrap_or_default(),
                secret: secret.clone(),
            }
        } else if let Some(path) = &target.keyfile {
            AuthMode::KeyFile(path.clone())
        } else {
            AuthMode::None
        }
    }

    /// Command-line arguments selecting this mode
    pub fn args(&self) -> Vec<String> {
        match self {
            AuthMode::InlineKey {
                algorithm,
                keyname,
                secret,
            } => vec!["-y".to_string(), format!("{}:{}:{}", algorithm, keyname, secret)],
            AuthMode::KeyFile(path) => vec!["-k".to_string(), path.clone()],
            AuthMode::None => Vec::new(),
        }
    }

    /// Short label for logs
    pub fn label(&self) -> &'static str {
        match self {
            AuthMode::InlineKey { .. } => "inline-key",
            AuthMode::KeyFile(_) => "keyfile",
            AuthMode::None => "none",
        }
    }
}

impl std::fmt::Debug for AuthMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthMode::InlineKey {
                algorithm, keyname, ..
            } => f
                .debug_struct("InlineKey")
                .field("algorithm", algorithm)
                .field("keyname", keyname)
                .field("secret", &"<REDACTED>")
                .finish(),
            AuthMode::KeyFile(path) => f.debug_tuple("KeyFile").field(path).finish(),
            AuthMode::None => f.write_str("None"),
        }
    }
}
