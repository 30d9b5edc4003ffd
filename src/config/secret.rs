//! Credential wrappers for registry passwords, relay tokens and connection strings
//!
//! Values are held in [`secrecy::Secret`] so they are zeroized on drop and
//! redacted from `Debug` output. Call `expose_secret()` at the point of use.
//!
//! ```rust
//! use cairn::config::secret_string;
//! use secrecy::ExposeSecret;
//!
//! let password = secret_string("s3cr3t".to_string());
//! assert_eq!(password.expose_secret().as_ref(), "s3cr3t");
//! assert!(!format!("{password:?}").contains("s3cr3t"));
//! ```

use secrecy::{CloneableSecret, DebugSecret, Secret, SerializableSecret};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// String payload of a [`SecretString`]; serialized as the bare string
#[derive(Clone, Debug, Zeroize, Serialize, Deserialize)]
#[serde(transparent)]
#[zeroize(drop)]
pub struct SecretValue(String);

impl CloneableSecret for SecretValue {}
impl DebugSecret for SecretValue {}
impl SerializableSecret for SecretValue {}

impl SecretValue {
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<String> for SecretValue {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for SecretValue {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for SecretValue {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

pub type SecretString = Secret<SecretValue>;

pub fn secret_string(value: String) -> SecretString {
    Secret::new(value.into())
}

pub fn secret_string_opt(value: Option<String>) -> Option<SecretString> {
    value.map(secret_string)
}
