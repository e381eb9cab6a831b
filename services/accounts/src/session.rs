//! Stateless session cookies
//!
//! The logged-in identity travels in the `user` cookie. The server keeps no
//! session storage, only the two long-lived keys needed to open the cookie:
//!
//! - the **block key** (32 bytes) encrypts the JSON payload with AES-256-GCM,
//!   using the cookie name as associated data;
//! - the **hash key** (at least 32 bytes) signs `name|issued_at|sealed` with
//!   HMAC-SHA256 so that any modified value is rejected before decryption.
//!
//! The cookie value is `base64url("<issued_at>|<sealed>|" || mac)`.
//!
//! Keys must survive restarts: regenerating them invalidates every
//! outstanding session. [`SessionConfig::from_env`] reads them from the
//! environment or from a key file that is created once and reused.

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::Path;
use std::time::Duration;

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit, Payload},
};
use anyhow::{Context, Result};
use axum_extra::extract::cookie::{Cookie, SameSite};
use base64ct::{Base64UrlUnpadded, Encoding};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use thiserror::Error;
use tracing::info;

use crate::models::SessionIdentity;

type HmacSha256 = Hmac<Sha256>;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "user";
/// Length of the AES-256 block key
pub const BLOCK_KEY_LEN: usize = 32;
/// Shortest hash key accepted for HMAC-SHA256
pub const MIN_HASH_KEY_LEN: usize = 32;
/// Length of a freshly generated hash key
pub const GENERATED_HASH_KEY_LEN: usize = 64;
/// Default lifetime of a cookie value in seconds (30 days)
pub const DEFAULT_MAX_AGE: u64 = 86400 * 30;

const MAX_COOKIE_LEN: usize = 4096;
const NONCE_LEN: usize = 12;

/// Errors produced while building or opening a session cookie
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("session cookie is malformed")]
    Malformed,

    #[error("session cookie failed authentication")]
    Tampered,

    #[error("session cookie has expired")]
    Expired,

    #[error("session payload could not be sealed: {0}")]
    Encoding(String),

    #[error("invalid session key: {0}")]
    Key(String),

    #[error("session key file error: {0}")]
    Io(#[from] std::io::Error),
}

/// Hash key and block key used by the session codec
#[derive(Clone, PartialEq, Eq)]
pub struct SessionKeys {
    hash_key: Vec<u8>,
    block_key: [u8; BLOCK_KEY_LEN],
}

impl fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionKeys")
            .field("hash_key", &"[redacted]")
            .field("block_key", &"[redacted]")
            .finish()
    }
}

impl SessionKeys {
    /// Build a key pair from raw bytes.
    pub fn new(hash_key: Vec<u8>, block_key: &[u8]) -> Result<Self, SessionError> {
        if hash_key.len() < MIN_HASH_KEY_LEN {
            return Err(SessionError::Key(format!(
                "hash key must be at least {} bytes, got {}",
                MIN_HASH_KEY_LEN,
                hash_key.len()
            )));
        }

        let block_key: [u8; BLOCK_KEY_LEN] = block_key.try_into().map_err(|_| {
            SessionError::Key(format!(
                "block key must be {} bytes, got {}",
                BLOCK_KEY_LEN,
                block_key.len()
            ))
        })?;

        Ok(Self {
            hash_key,
            block_key,
        })
    }

    /// Generate a random key pair.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let mut hash_key = vec![0u8; GENERATED_HASH_KEY_LEN];
        let mut block_key = [0u8; BLOCK_KEY_LEN];
        rng.fill_bytes(&mut hash_key);
        rng.fill_bytes(&mut block_key);

        Self {
            hash_key,
            block_key,
        }
    }

    /// Parse hex-encoded keys.
    pub fn from_hex(hash_key: &str, block_key: &str) -> Result<Self, SessionError> {
        let hash_key = hex::decode(hash_key.trim())
            .map_err(|e| SessionError::Key(format!("hash key is not valid hex: {}", e)))?;
        let block_key = hex::decode(block_key.trim())
            .map_err(|e| SessionError::Key(format!("block key is not valid hex: {}", e)))?;

        Self::new(hash_key, &block_key)
    }

    /// Read keys from `path`, or generate and persist them if the file does
    /// not exist yet.
    ///
    /// The file holds the hex hash key on the first line and the hex block key
    /// on the second. New files are created with mode 0600 on Unix.
    pub fn load_or_create(path: &Path) -> Result<Self, SessionError> {
        match fs::read_to_string(path) {
            Ok(contents) => return Self::parse_key_file(&contents),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let keys = Self::generate();

        let mut options = OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        match options.open(path) {
            Ok(mut file) => {
                file.write_all(keys.to_key_file().as_bytes())?;
                file.sync_all()?;
                info!("Generated new session keys at {}", path.display());
                Ok(keys)
            }
            // Another process created the file first; use its keys.
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                Self::parse_key_file(&fs::read_to_string(path)?)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn parse_key_file(contents: &str) -> Result<Self, SessionError> {
        let mut lines = contents.lines().map(str::trim).filter(|l| !l.is_empty());
        match (lines.next(), lines.next()) {
            (Some(hash_key), Some(block_key)) => Self::from_hex(hash_key, block_key),
            _ => Err(SessionError::Key(
                "key file must contain a hash key and a block key".to_string(),
            )),
        }
    }

    fn to_key_file(&self) -> String {
        format!(
            "{}\n{}\n",
            hex::encode(&self.hash_key),
            hex::encode(self.block_key)
        )
    }
}

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Signing and encryption keys
    pub keys: SessionKeys,
    /// Lifetime of a cookie value in seconds
    pub max_age: u64,
    /// Whether the cookie carries the `Secure` attribute
    pub cookie_secure: bool,
}

impl SessionConfig {
    /// Create a new SessionConfig from environment variables
    ///
    /// # Environment Variables
    /// - `SESSION_HASH_KEY`, `SESSION_BLOCK_KEY`: hex keys; both or neither
    /// - `SESSION_KEY_FILE`: key file used when the keys are not set
    ///   (default: `session.keys`)
    /// - `SESSION_MAX_AGE`: cookie lifetime in seconds (default: 2592000)
    /// - `SESSION_COOKIE_SECURE`: set the `Secure` attribute (default: true)
    pub fn from_env() -> Result<Self> {
        let keys = match (
            std::env::var("SESSION_HASH_KEY").ok(),
            std::env::var("SESSION_BLOCK_KEY").ok(),
        ) {
            (Some(hash_key), Some(block_key)) => {
                info!("Loading session keys from the environment");
                SessionKeys::from_hex(&hash_key, &block_key)
                    .context("Invalid SESSION_HASH_KEY or SESSION_BLOCK_KEY")?
            }
            (None, None) => {
                let path = std::env::var("SESSION_KEY_FILE")
                    .unwrap_or_else(|_| "session.keys".to_string());
                info!("Loading session keys from {}", path);
                SessionKeys::load_or_create(Path::new(&path))
                    .with_context(|| format!("Failed to load session keys from {}", path))?
            }
            _ => anyhow::bail!("SESSION_HASH_KEY and SESSION_BLOCK_KEY must be set together"),
        };

        let max_age = std::env::var("SESSION_MAX_AGE")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_MAX_AGE);

        let cookie_secure = std::env::var("SESSION_COOKIE_SECURE")
            .map(|v| !matches!(v.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no"))
            .unwrap_or(true);

        Ok(SessionConfig {
            keys,
            max_age,
            cookie_secure,
        })
    }

    /// Cookie lifetime as a [`Duration`]
    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age)
    }
}

/// Encodes a [`SessionIdentity`] into an opaque cookie value and back
#[derive(Clone)]
pub struct SessionCodec {
    mac: HmacSha256,
    cipher: Aes256Gcm,
    max_age: i64,
}

impl SessionCodec {
    /// Build a codec from a key pair.
    pub fn new(keys: &SessionKeys, max_age: Duration) -> Result<Self, SessionError> {
        let mac = <HmacSha256 as Mac>::new_from_slice(&keys.hash_key)
            .map_err(|e| SessionError::Key(e.to_string()))?;
        let cipher = Aes256Gcm::new_from_slice(&keys.block_key)
            .map_err(|e| SessionError::Key(e.to_string()))?;
        let max_age = i64::try_from(max_age.as_secs())
            .map_err(|_| SessionError::Key("max age out of range".to_string()))?;

        Ok(Self {
            mac,
            cipher,
            max_age,
        })
    }

    /// Seal an identity into a cookie value.
    pub fn encode(&self, identity: &SessionIdentity) -> Result<String, SessionError> {
        self.encode_at(identity, chrono::Utc::now().timestamp())
    }

    /// Open a cookie value. Any error means "no session".
    pub fn decode(&self, value: &str) -> Result<SessionIdentity, SessionError> {
        self.decode_at(value, chrono::Utc::now().timestamp())
    }

    fn encode_at(
        &self,
        identity: &SessionIdentity,
        issued_at: i64,
    ) -> Result<String, SessionError> {
        let plaintext =
            serde_json::to_vec(identity).map_err(|e| SessionError::Encoding(e.to_string()))?;

        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce);

        let ciphertext = self
            .cipher
            .encrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: &plaintext,
                    aad: SESSION_COOKIE.as_bytes(),
                },
            )
            .map_err(|e| SessionError::Encoding(e.to_string()))?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        let sealed = Base64UrlUnpadded::encode_string(&sealed);

        let issued_at = issued_at.to_string();
        let tag = self.mac_for(&issued_at, &sealed).finalize().into_bytes();

        let mut raw = format!("{}|{}|", issued_at, sealed).into_bytes();
        raw.extend_from_slice(&tag);

        Ok(Base64UrlUnpadded::encode_string(&raw))
    }

    fn decode_at(&self, value: &str, now: i64) -> Result<SessionIdentity, SessionError> {
        if value.is_empty() || value.len() > MAX_COOKIE_LEN {
            return Err(SessionError::Malformed);
        }

        let raw = Base64UrlUnpadded::decode_vec(value).map_err(|_| SessionError::Malformed)?;
        // Only the canonical encoding of a byte string is accepted.
        if Base64UrlUnpadded::encode_string(&raw) != value {
            return Err(SessionError::Malformed);
        }

        let mut parts = raw.splitn(3, |b| *b == b'|');
        let (Some(issued_at), Some(sealed), Some(tag)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(SessionError::Malformed);
        };
        let issued_at = std::str::from_utf8(issued_at).map_err(|_| SessionError::Malformed)?;
        let sealed = std::str::from_utf8(sealed).map_err(|_| SessionError::Malformed)?;

        self.mac_for(issued_at, sealed)
            .verify_slice(tag)
            .map_err(|_| SessionError::Tampered)?;

        let issued_at: i64 = issued_at.parse().map_err(|_| SessionError::Malformed)?;
        if issued_at < now.saturating_sub(self.max_age) {
            return Err(SessionError::Expired);
        }

        let sealed = Base64UrlUnpadded::decode_vec(sealed).map_err(|_| SessionError::Malformed)?;
        if sealed.len() <= NONCE_LEN {
            return Err(SessionError::Malformed);
        }
        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);

        let plaintext = self
            .cipher
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: ciphertext,
                    aad: SESSION_COOKIE.as_bytes(),
                },
            )
            .map_err(|_| SessionError::Tampered)?;

        serde_json::from_slice(&plaintext).map_err(|_| SessionError::Malformed)
    }

    fn mac_for(&self, issued_at: &str, sealed: &str) -> HmacSha256 {
        let mut mac = self.mac.clone();
        mac.update(SESSION_COOKIE.as_bytes());
        mac.update(b"|");
        mac.update(issued_at.as_bytes());
        mac.update(b"|");
        mac.update(sealed.as_bytes());
        mac
    }
}

/// Cookie carrying a freshly encoded session value
pub fn session_cookie(value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

/// Cookie that makes the browser drop the session
pub fn clear_session_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .max_age(time::Duration::seconds(-1))
        .build()
}
