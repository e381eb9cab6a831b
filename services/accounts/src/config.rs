//! Service configuration

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::password::{DEFAULT_ITERATIONS, DEFAULT_MEMORY_KIB};

/// Lowest Argon2 memory cost accepted from the environment, in KiB
pub const MIN_HASH_MEMORY_KIB: u32 = DEFAULT_MEMORY_KIB;
/// Lowest Argon2 pass count accepted from the environment
pub const MIN_HASH_ITERATIONS: u32 = DEFAULT_ITERATIONS;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to
    pub bind_addr: SocketAddr,
    /// Argon2 memory cost in KiB
    pub hash_memory_kib: u32,
    /// Argon2 passes
    pub hash_iterations: u32,
    /// Upper bound for one hash or verify call in seconds
    pub hash_timeout: u64,
}

impl ServerConfig {
    /// Create a new ServerConfig from environment variables
    ///
    /// # Environment Variables
    /// - `ACCOUNTS_BIND_ADDR`: listen address (default: "0.0.0.0:8080")
    /// - `PASSWORD_HASH_MEMORY_KIB`: Argon2 memory cost (default and minimum: 19456)
    /// - `PASSWORD_HASH_ITERATIONS`: Argon2 passes (default and minimum: 2)
    /// - `PASSWORD_HASH_TIMEOUT`: hashing timeout in seconds (default: 5, must be non-zero)
    pub fn from_env() -> Result<Self> {
        let bind_addr = std::env::var("ACCOUNTS_BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string());
        let bind_addr = bind_addr
            .parse::<SocketAddr>()
            .with_context(|| format!("Invalid ACCOUNTS_BIND_ADDR: {}", bind_addr))?;

        let hash_memory_kib = std::env::var("PASSWORD_HASH_MEMORY_KIB")
            .unwrap_or_else(|_| DEFAULT_MEMORY_KIB.to_string())
            .parse()
            .unwrap_or(DEFAULT_MEMORY_KIB);

        let hash_iterations = std::env::var("PASSWORD_HASH_ITERATIONS")
            .unwrap_or_else(|_| DEFAULT_ITERATIONS.to_string())
            .parse()
            .unwrap_or(DEFAULT_ITERATIONS);

        let hash_timeout = std::env::var("PASSWORD_HASH_TIMEOUT")
            .unwrap_or_else(|_| "5".to_string())
            .parse()
            .unwrap_or(5);

        if hash_memory_kib < MIN_HASH_MEMORY_KIB {
            anyhow::bail!(
                "PASSWORD_HASH_MEMORY_KIB must be at least {}, got {}",
                MIN_HASH_MEMORY_KIB,
                hash_memory_kib
            );
        }
        if hash_iterations < MIN_HASH_ITERATIONS {
            anyhow::bail!(
                "PASSWORD_HASH_ITERATIONS must be at least {}, got {}",
                MIN_HASH_ITERATIONS,
                hash_iterations
            );
        }
        if hash_timeout == 0 {
            anyhow::bail!("PASSWORD_HASH_TIMEOUT must be at least 1 second");
        }

        Ok(ServerConfig {
            bind_addr,
            hash_memory_kib,
            hash_iterations,
            hash_timeout,
        })
    }

    /// Hashing timeout as a [`Duration`]
    pub fn hash_timeout(&self) -> Duration {
        Duration::from_secs(self.hash_timeout)
    }
}
