use anyhow::{bail, Context, Result};
use std::path::PathBuf;

/// Runtime configuration, assembled from environment variables.
///
/// A `.env` file is honored when present (loaded by the binary before
/// [`Config::from_env`] runs). Defaults match a local development setup;
/// the Cohere and Pinecone credentials have no defaults and must be set.
#[derive(Debug, Clone)]
pub struct Config {
    pub embedding: EmbeddingConfig,
    pub pinecone: PineconeConfig,
    pub upload_dir: PathBuf,
    pub max_file_size: usize,
    pub chunking: ChunkingConfig,
    pub database_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub default_top_k: usize,
}

#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub api_key: String,
    pub model: String,
    pub dims: usize,
    /// Override for the Cohere API base URL (tests point this at a mock).
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct PineconeConfig {
    pub api_key: String,
    pub index_name: String,
    /// Data-plane host for the index. When unset, the host is resolved via
    /// the control plane at startup (creating the index if missing).
    pub index_host: Option<String>,
    /// Control-plane base URL (tests point this at a mock).
    pub control_plane_url: String,
}

#[derive(Debug, Clone, Copy)]
pub struct ChunkingConfig {
    /// Window size in characters.
    pub chunk_size: usize,
    /// Characters shared between consecutive windows. Strictly less than
    /// `chunk_size`.
    pub chunk_overlap: usize,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Invalid value for {}: '{}'", key, raw)),
        Err(_) => Ok(default),
    }
}

fn env_required(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("{} environment variable not set", key))
}

impl Config {
    /// Load and validate configuration from the environment.
    ///
    /// Fails fast on missing credentials or inconsistent chunking settings
    /// so a misconfigured server never starts.
    pub fn from_env() -> Result<Self> {
        let config = Self {
            embedding: EmbeddingConfig {
                api_key: env_required("COHERE_API_KEY")?,
                model: env_or("EMBEDDING_MODEL", "embed-english-light-v3.0"),
                dims: env_parse("EMBEDDING_DIMENSION", 384)?,
                base_url: env_or("COHERE_BASE_URL", "https://api.cohere.com"),
            },
            pinecone: PineconeConfig {
                api_key: env_required("PINECONE_API_KEY")?,
                index_name: env_required("PINECONE_INDEX_NAME")?,
                index_host: std::env::var("PINECONE_INDEX_HOST").ok(),
                control_plane_url: env_or("PINECONE_CONTROL_PLANE_URL", "https://api.pinecone.io"),
            },
            upload_dir: PathBuf::from(env_or("UPLOAD_DIR", "/tmp/uploads")),
            max_file_size: env_parse("MAX_FILE_SIZE", 30 * 1024 * 1024)?,
            chunking: ChunkingConfig {
                chunk_size: env_parse("CHUNK_SIZE", 800)?,
                chunk_overlap: env_parse("CHUNK_OVERLAP", 100)?,
            },
            database_path: PathBuf::from(env_or("DATABASE_PATH", "/tmp/chat_history.db")),
            host: env_or("API_HOST", "0.0.0.0"),
            port: env_parse("API_PORT", 8001)?,
            cors_origins: env_or("CORS_ORIGINS", "http://localhost:3000,http://localhost:3001")
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            default_top_k: env_parse("DEFAULT_TOP_K", 5)?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            bail!("CHUNK_SIZE must be > 0");
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            bail!(
                "CHUNK_OVERLAP ({}) must be strictly less than CHUNK_SIZE ({})",
                self.chunking.chunk_overlap,
                self.chunking.chunk_size
            );
        }
        if self.embedding.dims == 0 {
            bail!("EMBEDDING_DIMENSION must be > 0");
        }
        if self.max_file_size == 0 {
            bail!("MAX_FILE_SIZE must be > 0");
        }
        if !(1..=20).contains(&self.default_top_k) {
            bail!("DEFAULT_TOP_K must be in 1..=20");
        }
        Ok(())
    }

    /// Socket address for the HTTP server.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            embedding: EmbeddingConfig {
                api_key: "test-key".to_string(),
                model: "embed-english-light-v3.0".to_string(),
                dims: 384,
                base_url: "https://api.cohere.com".to_string(),
            },
            pinecone: PineconeConfig {
                api_key: "test-key".to_string(),
                index_name: "test-index".to_string(),
                index_host: None,
                control_plane_url: "https://api.pinecone.io".to_string(),
            },
            upload_dir: PathBuf::from("/tmp/uploads"),
            max_file_size: 1024,
            chunking: ChunkingConfig {
                chunk_size: 800,
                chunk_overlap: 100,
            },
            database_path: PathBuf::from("/tmp/test.db"),
            host: "127.0.0.1".to_string(),
            port: 8001,
            cors_origins: vec!["*".to_string()],
            default_top_k: 5,
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn overlap_equal_to_size_rejected() {
        let mut cfg = test_config();
        cfg.chunking.chunk_overlap = cfg.chunking.chunk_size;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn overlap_greater_than_size_rejected() {
        let mut cfg = test_config();
        cfg.chunking.chunk_size = 100;
        cfg.chunking.chunk_overlap = 150;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_chunk_size_rejected() {
        let mut cfg = test_config();
        cfg.chunking.chunk_size = 0;
        cfg.chunking.chunk_overlap = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn top_k_out_of_range_rejected() {
        let mut cfg = test_config();
        cfg.default_top_k = 0;
        assert!(cfg.validate().is_err());
        cfg.default_top_k = 21;
        assert!(cfg.validate().is_err());
    }
}
