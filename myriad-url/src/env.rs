//! Runtime environment probing.
//!
//! The parser asks an [`EnvSource`] whether it is running inside a known
//! embedding host. When it is, and `autoConfigureForEmbedding` is on, the
//! host's named configuration is appended to `useConfigs`.

use std::collections::HashMap;

/// Variable naming the embedding context.
pub const EMBEDDING_CONTEXT_VAR: &str = "MYRIAD_EMBEDDING_CONTEXT";

/// Source for environment variables.
pub trait EnvSource: Send + Sync {
    /// Get an environment variable value.
    fn get(&self, name: &str) -> Option<String>;

    /// Check if a variable exists.
    fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

/// Default environment source using std::env.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdEnvSource;

impl EnvSource for StdEnvSource {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Environment source backed by a HashMap.
#[derive(Debug, Clone, Default)]
pub struct MapEnvSource {
    vars: HashMap<String, String>,
}

impl MapEnvSource {
    /// Create a new map-based environment source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variable.
    pub fn set(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }
}

impl EnvSource for MapEnvSource {
    fn get(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}

/// An application server the driver knows how to tune for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmbeddingContext {
    /// Adobe ColdFusion.
    ColdFusion,
}

impl EmbeddingContext {
    /// Detect the embedding context from the environment.
    pub fn detect(env: &dyn EnvSource) -> Option<Self> {
        let value = env.get(EMBEDDING_CONTEXT_VAR)?;
        match value.trim().to_ascii_lowercase().as_str() {
            "coldfusion" | "cold-fusion" => Some(Self::ColdFusion),
            _ => None,
        }
    }

    /// Named configuration applied for this context.
    pub fn configuration_name(&self) -> &'static str {
        match self {
            Self::ColdFusion => "coldFusion",
        }
    }
}
