//! Engine configuration.
//!
//! A matcher core is configured in-process by its embedder, not from a file
//! on disk — so unlike a CLI-facing `ProjectConfig`, there's no TOML layer
//! here, just a small validated builder.

use crate::error::PathForgeError;

const ALLOWED_DELIMITERS: [u8; 3] = [b'/', b':', b'|'];

/// Options for [`crate::Engine::new`].
#[derive(Debug, Clone, Copy)]
pub struct EngineOptions {
    pub(crate) delimiter: u8,
    pub(crate) node_pool_size_hint: u32,
    pub(crate) assume_ascii: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            delimiter: b'/',
            node_pool_size_hint: 64,
            assume_ascii: false,
        }
    }
}

impl EngineOptions {
    pub fn builder() -> EngineOptionsBuilder {
        EngineOptionsBuilder::default()
    }

    pub(crate) fn validate(&self) -> Result<(), PathForgeError> {
        if !ALLOWED_DELIMITERS.contains(&self.delimiter) {
            return Err(PathForgeError::InvalidDelimiter);
        }
        Ok(())
    }
}

/// Fluent builder for [`EngineOptions`].
#[derive(Debug, Clone, Copy)]
pub struct EngineOptionsBuilder {
    opts: EngineOptions,
}

impl Default for EngineOptionsBuilder {
    fn default() -> Self {
        Self {
            opts: EngineOptions::default(),
        }
    }
}

impl EngineOptionsBuilder {
    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.opts.delimiter = delimiter;
        self
    }

    pub fn node_pool_size_hint(mut self, hint: u32) -> Self {
        self.opts.node_pool_size_hint = hint;
        self
    }

    pub fn assume_ascii(mut self, assume_ascii: bool) -> Self {
        self.opts.assume_ascii = assume_ascii;
        self
    }

    pub fn build(self) -> EngineOptions {
        self.opts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_delimiter_is_slash() {
        assert_eq!(EngineOptions::default().delimiter, b'/');
        assert!(EngineOptions::default().validate().is_ok());
    }

    #[test]
    fn builder_overrides_delimiter() {
        let opts = EngineOptions::builder().delimiter(b':').build();
        assert_eq!(opts.delimiter, b':');
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn invalid_delimiter_rejected() {
        let opts = EngineOptions::builder().delimiter(b'#').build();
        assert!(matches!(opts.validate(), Err(PathForgeError::InvalidDelimiter)));
    }
}
