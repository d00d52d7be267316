//! Loaders shipped with the cache

use super::ResourceLoader;
use crate::core::pattern::NamePattern;

/// Catch-all loader for files that need no processing
///
/// Accepts any path ending in an extension and hands the raw bytes through
/// untouched. Installed as the registry fallback by `initialize`; real
/// projects should register dedicated loaders for their asset types.
#[derive(Debug, Clone)]
pub struct DevelopmentLoader {
    pattern: NamePattern,
}

impl DevelopmentLoader {
    /// Any path of word characters, separators, dots and dashes with an extension
    pub const PATTERN: &'static str = r"[A-Za-z0-9_ ./\\-]+\.[A-Za-z0-9]+";

    /// Create the development loader
    pub fn new() -> Self {
        DevelopmentLoader {
            pattern: NamePattern::regex(Self::PATTERN)
                .expect("development loader pattern is valid"),
        }
    }
}

impl Default for DevelopmentLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceLoader for DevelopmentLoader {
    fn name(&self) -> &str {
        "development"
    }

    fn matches(&self, resource: &str) -> bool {
        self.pattern.matches(resource)
    }

    fn use_raw(&self) -> bool {
        true
    }
}

/// Raw passthrough loader that NUL-terminates text assets
///
/// Shaders, scripts and config files are often handed to C-style APIs that
/// expect a terminator after the content.
#[derive(Debug, Clone)]
pub struct TextLoader {
    pattern: NamePattern,
}

impl TextLoader {
    /// Extensions accepted by [`TextLoader::new`]
    pub const PATTERN: &'static str =
        r"(?i).*\.(txt|json|toml|ron|xml|csv|ini|lua|glsl|wgsl|hlsl|vert|frag|comp)";

    /// Text loader for the common text and shader extensions
    pub fn new() -> Self {
        TextLoader {
            pattern: NamePattern::regex(Self::PATTERN).expect("text loader pattern is valid"),
        }
    }

    /// Text loader for a custom set of names
    pub fn with_pattern(pattern: NamePattern) -> Self {
        TextLoader { pattern }
    }
}

impl Default for TextLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceLoader for TextLoader {
    fn name(&self) -> &str {
        "text"
    }

    fn matches(&self, resource: &str) -> bool {
        self.pattern.matches(resource)
    }

    fn use_raw(&self) -> bool {
        true
    }

    fn null_terminate(&self) -> bool {
        true
    }
}
