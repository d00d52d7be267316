//! Name patterns for loader selection, preloading and listing
//!
//! Two forms are supported, both compiled to an anchored [`Regex`] so a
//! pattern must match the whole resource name:
//! - Globs: `*` matches within one path segment, `**` matches any number of
//!   segments (`**/` may match none), `?` matches one non-separator character.
//! - Raw regular expressions, for loaders that need more than a glob.

use crate::error::{ResourceError, Result};
use regex::Regex;
use std::fmt;
use std::str::FromStr;

/// Compiled resource name pattern
#[derive(Clone)]
pub struct NamePattern {
    source: String,
    regex: Regex,
}

impl NamePattern {
    /// Compile a glob pattern
    ///
    /// # Examples
    /// ```
    /// use resource_cache::NamePattern;
    ///
    /// let pngs = NamePattern::glob("textures/*.png").unwrap();
    /// assert!(pngs.matches("textures/hero.png"));
    /// assert!(!pngs.matches("textures/ui/button.png"));
    ///
    /// let all_pngs = NamePattern::glob("**/*.png").unwrap();
    /// assert!(all_pngs.matches("hero.png"));
    /// assert!(all_pngs.matches("textures/ui/button.png"));
    /// ```
    pub fn glob(glob: &str) -> Result<Self> {
        let regex = Self::compile(glob, &Self::glob_to_regex(glob))?;
        Ok(NamePattern {
            source: glob.to_string(),
            regex,
        })
    }

    /// Compile a regular expression that must match the entire name
    pub fn regex(pattern: &str) -> Result<Self> {
        let regex = Self::compile(pattern, &format!("^(?:{})$", pattern))?;
        Ok(NamePattern {
            source: pattern.to_string(),
            regex,
        })
    }

    /// Pattern matching every name
    pub fn any() -> Self {
        NamePattern {
            source: "**".to_string(),
            regex: Regex::new("^.*$").expect("catch-all pattern is valid"),
        }
    }

    /// Check whether `name` matches
    pub fn matches(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }

    /// Pattern text as given by the caller
    pub fn as_str(&self) -> &str {
        &self.source
    }

    fn compile(source: &str, expression: &str) -> Result<Regex> {
        Regex::new(expression).map_err(|err| ResourceError::InvalidPattern {
            pattern: source.to_string(),
            reason: err.to_string(),
        })
    }

    fn glob_to_regex(glob: &str) -> String {
        let mut expression = String::with_capacity(glob.len() * 2 + 2);
        expression.push('^');

        let mut chars = glob.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '*' if chars.peek() == Some(&'*') => {
                    chars.next();
                    if chars.peek() == Some(&'/') {
                        chars.next();
                        expression.push_str("(?:.*/)?");
                    } else {
                        expression.push_str(".*");
                    }
                }
                '*' => expression.push_str("[^/]*"),
                '?' => expression.push_str("[^/]"),
                _ => {
                    let mut utf8 = [0u8; 4];
                    expression.push_str(&regex::escape(c.encode_utf8(&mut utf8)));
                }
            }
        }

        expression.push('$');
        expression
    }
}

impl FromStr for NamePattern {
    type Err = ResourceError;

    fn from_str(glob: &str) -> Result<Self> {
        NamePattern::glob(glob)
    }
}

impl fmt::Debug for NamePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NamePattern").field(&self.source).finish()
    }
}

impl fmt::Display for NamePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        let pattern = NamePattern::glob("textures/hero.png").unwrap();
        assert!(pattern.matches("textures/hero.png"));
        assert!(!pattern.matches("textures/hero.pngx"));
        assert!(!pattern.matches("xtextures/hero.png"));
    }

    #[test]
    fn test_single_star_stays_in_segment() {
        let pattern = NamePattern::glob("*.png").unwrap();
        assert!(pattern.matches("sprite.png"));
        assert!(!pattern.matches("textures/sprite.png"));
        assert!(!pattern.matches("sprite.jpg"));
    }

    #[test]
    fn test_double_star() {
        let pattern = NamePattern::glob("textures/**").unwrap();
        assert!(pattern.matches("textures/a.png"));
        assert!(pattern.matches("textures/ui/b.png"));
        assert!(!pattern.matches("sounds/a.ogg"));

        let nested = NamePattern::glob("**/*.ogg").unwrap();
        assert!(nested.matches("a.ogg"));
        assert!(nested.matches("sounds/music/a.ogg"));
        assert!(!nested.matches("sounds/a.wav"));
    }

    #[test]
    fn test_question_mark() {
        let pattern = NamePattern::glob("level?.map").unwrap();
        assert!(pattern.matches("level1.map"));
        assert!(!pattern.matches("level10.map"));
        assert!(!pattern.matches("level/.map"));
    }

    #[test]
    fn test_glob_escapes_regex_metacharacters() {
        let pattern = NamePattern::glob("data+(1).bin").unwrap();
        assert!(pattern.matches("data+(1).bin"));
        assert!(!pattern.matches("dataa(1).bin"));
        assert!(!pattern.matches("data+(1)xbin"));
    }

    #[test]
    fn test_regex_is_anchored() {
        let pattern = NamePattern::regex(r"[a-z]+\.txt").unwrap();
        assert!(pattern.matches("readme.txt"));
        assert!(!pattern.matches("docs/readme.txt"));
        assert!(!pattern.matches("readme.txt.bak"));
    }

    #[test]
    fn test_regex_alternation_is_grouped() {
        let pattern = NamePattern::regex(r"a\.png|b\.png").unwrap();
        assert!(pattern.matches("a.png"));
        assert!(pattern.matches("b.png"));
        assert!(!pattern.matches("a.pngb.png"));
        assert!(!pattern.matches("xa.png"));
    }

    #[test]
    fn test_invalid_regex() {
        let err = NamePattern::regex("(unclosed").unwrap_err();
        assert!(matches!(err, ResourceError::InvalidPattern { .. }));
    }

    #[test]
    fn test_any_and_from_str() {
        assert!(NamePattern::any().matches("anything/at/all.bin"));
        assert!(NamePattern::any().matches(""));

        let parsed: NamePattern = "*.wav".parse().unwrap();
        assert!(parsed.matches("boom.wav"));
        assert_eq!(parsed.as_str(), "*.wav");
        assert_eq!(parsed.to_string(), "*.wav");
    }
}
