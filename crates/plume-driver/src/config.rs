//! Compiler configuration.

use plume_graph::{FUNCTION_PACKAGE, TYPE_PACKAGE};
use plume_resolver::{MatchOptions, NullMatching};
use smol_str::SmolStr;

/// Configuration for a compiler runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerConfig {
    /// Packages every import group imports implicitly.
    pub core_imports: Vec<SmolStr>,
    /// How call arguments with unknown types are matched.
    pub null_matching: NullMatching,
    /// Log each compile phase.
    pub verbose: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            core_imports: default_core_imports(),
            null_matching: NullMatching::Strict,
            verbose: false,
        }
    }
}

fn default_core_imports() -> Vec<SmolStr> {
    vec![SmolStr::new(TYPE_PACKAGE), SmolStr::new(FUNCTION_PACKAGE)]
}

/// Split a comma separated package list, ignoring blank entries.
fn parse_core_imports(value: &str) -> Vec<SmolStr> {
    value
        .split(',')
        .map(str::trim)
        .filter(|path| !path.is_empty())
        .map(SmolStr::new)
        .collect()
}

fn parse_flag(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

impl CompilerConfig {
    /// Create config from environment variables.
    ///
    /// `PLUME_CORE_IMPORTS` replaces the core imports (comma separated) and
    /// `PLUME_LENIENT_MATCHING` switches to lenient null matching.
    pub fn from_env() -> Self {
        let core_imports = std::env::var("PLUME_CORE_IMPORTS")
            .map(|value| parse_core_imports(&value))
            .unwrap_or_else(|_| default_core_imports());

        let null_matching = match std::env::var("PLUME_LENIENT_MATCHING") {
            Ok(value) if parse_flag(&value) => NullMatching::Lenient,
            _ => NullMatching::Strict,
        };

        Self {
            core_imports,
            null_matching,
            verbose: false,
        }
    }

    /// The options calls are resolved with.
    pub fn match_options(&self) -> MatchOptions {
        MatchOptions::with_null_matching(self.null_matching)
    }

    /// Create a builder for configuration.
    pub fn builder() -> CompilerConfigBuilder {
        CompilerConfigBuilder::default()
    }
}

/// Builder for compiler configuration.
#[derive(Debug, Default)]
pub struct CompilerConfigBuilder {
    config: CompilerConfig,
}

impl CompilerConfigBuilder {
    pub fn core_imports<I, S>(mut self, imports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        self.config.core_imports = imports.into_iter().map(Into::into).collect();
        self
    }

    pub fn null_matching(mut self, null_matching: NullMatching) -> Self {
        self.config.null_matching = null_matching;
        self
    }

    pub fn lenient(self) -> Self {
        self.null_matching(NullMatching::Lenient)
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.config.verbose = verbose;
        self
    }

    pub fn build(self) -> CompilerConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CompilerConfig::default();
        assert_eq!(
            config.core_imports,
            vec!["meta::pure::metamodel::type", "meta::pure::metamodel::function"]
        );
        assert_eq!(config.null_matching, NullMatching::Strict);
        assert_eq!(config.match_options(), MatchOptions::strict());
    }

    #[test]
    fn test_builder() {
        let config = CompilerConfig::builder()
            .core_imports(["meta::pure::metamodel::type"])
            .lenient()
            .verbose(true)
            .build();
        assert_eq!(config.core_imports, vec!["meta::pure::metamodel::type"]);
        assert_eq!(config.match_options(), MatchOptions::lenient());
        assert!(config.verbose);
    }

    #[test]
    fn test_parse_env_values() {
        assert_eq!(
            parse_core_imports(" a::b , ,c "),
            vec![SmolStr::new("a::b"), SmolStr::new("c")]
        );
        assert!(parse_flag("TRUE"));
        assert!(parse_flag("1"));
        assert!(!parse_flag("yes"));
    }
}
