//! Highlighting configuration.
//!
//! A [`Config`] is resolved once by the host and shared as `Arc<Config>`.
//! Each pass reads the snapshot it started with, so a reconfiguration never
//! tears a pass in half.

use rustc_hash::FxHashSet;
use scopelight_analysis::{AnalysisOptions, Category};
use scopelight_parser::{TolerancePolicy, TolerateAll, TolerateNothing};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Default delay before a persistent syntax error is shown.
pub const DEFAULT_ERROR_DELAY: Duration = Duration::from_millis(1500);

/// Which nodes the cursor selection marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    /// No selection highlights.
    Off,
    /// Every other node sharing the binding under the cursor.
    #[default]
    Others,
    /// The node under the cursor as well.
    All,
}

impl SelectionMode {
    /// Whether the node under the cursor is marked too.
    #[inline]
    #[must_use]
    pub const fn marks_original(self) -> bool {
        matches!(self, SelectionMode::All)
    }
}

// =============================================================================
// Config
// =============================================================================

/// Complete highlighting configuration. Immutable once built.
#[derive(Clone)]
pub struct Config {
    /// Categories never drawn.
    pub excluded_categories: Vec<Category>,
    /// Builtin names classified as unresolved.
    pub excluded_builtins: FxHashSet<Arc<str>>,
    /// Show a persistent syntax error at all.
    pub error_sign: bool,
    /// How long an error must persist before it is shown.
    pub error_sign_delay: Duration,
    /// Patch minor syntax errors and keep highlighting.
    pub tolerate_syntax_errors: bool,
    /// Which errors count as minor when tolerance is on.
    pub tolerance: Arc<dyn TolerancePolicy>,
    /// `self.x` selects and renames together with other uses of `x` in the
    /// class.
    pub self_attribute_merge: bool,
    /// Diff the whole buffer instead of trusting the changed-line hint.
    pub whole_buffer: bool,
    /// The worker waits this multiple of the previous pass duration before
    /// the next pass.
    pub analysis_delay_factor: f64,
    /// Python 2 list comprehension scoping.
    pub leaking_comprehensions: bool,
    /// Cursor selection behavior.
    pub selection: SelectionMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            excluded_categories: Vec::new(),
            excluded_builtins: FxHashSet::default(),
            error_sign: true,
            error_sign_delay: DEFAULT_ERROR_DELAY,
            tolerate_syntax_errors: true,
            tolerance: Arc::new(TolerateAll),
            self_attribute_merge: true,
            whole_buffer: false,
            analysis_delay_factor: 0.0,
            leaking_comprehensions: false,
            selection: SelectionMode::default(),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("excluded_categories", &self.excluded_categories)
            .field("excluded_builtins", &self.excluded_builtins)
            .field("error_sign", &self.error_sign)
            .field("error_sign_delay", &self.error_sign_delay)
            .field("tolerate_syntax_errors", &self.tolerate_syntax_errors)
            .field("self_attribute_merge", &self.self_attribute_merge)
            .field("whole_buffer", &self.whole_buffer)
            .field("analysis_delay_factor", &self.analysis_delay_factor)
            .field("leaking_comprehensions", &self.leaking_comprehensions)
            .field("selection", &self.selection)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Start building a configuration from the defaults.
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// The policy in effect: [`TolerateNothing`] when tolerance is off.
    #[must_use]
    pub fn policy(&self) -> &dyn TolerancePolicy {
        if self.tolerate_syntax_errors {
            self.tolerance.as_ref()
        } else {
            &TolerateNothing
        }
    }

    /// Options handed to the analyzer.
    #[must_use]
    pub fn analysis_options(&self) -> AnalysisOptions {
        AnalysisOptions {
            leaking_comprehensions: self.leaking_comprehensions,
            excluded_builtins: self.excluded_builtins.clone(),
        }
    }

    /// Whether `category` is drawn.
    #[inline]
    #[must_use]
    pub fn is_drawn(&self, category: Category) -> bool {
        !self.excluded_categories.contains(&category)
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for [`Config`].
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Never draw `category`.
    #[must_use]
    pub fn exclude_category(mut self, category: Category) -> Self {
        if !self.config.excluded_categories.contains(&category) {
            self.config.excluded_categories.push(category);
        }
        self
    }

    /// Classify builtin `name` as unresolved.
    #[must_use]
    pub fn exclude_builtin(mut self, name: &str) -> Self {
        self.config.excluded_builtins.insert(name.into());
        self
    }

    /// Toggle the error indicator.
    #[must_use]
    pub fn error_sign(mut self, enabled: bool) -> Self {
        self.config.error_sign = enabled;
        self
    }

    /// Delay before an error is shown.
    #[must_use]
    pub fn error_sign_delay(mut self, delay: Duration) -> Self {
        self.config.error_sign_delay = delay;
        self
    }

    /// Toggle syntax error tolerance.
    #[must_use]
    pub fn tolerate_syntax_errors(mut self, enabled: bool) -> Self {
        self.config.tolerate_syntax_errors = enabled;
        self
    }

    /// Decide which errors are tolerated.
    #[must_use]
    pub fn tolerance(mut self, policy: impl TolerancePolicy + 'static) -> Self {
        self.config.tolerance = Arc::new(policy);
        self
    }

    /// Toggle `self.x` merging for selection and rename.
    #[must_use]
    pub fn self_attribute_merge(mut self, enabled: bool) -> Self {
        self.config.self_attribute_merge = enabled;
        self
    }

    /// Toggle whole-buffer diffing.
    #[must_use]
    pub fn whole_buffer(mut self, enabled: bool) -> Self {
        self.config.whole_buffer = enabled;
        self
    }

    /// Set the analysis delay factor. Negative and non-finite values are
    /// treated as zero.
    #[must_use]
    pub fn analysis_delay_factor(mut self, factor: f64) -> Self {
        self.config.analysis_delay_factor = if factor.is_finite() { factor.max(0.0) } else { 0.0 };
        self
    }

    /// Toggle Python 2 list comprehension scoping.
    #[must_use]
    pub fn leaking_comprehensions(mut self, enabled: bool) -> Self {
        self.config.leaking_comprehensions = enabled;
        self
    }

    /// Set the cursor selection behavior.
    #[must_use]
    pub fn selection(mut self, mode: SelectionMode) -> Self {
        self.config.selection = mode;
        self
    }

    /// Finish, ready to share between threads.
    #[must_use]
    pub fn build(self) -> Arc<Config> {
        Arc::new(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scopelight_core::{Span, SyntaxError, SyntaxErrorKind};

    fn error(kind: SyntaxErrorKind) -> SyntaxError {
        SyntaxError::new(kind, "boom", Span::new(0, 1), "x\n")
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.error_sign);
        assert!(config.tolerate_syntax_errors);
        assert!(config.self_attribute_merge);
        assert_eq!(config.selection, SelectionMode::Others);
        assert!(config.policy().is_minor(&error(SyntaxErrorKind::UnexpectedToken)));
    }

    #[test]
    fn test_builder() {
        let config = Config::builder()
            .exclude_category(Category::Local)
            .exclude_category(Category::Local)
            .exclude_builtin("print")
            .error_sign(false)
            .analysis_delay_factor(-3.0)
            .leaking_comprehensions(true)
            .build();
        assert_eq!(config.excluded_categories, vec![Category::Local]);
        assert!(!config.is_drawn(Category::Local));
        assert!(config.is_drawn(Category::Global));
        assert!(config.excluded_builtins.contains("print"));
        assert!(!config.error_sign);
        assert_eq!(config.analysis_delay_factor, 0.0);
        assert!(config.analysis_options().leaking_comprehensions);
    }

    #[test]
    fn test_policy_follows_toggle() {
        let only_indent = |e: &SyntaxError| e.kind == SyntaxErrorKind::Indentation;
        let config = Config::builder().tolerance(only_indent).build();
        assert!(config.policy().is_minor(&error(SyntaxErrorKind::Indentation)));
        assert!(!config.policy().is_minor(&error(SyntaxErrorKind::UnclosedBracket)));

        let off = Config::builder().tolerate_syntax_errors(false).build();
        assert!(!off.policy().is_minor(&error(SyntaxErrorKind::Indentation)));
    }
}
