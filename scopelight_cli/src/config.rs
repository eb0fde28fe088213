//! Run configuration aggregated from CLI flags and environment variables.
//!
//! Resolved once at startup. The engine configuration is derived from it.

use crate::args::CliArgs;
use scopelight_analysis::Category;
use scopelight_core::Position;
use scopelight_engine::Config;
use std::sync::Arc;

/// Environment variable holding a `tracing` filter directive.
pub const ENV_LOG: &str = "SCOPELIGHT_LOG";
/// Truthy to disable syntax error tolerance.
pub const ENV_NO_TOLERANCE: &str = "SCOPELIGHT_NO_TOLERANCE";
/// Comma-separated categories to leave out.
pub const ENV_EXCLUDE: &str = "SCOPELIGHT_EXCLUDE";

// =============================================================================
// CLI Configuration
// =============================================================================

/// Complete configuration resolved from CLI args and environment.
#[derive(Debug, Clone, PartialEq)]
pub struct CliConfig {
    /// Categories left out of the output. Flags first, then the environment.
    pub excluded: Vec<Category>,

    /// Patch over syntax errors.
    pub tolerate: bool,

    /// Comprehension targets bind in the enclosing scope.
    pub leaking_comprehensions: bool,

    /// Query position (`--at`).
    pub at: Option<Position>,

    /// `-v` count.
    pub verbose: u32,

    /// `-q`.
    pub quiet: bool,

    /// Filter directive from the environment, overriding `-v`/`-q`.
    pub log_filter: Option<String>,

    /// Environment entries that could not be used.
    pub ignored: Vec<String>,
}

impl CliConfig {
    /// Resolve configuration from parsed CLI args and the process environment.
    pub fn from_args(args: &CliArgs) -> Self {
        Self::resolve(args, |var| std::env::var(var).ok())
    }

    /// Resolve configuration against an arbitrary environment lookup.
    pub fn resolve(args: &CliArgs, env: impl Fn(&str) -> Option<String>) -> Self {
        let mut excluded = args.exclude.clone();
        let mut ignored = Vec::new();
        if let Some(list) = env(ENV_EXCLUDE) {
            for name in list.split(',').map(str::trim).filter(|n| !n.is_empty()) {
                match name.parse::<Category>() {
                    Ok(category) if !excluded.contains(&category) => excluded.push(category),
                    Ok(_) => {}
                    Err(err) => ignored.push(format!("{ENV_EXCLUDE}: {err}")),
                }
            }
        }

        let tolerate = !(args.no_tolerance || env(ENV_NO_TOLERANCE).is_some_and(|v| truthy(&v)));
        let log_filter = env(ENV_LOG).filter(|v| !v.trim().is_empty());

        Self {
            excluded,
            tolerate,
            leaking_comprehensions: args.leaking_comprehensions,
            at: args.at,
            verbose: args.verbose,
            quiet: args.quiet,
            log_filter,
            ignored,
        }
    }

    /// `tracing` filter directive for stderr logging.
    pub fn log_directive(&self) -> String {
        if let Some(filter) = &self.log_filter {
            return filter.clone();
        }
        let level = match (self.quiet, self.verbose) {
            (true, _) => "error",
            (false, 0) => "warn",
            (false, 1) => "info",
            (false, 2) => "debug",
            (false, _) => "trace",
        };
        level.to_owned()
    }

    /// Engine configuration for this run.
    pub fn engine_config(&self) -> Arc<Config> {
        self.excluded
            .iter()
            .fold(Config::builder(), |builder, &category| {
                builder.exclude_category(category)
            })
            .tolerate_syntax_errors(self.tolerate)
            .leaking_comprehensions(self.leaking_comprehensions)
            .error_sign_delay(std::time::Duration::ZERO)
            .build()
    }
}

/// Non-empty and not `0`.
#[inline]
fn truthy(value: &str) -> bool {
    !value.is_empty() && value != "0"
}

// =============================================================================
// Tests
// =============================================================================
