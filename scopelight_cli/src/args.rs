//! Command-line argument parser.
//!
//! Hand-rolled: the flag set is small and startup stays dependency free.

use scopelight_analysis::Category;
use scopelight_core::Position;
use std::ffi::OsString;
use std::path::PathBuf;

// =============================================================================
// Mode
// =============================================================================

/// What the invocation should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Print the highlights of one file: `scopelight file.py`
    Highlight(PathBuf),
    /// Print the operations between two versions: `scopelight --diff old.py new.py`
    Diff {
        /// Version drawn first.
        old: PathBuf,
        /// Version diffed against it.
        new: PathBuf,
    },
    /// Print version and exit: `-V` or `--version`
    PrintVersion,
    /// Print help and exit: `-h` or `--help`
    PrintHelp,
}

// =============================================================================
// Parsed Arguments
// =============================================================================

/// Complete set of parsed CLI arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    /// What to run.
    pub mode: Mode,

    /// `--at LINE:COL`: print the names sharing a binding with this one.
    pub at: Option<Position>,

    /// `-x CATEGORY`: categories to leave out, in the order given.
    pub exclude: Vec<Category>,

    /// `--no-tolerance`: report every syntax error instead of patching.
    pub no_tolerance: bool,

    /// `--leaking-comprehensions`: comprehension targets bind in the
    /// enclosing scope.
    pub leaking_comprehensions: bool,

    /// `-v`: log verbosity, once per flag.
    pub verbose: u32,

    /// `-q`: only errors on stderr.
    pub quiet: bool,
}

impl Default for CliArgs {
    fn default() -> Self {
        Self {
            mode: Mode::PrintHelp,
            at: None,
            exclude: Vec::new(),
            no_tolerance: false,
            leaking_comprehensions: false,
            verbose: 0,
            quiet: false,
        }
    }
}

// =============================================================================
// Parse Error
// =============================================================================

/// Error during argument parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgError {
    /// Missing required argument value (e.g., `-x` without a category).
    MissingValue(&'static str),
    /// Unknown flag.
    UnknownFlag(String),
    /// A flag value that does not parse.
    InvalidValue {
        /// The flag.
        flag: &'static str,
        /// What was given.
        value: String,
    },
    /// No input file.
    MissingFile,
    /// A positional argument beyond the expected ones.
    UnexpectedArgument(String),
}

impl std::fmt::Display for ArgError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArgError::MissingValue(flag) => {
                write!(f, "argument expected for the {} option", flag)
            }
            ArgError::UnknownFlag(flag) => write!(f, "unknown option: {}", flag),
            ArgError::InvalidValue { flag, value } => {
                write!(f, "invalid value for {}: '{}'", flag, value)
            }
            ArgError::MissingFile => f.write_str("no input file"),
            ArgError::UnexpectedArgument(arg) => write!(f, "unexpected argument: {}", arg),
        }
    }
}

impl std::error::Error for ArgError {}

// =============================================================================
// Parser Entry Point
// =============================================================================

/// Parse command-line arguments (without the program name) into `CliArgs`.
///
/// Options and positionals may be interleaved; `--` ends option parsing.
/// `-h` and `-V` win over everything after them.
pub fn parse_args<I, S>(args: I) -> Result<CliArgs, ArgError>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
{
    let args: Vec<String> = args
        .into_iter()
        .map(|s| s.into().to_string_lossy().into_owned())
        .collect();

    parse_args_vec(&args)
}

/// Parse from a pre-collected `Vec<String>`.
pub fn parse_args_vec(args: &[String]) -> Result<CliArgs, ArgError> {
    let mut result = CliArgs::default();
    let mut files: Vec<PathBuf> = Vec::new();
    let mut diff = false;
    let mut i = 0;

    while i < args.len() {
        let arg = &args[i];

        if arg == "--" {
            files.extend(args[i + 1..].iter().map(PathBuf::from));
            break;
        }

        if !arg.starts_with('-') || arg == "-" {
            files.push(PathBuf::from(arg));
            i += 1;
            continue;
        }

        if let Some(long) = arg.strip_prefix("--") {
            let (name, inline) = match long.split_once('=') {
                Some((name, value)) => (name, Some(value.to_owned())),
                None => (long, None),
            };
            match name {
                "version" => {
                    result.mode = Mode::PrintVersion;
                    return Ok(result);
                }
                "help" => {
                    result.mode = Mode::PrintHelp;
                    return Ok(result);
                }
                "diff" => diff = true,
                "no-tolerance" => result.no_tolerance = true,
                "leaking-comprehensions" => result.leaking_comprehensions = true,
                "at" => {
                    let value = take_value(args, &mut i, inline, "--at")?;
                    result.at = Some(parse_position(&value)?);
                }
                "exclude" => {
                    let value = take_value(args, &mut i, inline, "--exclude")?;
                    result.exclude.push(parse_category(&value, "--exclude")?);
                }
                _ => return Err(ArgError::UnknownFlag(arg.clone())),
            }
            i += 1;
            continue;
        }

        // Short options, bundled: `-vvq`, `-xlocal`.
        let flag_chars: Vec<char> = arg[1..].chars().collect();
        let mut j = 0;
        while j < flag_chars.len() {
            match flag_chars[j] {
                'V' => {
                    result.mode = Mode::PrintVersion;
                    return Ok(result);
                }
                'h' => {
                    result.mode = Mode::PrintHelp;
                    return Ok(result);
                }
                'x' => {
                    let bundled = (j + 1 < flag_chars.len())
                        .then(|| flag_chars[j + 1..].iter().collect::<String>());
                    let value = take_value(args, &mut i, bundled, "-x")?;
                    result.exclude.push(parse_category(&value, "-x")?);
                    break;
                }
                'v' => result.verbose = result.verbose.saturating_add(1),
                'q' => result.quiet = true,
                other => return Err(ArgError::UnknownFlag(format!("-{}", other))),
            }
            j += 1;
        }

        i += 1;
    }

    let mut files = files.into_iter();
    result.mode = if diff {
        match (files.next(), files.next()) {
            (Some(old), Some(new)) => Mode::Diff { old, new },
            _ => return Err(ArgError::MissingFile),
        }
    } else {
        Mode::Highlight(files.next().ok_or(ArgError::MissingFile)?)
    };
    if let Some(extra) = files.next() {
        return Err(ArgError::UnexpectedArgument(extra.display().to_string()));
    }

    Ok(result)
}

/// The value of an option: given inline, or the next argument.
fn take_value(
    args: &[String],
    i: &mut usize,
    inline: Option<String>,
    flag: &'static str,
) -> Result<String, ArgError> {
    if let Some(value) = inline {
        return Ok(value);
    }
    *i += 1;
    args.get(*i).cloned().ok_or(ArgError::MissingValue(flag))
}

fn parse_category(value: &str, flag: &'static str) -> Result<Category, ArgError> {
    value.parse().map_err(|_| ArgError::InvalidValue {
        flag,
        value: value.to_owned(),
    })
}

/// `LINE:COL`, 1-indexed line and 0-indexed byte column.
fn parse_position(value: &str) -> Result<Position, ArgError> {
    let invalid = || ArgError::InvalidValue {
        flag: "--at",
        value: value.to_owned(),
    };
    let (line, column) = value.split_once(':').ok_or_else(invalid)?;
    let line: u32 = line.parse().map_err(|_| invalid())?;
    let column: u32 = column.parse().map_err(|_| invalid())?;
    if line == 0 {
        return Err(invalid());
    }
    Ok(Position::new(line, column))
}

// =============================================================================
// Version / Help Text
// =============================================================================

/// `scopelight <version> (Python <py_version> grammar)`
#[inline]
pub fn version_string() -> String {
    format!(
        "scopelight {} (Python {}.{} grammar)",
        scopelight_core::VERSION,
        scopelight_core::PYTHON_VERSION.0,
        scopelight_core::PYTHON_VERSION.1,
    )
}

/// Usage and option summary.
pub fn help_text() -> String {
    let categories: Vec<&str> = Category::ALL.iter().map(|c| c.as_str()).collect();
    format!(
        r#"usage: scopelight [option] ... file
       scopelight [option] ... --diff old new
Options (and corresponding environment variables):
--at LINE:COL  : print the names bound together with the name at LINE:COL
--diff         : print the highlight operations turning old into new
-x CATEGORY    : leave out CATEGORY (repeatable; also SCOPELIGHT_EXCLUDE=a,b)
--no-tolerance : report syntax errors instead of patching over them
                 (also SCOPELIGHT_NO_TOLERANCE=x)
--leaking-comprehensions
               : comprehension targets bind in the enclosing scope
-v             : more logging on stderr (repeatable; also SCOPELIGHT_LOG=filter)
-q             : only errors on stderr
-h             : print this help message and exit (also --help)
-V             : print the version number and exit (also --version)

Categories: {}
"#,
        categories.join(", ")
    )
}

// =============================================================================
// Tests
// =============================================================================
