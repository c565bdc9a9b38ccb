use std::path::PathBuf;

/// The error type used throughout this crate.
#[derive(Debug)]
pub enum Error {
    /// Several errors were collected together, typically during a tree walk
    /// where the caller's error handler chose to continue rather than abort.
    Partial(Vec<Error>),
    /// A gitignore pattern line could not be translated into a regex.
    Pattern {
        /// The offending line, verbatim.
        line: String,
        /// A human-readable description of what went wrong.
        reason: String,
    },
    /// A backend or pattern-factory name was not found in the registry.
    Unknown {
        /// What kind of name this was (`"pattern factory"` or `"backend"`).
        kind: &'static str,
        /// The name that was looked up.
        name: String,
    },
    /// `register_pattern` was called with a name that already exists and
    /// `override` was false.
    AlreadyRegistered {
        /// The colliding name.
        name: String,
    },
    /// The tree walk detected that two distinct relative paths resolve to
    /// the same real directory, i.e. a symlink cycle.
    Recursion {
        /// The real (canonicalized) path shared by both encounters.
        real_path: PathBuf,
        /// The relative path at which the real path was first encountered.
        first_path: PathBuf,
        /// The relative path at which the real path was encountered again.
        second_path: PathBuf,
    },
    /// Extra context: the inner error occurred while processing `path`.
    WithPath { path: PathBuf, err: Box<Error> },
    /// Extra context: the inner error occurred while processing source
    /// line number `line`.
    WithLine { line: u64, err: Box<Error> },
    /// An I/O error, typically from the tree walk.
    Io(std::io::Error),
}

impl Error {
    /// Returns true if this is a collection of errors.
    pub fn is_partial(&self) -> bool {
        matches!(*self, Error::Partial(_))
    }

    /// Returns true if this error is an I/O error, possibly wrapped with
    /// path or line context.
    pub fn is_io(&self) -> bool {
        match *self {
            Error::Io(_) => true,
            Error::WithPath { ref err, .. } => err.is_io(),
            Error::WithLine { ref err, .. } => err.is_io(),
            Error::Partial(_)
            | Error::Pattern { .. }
            | Error::Unknown { .. }
            | Error::AlreadyRegistered { .. }
            | Error::Recursion { .. } => false,
        }
    }

    /// Attach path context to this error.
    pub fn with_path(self, path: impl Into<PathBuf>) -> Error {
        Error::WithPath { path: path.into(), err: Box::new(self) }
    }

    /// Attach source-line context to this error.
    pub fn with_line(self, line: u64) -> Error {
        Error::WithLine { line, err: Box::new(self) }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            Error::Io(ref err) => Some(err),
            Error::WithPath { ref err, .. } => Some(&**err),
            Error::WithLine { ref err, .. } => Some(&**err),
            _ => None,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Error::Partial(ref errs) => {
                for (i, err) in errs.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{err}")?;
                }
                Ok(())
            }
            Error::Pattern { ref line, ref reason } => {
                write!(f, "invalid pattern {line:?}: {reason}")
            }
            Error::Unknown { kind, ref name } => {
                write!(f, "unknown {kind}: {name:?}")
            }
            Error::AlreadyRegistered { ref name } => {
                write!(f, "{name:?} is already registered")
            }
            Error::Recursion { ref real_path, ref first_path, ref second_path } => {
                write!(
                    f,
                    "{}: file system loop found: \
                     {} points back to {}",
                    real_path.display(),
                    second_path.display(),
                    first_path.display(),
                )
            }
            Error::WithPath { ref path, ref err } => {
                write!(f, "{}: {}", path.display(), err)
            }
            Error::WithLine { line, ref err } => {
                write!(f, "line {line}: {err}")
            }
            Error::Io(ref err) => err.fmt(f),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

/// Accumulates recoverable errors produced while a tree walk runs, yielding
/// a single [`Error::Partial`] once the walk has finished (if any errors
/// were collected).
#[derive(Debug, Default)]
pub struct PartialErrorBuilder(Vec<Error>);

impl PartialErrorBuilder {
    /// Create an empty accumulator.
    pub fn new() -> PartialErrorBuilder {
        PartialErrorBuilder(vec![])
    }

    /// Push an error onto the accumulator, unless it is itself an empty
    /// `Partial`.
    pub fn push(&mut self, err: Error) {
        if let Error::Partial(errs) = err {
            self.0.extend(errs);
        } else {
            self.0.push(err);
        }
    }

    /// Push an error if `result` is `Err`.
    pub fn maybe_push(&mut self, result: Result<(), Error>) {
        if let Err(err) = result {
            self.push(err);
        }
    }

    /// Returns true if no errors have been collected.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consume the accumulator, returning `Ok(())` if it is empty or
    /// `Err(Error::Partial(..))` otherwise.
    pub fn into_result(self) -> Result<(), Error> {
        if self.0.is_empty() {
            Ok(())
        } else if self.0.len() == 1 {
            Err(self.0.into_iter().next().unwrap())
        } else {
            Err(Error::Partial(self.0))
        }
    }
}
