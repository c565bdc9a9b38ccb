use regex_automata::meta::Regex;

use crate::error::Error;

/// The inclusion polarity of a compiled pattern.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Include {
    /// The pattern, if matched, includes (whitelists) the path.
    Include,
    /// The pattern, if matched, excludes (ignores) the path.
    Exclude,
    /// The pattern never participates in matching; it exists only to keep
    /// pattern indices stable (a blank line or a comment).
    NoOp,
}

impl Include {
    /// Whether this polarity participates in matching at all.
    pub fn is_noop(self) -> bool {
        matches!(self, Include::NoOp)
    }
}

/// The name of the capture group that marks a directory-style match.
///
/// When this group participates in a match, the matched path was matched as
/// a directory (or a descendant of one), as opposed to matching purely as a
/// literal file path. See the `gitignore` module for where this is emitted.
pub const DIR_MARK: &str = "ps_d";

/// One compiled line of gitignore-dialect pattern syntax.
///
/// A `Pattern` is immutable once built. Two patterns are equal iff their
/// inclusion polarity and source regex text are equal.
#[derive(Clone, Debug)]
pub struct Pattern {
    include: Include,
    dir_only: bool,
    source: String,
    regex_text: Option<String>,
    regex: Option<Regex>,
    has_dir_mark: bool,
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Pattern) -> bool {
        self.include == other.include && self.regex_text == other.regex_text
    }
}

impl Eq for Pattern {}

impl Pattern {
    /// Build a `NoOp` pattern (a blank line or a comment).
    pub fn noop(source: impl Into<String>) -> Pattern {
        Pattern {
            include: Include::NoOp,
            dir_only: false,
            source: source.into(),
            regex_text: None,
            regex: None,
            has_dir_mark: false,
        }
    }

    /// Build a matching pattern from an already-translated regex source.
    ///
    /// `regex_source` must be a valid `regex-automata` pattern over bytes.
    /// `has_dir_mark` must reflect whether `regex_source` contains a
    /// capture group named [`DIR_MARK`].
    pub fn compiled(
        source: impl Into<String>,
        include: Include,
        dir_only: bool,
        regex_source: &str,
        has_dir_mark: bool,
    ) -> Result<Pattern, Error> {
        let source = source.into();
        let regex = new_regex(regex_source).map_err(|err| Error::Pattern {
            line: source.clone(),
            reason: err,
        })?;
        Ok(Pattern {
            include,
            dir_only,
            source,
            regex_text: Some(regex_source.to_string()),
            regex: Some(regex),
            has_dir_mark,
        })
    }

    /// This pattern's inclusion polarity.
    pub fn include(&self) -> Include {
        self.include
    }

    /// Whether this pattern only matches directories (and their
    /// descendants), i.e. it was written with a trailing `/`.
    pub fn dir_only(&self) -> bool {
        self.dir_only
    }

    /// The original line this pattern was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The compiled regex, if this isn't a `NoOp` pattern.
    pub fn regex(&self) -> Option<&Regex> {
        self.regex.as_ref()
    }

    /// The translated regex source text, used to build the accelerated
    /// backend's combined automaton.
    pub fn regex_source(&self) -> Option<&str> {
        self.regex_text.as_deref()
    }

    /// Test this pattern against `path`, returning `Some(is_dir_match)` if
    /// it matched or `None` if it didn't.
    ///
    /// `is_dir_match` is true when the [`DIR_MARK`] capture group
    /// participated in the match.
    pub fn test(&self, path: &[u8]) -> Option<bool> {
        let regex = self.regex.as_ref()?;
        if !self.has_dir_mark {
            return regex.is_match(path).then_some(false);
        }
        let mut caps = regex.create_captures();
        regex.captures(path, &mut caps);
        if !caps.is_match() {
            return None;
        }
        Some(caps.get_group_by_name(DIR_MARK).is_some())
    }
}

pub(crate) fn new_regex(pattern: &str) -> Result<Regex, String> {
    let syntax = regex_automata::util::syntax::Config::new()
        .utf8(false)
        .dot_matches_new_line(true);
    let config = Regex::config().utf8_empty(false);
    Regex::builder()
        .syntax(syntax)
        .configure(config)
        .build(pattern)
        .map_err(|err| err.to_string())
}
