/*!
Multi-pattern regular expression matching on top of `regex-automata`.

This crate compiles a set of already-anchored regex sources (produced
elsewhere, typically by a gitignore-style pattern translator) into one
automaton and reports, for a single candidate byte string, the full set of
patterns that matched. It does not parse glob syntax itself; that's the
caller's job. What it provides is the multi-pattern *acceleration* layer:
build the automaton once, then query it many times without re-running each
pattern's regex independently.
*/

#![deny(missing_docs)]

use std::{
    panic::{RefUnwindSafe, UnwindSafe},
    sync::Arc,
};

use regex_automata::{
    meta::Regex,
    util::pool::{Pool, PoolGuard},
    PatternSet,
};

mod candidate;

pub use crate::candidate::Candidate;

/// An error that occurred while compiling a set of patterns.
#[derive(Clone, Debug)]
pub struct Error {
    msg: String,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.msg)
    }
}

impl std::error::Error for Error {}

type PatternSetPoolFn =
    Box<dyn Fn() -> PatternSet + Send + Sync + UnwindSafe + RefUnwindSafe>;

/// A compiled set of regex patterns that can be queried together.
///
/// `MultiRegex` is built once from a list of regex source strings (in the
/// order the caller wants pattern indices to refer to) and is then cheap to
/// query repeatedly. Internally it pools the `PatternSet` scratch space used
/// by each query so that matching many candidates in sequence doesn't
/// allocate on every call.
#[derive(Clone)]
pub struct MultiRegex {
    matcher: Regex,
    patset: Arc<Pool<PatternSet, PatternSetPoolFn>>,
}

impl std::fmt::Debug for MultiRegex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiRegex")
            .field("pattern_len", &self.matcher.pattern_len())
            .finish()
    }
}

impl MultiRegex {
    /// Compile a `MultiRegex` from a list of regex source strings.
    ///
    /// Each pattern is expected to already be anchored by the caller (e.g.
    /// with a leading `^`) if whole-path matching is desired; this crate
    /// does not add anchors of its own.
    pub fn new<I, S>(patterns: I) -> Result<MultiRegex, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let pats: Vec<String> =
            patterns.into_iter().map(|s| s.as_ref().to_string()).collect();
        let syntax = regex_automata::util::syntax::Config::new()
            .utf8(false)
            .dot_matches_new_line(true);
        let config = Regex::config()
            .match_kind(regex_automata::MatchKind::All)
            .utf8_empty(false)
            .nfa_size_limit(Some(10 * (1 << 20)))
            .hybrid_cache_capacity(10 * (1 << 20));
        let matcher = Regex::builder()
            .syntax(syntax)
            .configure(config)
            .build_many(&pats)
            .map_err(|err| Error { msg: err.to_string() })?;
        let pattern_len = matcher.pattern_len();
        #[cfg(feature = "log")]
        log::debug!("built MultiRegex with {pattern_len} patterns");
        let create: PatternSetPoolFn =
            Box::new(move || PatternSet::new(pattern_len));
        Ok(MultiRegex { matcher, patset: Arc::new(Pool::new(create)) })
    }

    /// The number of patterns in this set.
    pub fn len(&self) -> usize {
        self.matcher.pattern_len()
    }

    /// Returns true if this set contains no patterns.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Find every pattern index that matches `haystack`, appending them (in
    /// ascending index order) to `matches`. `matches` is not cleared first.
    pub fn which_matches_into(&self, haystack: &[u8], matches: &mut Vec<usize>) {
        let input = regex_automata::Input::new(haystack);
        let mut patset = self.patset.get();
        patset.clear();
        self.matcher.which_overlapping_matches(&input, &mut patset);
        matches.extend(patset.iter());
        PoolGuard::put(patset);
    }

    /// Find every pattern index that matches `haystack`.
    pub fn which_matches(&self, haystack: &[u8]) -> Vec<usize> {
        let mut matches = vec![];
        self.which_matches_into(haystack, &mut matches);
        matches
    }
}

#[cfg(test)]
mod tests {
    use super::MultiRegex;

    #[test]
    fn reports_all_overlapping_hits() {
        let set = MultiRegex::new(["^a", "^ab", "^b"]).unwrap();
        assert_eq!(set.which_matches(b"abc"), vec![0, 1]);
        assert_eq!(set.which_matches(b"bc"), vec![2]);
        assert_eq!(set.which_matches(b"zz"), Vec::<usize>::new());
    }

    #[test]
    fn empty_set_matches_nothing() {
        let set = MultiRegex::new(Vec::<String>::new()).unwrap();
        assert!(set.is_empty());
        assert!(set.which_matches(b"anything").is_empty());
    }
}
