/*!
A backend built on `globset`'s [`MultiRegex`](globset::MultiRegex): one
combined automaton over every active pattern's regex source, instead of
testing each pattern's own compiled regex in a loop.
*/

use std::sync::Arc;

use globset::MultiRegex;

use crate::{backend::Backend, error::Error, pattern::Pattern};

/// Combines a [`MultiRegex`] over every active pattern with the original
/// patterns (retained so that winning hits can be rematched to recover
/// [`crate::pattern::DIR_MARK`] participation, since `regex-automata`'s
/// `PatternSet` reports only which patterns matched, not which of their
/// capture groups did).
#[derive(Debug)]
pub struct AcceleratedBackend {
    patterns: Arc<[Pattern]>,
    // Index `k` here is the compiled automaton's pattern index; the value
    // is the matching index into `patterns`.
    active: Vec<usize>,
    multi: MultiRegex,
}

impl AcceleratedBackend {
    /// Build a backend from the given pattern list.
    ///
    /// Fails if the underlying automaton cannot be built (e.g. the
    /// combined pattern set exceeds `regex-automata`'s size limits).
    pub fn new(patterns: Arc<[Pattern]>) -> Result<AcceleratedBackend, Error> {
        let active: Vec<usize> = patterns
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.include().is_noop())
            .map(|(i, _)| i)
            .collect();
        let sources: Vec<&str> =
            active.iter().map(|&i| patterns[i].regex_source().unwrap()).collect();
        let multi = MultiRegex::new(sources).map_err(|err| Error::Pattern {
            line: "<accelerated backend build>".to_string(),
            reason: err.to_string(),
        })?;
        Ok(AcceleratedBackend { patterns, active, multi })
    }
}

impl Backend for AcceleratedBackend {
    fn match_file(&self, path: &[u8]) -> (Option<bool>, Option<usize>) {
        let which = self.multi.which_matches(path);
        let hits = which.into_iter().map(|automaton_idx| {
            let pattern_idx = self.active[automaton_idx];
            // Rematch against the pattern's own single regex to recover
            // whether this hit participated as a directory match.
            let dir_match =
                self.patterns[pattern_idx].test(path).unwrap_or(false);
            (pattern_idx, dir_match)
        });
        crate::backend::resolve_priority(&self.patterns, hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        backend::{simple::SimpleBackend, Backend},
        gitignore::{compile_line, Dialect},
    };

    fn build(lines: &[&str]) -> Arc<[Pattern]> {
        lines
            .iter()
            .map(|l| compile_line(l, Dialect::Spec).unwrap())
            .collect::<Vec<_>>()
            .into()
    }

    #[test]
    fn agrees_with_simple_backend() {
        let paths: [&[u8]; 6] = [
            b"X/a.txt",
            b"X/b.txt",
            b"X/Z/c.txt",
            b"test1/c/c.txt",
            b"dirG/dirH/fileI",
            b"libfoo/__init__.py",
        ];
        for lines in [
            &["*.txt", "!b.txt"][..],
            &["*.txt", "!test1/"][..],
            &["*", "!libfoo", "!libfoo/**"][..],
            &["dirG/"][..],
        ] {
            let patterns = build(lines);
            let simple = SimpleBackend::new(patterns.clone());
            let accel = AcceleratedBackend::new(patterns).unwrap();
            for path in paths {
                assert_eq!(
                    simple.match_file(path),
                    accel.match_file(path),
                    "lines={lines:?} path={path:?}"
                );
            }
        }
    }

    #[test]
    fn empty_pattern_list_matches_nothing() {
        let accel = AcceleratedBackend::new(Arc::from(Vec::new())).unwrap();
        assert_eq!(accel.match_file(b"anything"), (None, None));
    }
}
