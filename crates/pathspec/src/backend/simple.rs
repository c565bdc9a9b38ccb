/*!
The reference backend: test every active pattern's regex in turn.
*/

use std::sync::Arc;

use crate::{backend::Backend, pattern::Pattern};

/// Tests each compiled pattern's regex against the candidate path in turn
/// and resolves ties with [`crate::backend::resolve_priority`].
///
/// Patterns are stored with their original index so that `NoOp` patterns
/// (which never match) can be filtered out of the hot loop without
/// disturbing the indices reported back to callers.
#[derive(Debug)]
pub struct SimpleBackend {
    patterns: Arc<[Pattern]>,
    active: Vec<usize>,
    reversed: bool,
}

impl SimpleBackend {
    /// Build a backend that scans patterns in their original order.
    pub fn new(patterns: Arc<[Pattern]>) -> SimpleBackend {
        SimpleBackend::forward(patterns)
    }

    /// Build a backend that scans patterns in their original order,
    /// stopping only once every active pattern has been tried.
    pub fn forward(patterns: Arc<[Pattern]>) -> SimpleBackend {
        let active = active_indices(&patterns);
        SimpleBackend { patterns, active, reversed: false }
    }

    /// Build a backend that scans patterns from last to first.
    ///
    /// Once a file-priority (non-directory) hit is found while scanning in
    /// reverse, no pattern still to be visited (all of which have a lower
    /// original index) can outrank it, so the scan may stop early. This is
    /// the single-pass variant from the specification: a performance
    /// equivalence with [`SimpleBackend::forward`], not a distinct
    /// semantics.
    pub fn reversed(patterns: Arc<[Pattern]>) -> SimpleBackend {
        let active = active_indices(&patterns);
        SimpleBackend { patterns, active, reversed: true }
    }
}

fn active_indices(patterns: &[Pattern]) -> Vec<usize> {
    patterns
        .iter()
        .enumerate()
        .filter(|(_, p)| !p.include().is_noop())
        .map(|(i, _)| i)
        .collect()
}

impl Backend for SimpleBackend {
    fn match_file(&self, path: &[u8]) -> (Option<bool>, Option<usize>) {
        if !self.reversed {
            let hits = self.active.iter().filter_map(|&i| {
                self.patterns[i].test(path).map(|dir_match| (i, dir_match))
            });
            return crate::backend::resolve_priority(&self.patterns, hits);
        }

        // Reverse scan: accumulate hits but stop as soon as we've seen a
        // file-priority hit, since every remaining candidate has a smaller
        // index and therefore cannot beat it.
        let mut hits = Vec::new();
        for &i in self.active.iter().rev() {
            let Some(dir_match) = self.patterns[i].test(path) else { continue };
            hits.push((i, dir_match));
            if !dir_match {
                break;
            }
        }
        crate::backend::resolve_priority(&self.patterns, hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gitignore::{compile_line, Dialect};

    fn build(lines: &[&str]) -> Arc<[Pattern]> {
        lines
            .iter()
            .map(|l| compile_line(l, Dialect::Spec).unwrap())
            .collect::<Vec<_>>()
            .into()
    }

    #[test]
    fn forward_and_reversed_agree() {
        let patterns = build(&["*.txt", "!b.txt"]);
        let fwd = SimpleBackend::forward(patterns.clone());
        let rev = SimpleBackend::reversed(patterns);
        for path in [&b"a.txt"[..], b"b.txt", b"dir/b.txt", b"c.rs"] {
            assert_eq!(fwd.match_file(path), rev.match_file(path));
        }
    }

    #[test]
    fn directory_whitelist_reintroduces_entries() {
        let patterns = build(&["*", "!libfoo", "!libfoo/**"]);
        let b = SimpleBackend::new(patterns);
        assert_eq!(b.match_file(b"ignore.txt").0, Some(true));
        assert_eq!(b.match_file(b"libfoo/__init__.py").0, Some(false));
    }

    #[test]
    fn unmatched_path_returns_none() {
        let patterns = build(&["*.txt"]);
        let b = SimpleBackend::new(patterns);
        assert_eq!(b.match_file(b"a.rs"), (None, None));
    }
}
