/*!
A library for compiling gitignore-style pattern lists into a fast path
matcher.

Patterns are translated from `.gitignore`-dialect lines into compiled
regexes (see the [`gitignore`] module), aggregated into a [`PathSpec`] or
[`GitIgnoreSpec`] (see the [`spec`] module), and matched against single
paths, path iterables, or whole filesystem trees through one of two
interchangeable [`backend`]s. [`path`] provides separator normalization
and the tree-walking iterator those spec methods build on.

```
use pathspec::GitIgnoreSpec;

let spec = GitIgnoreSpec::from_lines(["*.txt", "!keep.txt"], None).unwrap();
assert!(spec.match_file("notes.txt"));
assert!(!spec.match_file("keep.txt"));
assert!(!spec.match_file("src/main.rs"));
```
*/

#![deny(missing_docs)]

pub mod backend;
mod error;
pub mod gitignore;
pub mod path;
pub mod pattern;
mod registry;
pub mod spec;

pub use crate::{
    error::{Error, PartialErrorBuilder},
    path::{normalize, normalize_path_bytes, iter_tree_entries, iter_tree_files, EntryKind, TreeEntry, WalkOptions},
    pattern::{Include, Pattern, DIR_MARK},
    registry::{lookup_pattern, register_pattern, PatternFactory},
    spec::{CheckResult, GitIgnoreSpec, PathSpec, PathSpecBuilder},
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readme_example_compiles_and_matches() {
        let spec = GitIgnoreSpec::from_lines(["*.txt", "!keep.txt"], None).unwrap();
        assert!(spec.match_file("notes.txt"));
        assert!(!spec.match_file("keep.txt"));
        assert!(!spec.match_file("src/main.rs"));
    }

    #[test]
    fn unknown_backend_name_errors() {
        let err = PathSpec::from_lines("gitignore-spec", ["*.txt"], Some("turbo")).unwrap_err();
        assert!(matches!(err, Error::Unknown { .. }));
    }

    #[test]
    fn simple_and_accelerated_backends_agree_end_to_end() {
        let lines: Vec<String> = (0..40).map(|i| format!("dir{i}/*.log")).collect();
        let simple =
            PathSpec::from_lines("gitignore-spec", lines.clone(), Some("simple")).unwrap();
        let accelerated =
            PathSpec::from_lines("gitignore-spec", lines, Some("accelerated")).unwrap();
        for i in 0..40 {
            let path = format!("dir{i}/app.log");
            assert_eq!(simple.match_file(&path), accelerated.match_file(&path));
        }
        assert_eq!(simple.match_file("dir0/app.rs"), accelerated.match_file("dir0/app.rs"));
    }

    #[test]
    fn unknown_pattern_factory_errors() {
        let err = PathSpec::from_lines("does-not-exist", ["*.txt"], None).unwrap_err();
        assert!(matches!(err, Error::Unknown { .. }));
    }
}
