/*!
The spec aggregate: an ordered pattern list plus a compiled backend,
and the query surface built on top of it.
*/

use std::{ops::Add, path::Path, sync::Arc};

use crate::{
    backend::{self, Backend, BackendName},
    error::Error,
    path::{self, TreeEntry, WalkOptions},
    pattern::Pattern,
    registry::{self, PatternFactory},
};

/// The tri-state answer to a single-path query.
///
/// `include` is `None` when no pattern in the spec matched the path at
/// all, distinguishing "nothing said anything about this path" from
/// "explicitly excluded" (`Some(false)`) or "explicitly included"
/// (`Some(true)`).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CheckResult {
    file: std::path::PathBuf,
    include: Option<bool>,
    index: Option<usize>,
}

impl CheckResult {
    /// The path this result was computed for.
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Whether the path is included, excluded, or unmatched.
    pub fn include(&self) -> Option<bool> {
        self.include
    }

    /// The index, into the spec's compiled pattern list, of the pattern
    /// that decided this verdict. `None` iff `include()` is `None`.
    pub fn index(&self) -> Option<usize> {
        self.index
    }
}

/// Builds a [`PathSpec`] or [`GitIgnoreSpec`] from a sequence of source
/// lines, following the `GitignoreBuilder`/`WalkBuilder` idiom: accumulate
/// state, then call a final method that does the (possibly fallible)
/// compilation step.
pub struct PathSpecBuilder {
    factory: PatternFactory,
    backend_name: BackendName,
    lines: Vec<String>,
}

impl PathSpecBuilder {
    /// Start a builder using the named pattern factory (e.g.
    /// `"gitignore"`, `"gitignore-spec"`, `"gitwildmatch"`, or a name
    /// registered via [`crate::register_pattern`]).
    pub fn new(factory_name: &str) -> Result<PathSpecBuilder, Error> {
        Ok(PathSpecBuilder {
            factory: registry::lookup_pattern(factory_name)?,
            backend_name: BackendName::Best,
            lines: Vec::new(),
        })
    }

    /// Start a builder using an already-resolved pattern factory.
    pub fn with_factory(factory: PatternFactory) -> PathSpecBuilder {
        PathSpecBuilder { factory, backend_name: BackendName::Best, lines: Vec::new() }
    }

    /// Select which backend the built spec uses. Defaults to `"best"`.
    pub fn backend(mut self, name: &str) -> Result<PathSpecBuilder, Error> {
        self.backend_name = name.parse()?;
        Ok(self)
    }

    /// Append one source line. A line that is empty (after being converted
    /// to a `String`) is accumulated along with the rest, but [`build`] skips
    /// it rather than compiling it into a pattern: an empty line never
    /// occupies a slot in the resulting [`PathSpec`]'s pattern list.
    ///
    /// [`build`]: PathSpecBuilder::build
    pub fn add_line(mut self, line: impl Into<String>) -> PathSpecBuilder {
        self.lines.push(line.into());
        self
    }

    /// Append every line from an iterable.
    pub fn add_lines<I, S>(mut self, lines: I) -> PathSpecBuilder
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lines.extend(lines.into_iter().map(Into::into));
        self
    }

    /// Compile the accumulated lines into a [`PathSpec`]. Empty lines are
    /// skipped; they never produce a pattern.
    pub fn build(self) -> Result<PathSpec, Error> {
        let non_empty: Vec<&String> = self.lines.iter().filter(|l| !l.is_empty()).collect();
        let mut patterns = Vec::with_capacity(non_empty.len());
        for (i, line) in non_empty.into_iter().enumerate() {
            let pattern = (self.factory)(line).map_err(|err| err.with_line(i as u64 + 1))?;
            log::debug!(
                "compiled pattern line {i}: include={:?} dir_only={}",
                pattern.include(),
                pattern.dir_only()
            );
            patterns.push(pattern);
        }
        PathSpec::from_patterns(patterns, self.backend_name)
    }
}

/// An ordered collection of compiled patterns with an associated matching
/// backend.
///
/// A `PathSpec` is immutable once built: pattern order is stable and
/// defines precedence (later patterns may override earlier ones), and the
/// backend is derived once, at construction, from the final pattern list.
/// `spec + other` (or `spec += other`) produces a new spec with the
/// backend rebuilt over the concatenated pattern list; there is no way to
/// mutate an existing spec's patterns in place.
#[derive(Clone)]
pub struct PathSpec {
    patterns: Arc<[Pattern]>,
    backend: Arc<dyn Backend>,
}

impl std::fmt::Debug for PathSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathSpec").field("patterns", &self.patterns.len()).finish()
    }
}

impl PartialEq for PathSpec {
    fn eq(&self, other: &PathSpec) -> bool {
        self.patterns == other.patterns
    }
}

impl Eq for PathSpec {}

impl PathSpec {
    /// Compile `lines` using the pattern factory registered under
    /// `factory_name`, selecting the backend named `backend_name` (or
    /// `"best"` if `None`).
    pub fn from_lines<I, S>(
        factory_name: &str,
        lines: I,
        backend_name: Option<&str>,
    ) -> Result<PathSpec, Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut builder = PathSpecBuilder::new(factory_name)?.add_lines(lines);
        if let Some(name) = backend_name {
            builder = builder.backend(name)?;
        }
        builder.build()
    }

    pub(crate) fn from_patterns(
        patterns: Vec<Pattern>,
        backend_name: BackendName,
    ) -> Result<PathSpec, Error> {
        let patterns: Arc<[Pattern]> = patterns.into();
        let backend: Arc<dyn Backend> =
            Arc::from(backend::build(backend_name, patterns.clone())?);
        Ok(PathSpec { patterns, backend })
    }

    /// The number of compiled patterns, including `NoOp` patterns.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Whether this spec has no patterns at all.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// The compiled pattern list, in source order.
    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    /// Test a single path, preserving the distinction between "explicitly
    /// excluded" and "no pattern matched".
    pub fn check_file(&self, file: impl AsRef<Path>) -> CheckResult {
        self.check_file_sep(file, &[])
    }

    /// Like [`PathSpec::check_file`], normalizing any of `extra_separators`
    /// in addition to the native separator.
    pub fn check_file_sep(
        &self,
        file: impl AsRef<Path>,
        extra_separators: &[char],
    ) -> CheckResult {
        let file = file.as_ref();
        let candidate = normalized_bytes(file, extra_separators);
        let (include, index) = self.backend.match_file(&candidate);
        CheckResult { file: file.to_path_buf(), include, index }
    }

    /// Test each path in `files`, in order, preserving length and order.
    pub fn check_files<'s, I, P>(
        &'s self,
        files: I,
    ) -> impl Iterator<Item = CheckResult> + 's
    where
        I: IntoIterator<Item = P> + 's,
        P: AsRef<Path>,
    {
        files.into_iter().map(move |f| self.check_file(f))
    }

    /// Whether `file` is included: `true` iff `check_file(file).include()
    /// == Some(true)`. Unmatched paths are treated as excluded.
    pub fn match_file(&self, file: impl AsRef<Path>) -> bool {
        self.check_file(file).include == Some(true)
    }

    /// Filter `files` down to those that are included (or, if `negate` is
    /// true, those that are not).
    pub fn match_files<'s, I, P>(
        &'s self,
        files: I,
        negate: bool,
    ) -> impl Iterator<Item = P> + 's
    where
        I: IntoIterator<Item = P> + 's,
        P: AsRef<Path> + 's,
    {
        files.into_iter().filter(move |f| self.match_file(f) != negate)
    }

    /// Filter a sequence of [`TreeEntry`] values down to those whose path
    /// is included (or, if `negate` is true, those that are not).
    pub fn match_entries<'s, I>(
        &'s self,
        entries: I,
        negate: bool,
    ) -> impl Iterator<Item = TreeEntry> + 's
    where
        I: IntoIterator<Item = TreeEntry> + 's,
    {
        entries.into_iter().filter(move |e| self.match_file(e.path()) != negate)
    }

    /// Walk `root`, yielding every [`TreeEntry`] whose relative path is
    /// included by this spec.
    pub fn match_tree_entries(
        &self,
        root: impl AsRef<Path>,
        options: WalkOptions<'_>,
    ) -> Result<Vec<TreeEntry>, Error> {
        let entries = path::iter_tree_entries(root, options)?;
        Ok(self.match_entries(entries, false).collect())
    }

    /// Walk `root`, yielding the relative path of every file (including
    /// file-kind symlinks) included by this spec.
    pub fn match_tree_files(
        &self,
        root: impl AsRef<Path>,
        options: WalkOptions<'_>,
    ) -> Result<Vec<std::path::PathBuf>, Error> {
        let entries = path::iter_tree_files(root, options)?;
        Ok(self
            .match_entries(entries, false)
            .map(|e| e.path().to_path_buf())
            .collect())
    }

    /// Walk `root`, yielding a [`CheckResult`] for every file (including
    /// file-kind symlinks) underneath it.
    pub fn check_tree_files(
        &self,
        root: impl AsRef<Path>,
        options: WalkOptions<'_>,
    ) -> Result<Vec<CheckResult>, Error> {
        let entries = path::iter_tree_files(root, options)?;
        Ok(entries.iter().map(|e| self.check_file(e.path())).collect())
    }
}

impl Add for PathSpec {
    type Output = PathSpec;

    fn add(self, other: PathSpec) -> PathSpec {
        let mut patterns: Vec<Pattern> = self.patterns.iter().cloned().collect();
        patterns.extend(other.patterns.iter().cloned());
        // `Simple` never fails to build, unlike `Best`, which can select
        // `AcceleratedBackend` and hit `regex-automata`'s size limits once
        // the concatenated pattern count crosses the acceleration threshold.
        PathSpec::from_patterns(patterns, BackendName::Simple)
            .expect("SimpleBackend construction cannot fail")
    }
}

impl std::ops::AddAssign for PathSpec {
    fn add_assign(&mut self, other: PathSpec) {
        let mut patterns: Vec<Pattern> = self.patterns.iter().cloned().collect();
        patterns.extend(other.patterns.iter().cloned());
        *self = PathSpec::from_patterns(patterns, BackendName::Simple)
            .expect("SimpleBackend construction cannot fail");
    }
}

/// A [`PathSpec`] pre-configured with gitignore's spec-dialect pattern
/// factory ([`crate::gitignore::Dialect::Spec`]), which is the dialect that
/// actually matches Git's behavior (including the directory re-inclusion
/// edge case).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GitIgnoreSpec(PathSpec);

impl GitIgnoreSpec {
    /// Compile `lines` (in order) into a `GitIgnoreSpec`, selecting the
    /// backend named `backend_name` (or `"best"` if `None`).
    pub fn from_lines<I, S>(
        lines: I,
        backend_name: Option<&str>,
    ) -> Result<GitIgnoreSpec, Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut builder =
            PathSpecBuilder::with_factory(registry::gitignore_spec).add_lines(lines);
        if let Some(name) = backend_name {
            builder = builder.backend(name)?;
        }
        Ok(GitIgnoreSpec(builder.build()?))
    }

    /// Equivalent to [`GitIgnoreSpec::from_lines`] with the arguments in
    /// the historical `(lines, factory)` order the Python library accepted
    /// for backward compatibility. Since Rust's type system doesn't need
    /// runtime argument-order sniffing, this is just a differently-named
    /// constructor rather than the original's positional-argument swap;
    /// both end up calling the same builder.
    pub fn from_lines_rev<I, S>(
        lines: I,
        backend_name: Option<&str>,
    ) -> Result<GitIgnoreSpec, Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        GitIgnoreSpec::from_lines(lines, backend_name)
    }

    /// Borrow the underlying [`PathSpec`] to use its full query surface.
    pub fn as_path_spec(&self) -> &PathSpec {
        &self.0
    }
}

impl std::ops::Deref for GitIgnoreSpec {
    type Target = PathSpec;

    fn deref(&self) -> &PathSpec {
        &self.0
    }
}

impl Add for GitIgnoreSpec {
    type Output = GitIgnoreSpec;

    fn add(self, other: GitIgnoreSpec) -> GitIgnoreSpec {
        GitIgnoreSpec(self.0 + other.0)
    }
}

impl std::ops::AddAssign for GitIgnoreSpec {
    fn add_assign(&mut self, other: GitIgnoreSpec) {
        self.0 += other.0;
    }
}

fn normalized_bytes(path: &Path, extra_separators: &[char]) -> Vec<u8> {
    path::normalize_path_bytes(path, extra_separators)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_txt_negate_b() {
        let spec = PathSpec::from_lines("gitignore-spec", ["*.txt", "!b.txt"], None).unwrap();
        let included: Vec<&str> = [
            "X/a.txt", "X/b.txt", "X/Z/c.txt", "Y/a.txt", "Y/b.txt", "Y/Z/c.txt",
        ]
        .into_iter()
        .filter(|p| spec.match_file(p))
        .collect();
        assert_eq!(included, vec!["X/a.txt", "X/Z/c.txt", "Y/a.txt", "Y/Z/c.txt"]);
    }

    #[test]
    fn scenario_dir_reinclude_does_not_protect_contents() {
        let spec =
            GitIgnoreSpec::from_lines(["*.txt", "!test1/"], None).unwrap();
        let included: Vec<&str> = [
            "test1/a.txt",
            "test1/b.bin",
            "test1/c/c.txt",
            "test2/a.txt",
            "test2/b.bin",
            "test2/c/c.txt",
        ]
        .into_iter()
        .filter(|p| spec.match_file(p))
        .collect();
        assert_eq!(
            included,
            vec!["test1/a.txt", "test1/c/c.txt", "test2/a.txt", "test2/c/c.txt"]
        );
    }

    #[test]
    fn scenario_yaml_dir_negate() {
        let spec = GitIgnoreSpec::from_lines(["*.yaml", "!*.yaml/"], None).unwrap();
        let included: Vec<&str> = [
            "dir.yaml/file.sql",
            "dir.yaml/file.yaml",
            "dir.yaml/index.txt",
            "dir/file.sql",
            "dir/file.yaml",
            "dir/index.txt",
            "file.yaml",
        ]
        .into_iter()
        .filter(|p| spec.match_file(p))
        .collect();
        assert_eq!(
            included,
            vec!["dir.yaml/file.yaml", "dir/file.yaml", "file.yaml"]
        );
    }

    #[test]
    fn scenario_trailing_slash_dir_only() {
        let spec = GitIgnoreSpec::from_lines(["dirG/"], None).unwrap();
        let included: Vec<&str> = ["fileA", "dirD/fileE", "dirG/dirH/fileI", "dirG/fileO"]
            .into_iter()
            .filter(|p| spec.match_file(p))
            .collect();
        assert_eq!(included, vec!["dirG/dirH/fileI", "dirG/fileO"]);
    }

    #[test]
    fn scenario_whitelist_reintroduces_directory_contents() {
        let spec = GitIgnoreSpec::from_lines(["*", "!libfoo", "!libfoo/**"], None).unwrap();
        assert!(spec.match_file("ignore.txt"));
        assert!(!spec.match_file("libfoo/__init__.py"));
    }

    #[test]
    fn scenario_double_star_matches_everything() {
        let spec = GitIgnoreSpec::from_lines(["**"], None).unwrap();
        for p in ["a", "b/c", "d/e/f"] {
            assert!(spec.match_file(p));
        }
    }

    #[test]
    fn scenario_root_anchor() {
        let spec = GitIgnoreSpec::from_lines(["/foo"], None).unwrap();
        assert!(spec.match_file("foo/a.py"));
        assert!(!spec.match_file("x/foo/a.py"));
    }

    #[test]
    fn scenario_windows_separators() {
        let spec = GitIgnoreSpec::from_lines(["*.txt", "!test1/"], None).unwrap();
        let r = spec.check_file_sep("test1\\a.txt", &['\\']);
        assert_eq!(r.include(), Some(true));
        let r = spec.check_file_sep("test1\\c\\c.txt", &['\\']);
        assert_eq!(r.include(), Some(true));
    }

    #[test]
    fn check_file_distinguishes_unmatched_from_excluded() {
        let spec = GitIgnoreSpec::from_lines(["*.txt", "!keep.txt"], None).unwrap();
        assert_eq!(spec.check_file("a.rs").include(), None);
        assert_eq!(spec.check_file("a.txt").include(), Some(true));
        assert_eq!(spec.check_file("keep.txt").include(), Some(false));
    }

    #[test]
    fn check_files_preserves_length_and_order() {
        let spec = GitIgnoreSpec::from_lines(["*.txt"], None).unwrap();
        let input = vec!["a.txt", "b.rs", "c.txt"];
        let results: Vec<_> = spec.check_files(input.iter()).collect();
        assert_eq!(results.len(), input.len());
        assert_eq!(results[0].file(), Path::new("a.txt"));
        assert_eq!(results[2].file(), Path::new("c.txt"));
    }

    #[test]
    fn concatenation_rebuilds_backend_and_extends_patterns() {
        let a = PathSpec::from_lines("gitignore-spec", ["*.txt"], None).unwrap();
        let b = PathSpec::from_lines("gitignore-spec", ["!keep.txt"], None).unwrap();
        let combined = a + b;
        assert_eq!(combined.len(), 2);
        assert!(!combined.match_file("keep.txt"));
        assert!(combined.match_file("other.txt"));
    }

    #[test]
    fn equality_is_structural_and_rebuild_invariant() {
        let lines = ["*.txt", "!keep.txt"];
        let a = GitIgnoreSpec::from_lines(lines, None).unwrap();
        let b = GitIgnoreSpec::from_lines(lines, None).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn match_files_and_negate() {
        let spec = GitIgnoreSpec::from_lines(["*.txt"], None).unwrap();
        let files = vec!["a.txt", "b.rs"];
        let matched: Vec<_> = spec.match_files(files.clone(), false).collect();
        assert_eq!(matched, vec!["a.txt"]);
        let unmatched: Vec<_> = spec.match_files(files, true).collect();
        assert_eq!(unmatched, vec!["b.rs"]);
    }
}
