/*!
Path normalization and filesystem tree traversal.

Matching always happens against `/`-separated byte strings; this module
is where a caller-supplied path (which may use the host's native
separator, or an explicit override set) gets turned into that form, and
where whole directory trees are turned into a stream of [`TreeEntry`]
values for [`crate::spec::PathSpec::match_tree_files`] and friends.
*/

use std::{
    borrow::Cow,
    fs, io,
    path::{Path, PathBuf},
};

use bstr::ByteVec;
use same_file::is_same_file;

use crate::error::Error;

/// Replace every occurrence of a recognized separator in `path`'s raw
/// bytes with `/`, without going through a lossy `str` conversion first.
///
/// This is what [`crate::spec::PathSpec`] queries actually normalize
/// against: paths are not reliably UTF-8, so matching happens on bytes the
/// same way `globset::Candidate` does, extended with the caller-supplied
/// separator override set.
pub fn normalize_path_bytes(path: &Path, extra_separators: &[char]) -> Vec<u8> {
    let raw = Vec::from_path_lossy(path).into_owned();
    if extra_separators.is_empty() && memchr::memchr(b'\\', &raw).is_none() {
        return raw;
    }
    let extra: Vec<u8> =
        extra_separators.iter().filter_map(|&c| u8::try_from(c as u32).ok()).collect();
    raw.into_iter()
        .map(|b| {
            if b != b'/' && (std::path::is_separator(b as char) || extra.contains(&b)) {
                b'/'
            } else {
                b
            }
        })
        .collect()
}

/// Replace every occurrence of a recognized separator in `path` with `/`.
///
/// The native separator is always recognized (a no-op on Unix, `\`
/// replacement on Windows). `extra_separators` lets a caller normalize
/// paths that were produced on a different platform than the one this
/// process is running on, e.g. matching Windows-style paths read from a
/// file while running on Linux.
pub fn normalize<'a>(path: &'a str, extra_separators: &[char]) -> Cow<'a, str> {
    let is_sep = |c: char| c == '/' || std::path::is_separator(c) || extra_separators.contains(&c);
    if memchr::memchr(b'\\', path.as_bytes()).is_none() && extra_separators.is_empty() {
        // Fast path: nothing in the caller's override set and no literal
        // backslash present, so the only possible separator is `/` already.
        return Cow::Borrowed(path);
    }
    if !path.chars().any(|c| is_sep(c) && c != '/') {
        return Cow::Borrowed(path);
    }
    let mut out = String::with_capacity(path.len());
    for c in path.chars() {
        if c != '/' && is_sep(c) {
            out.push('/');
        } else {
            out.push(c);
        }
    }
    Cow::Owned(out)
}

/// The kind of filesystem node a [`TreeEntry`] describes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EntryKind {
    /// A regular file.
    File,
    /// A directory.
    Dir,
    /// A symbolic link. Whether it resolves to a file or a directory is
    /// recorded separately, see [`TreeEntry::is_dir`].
    Symlink,
    /// Anything else (FIFO, socket, device, ...).
    Other,
}

/// One node produced by [`iter_tree_entries`], relative to the root that
/// was walked.
#[derive(Clone, Debug)]
pub struct TreeEntry {
    path: PathBuf,
    kind: EntryKind,
    is_dir: bool,
}

impl TreeEntry {
    /// The path of this entry, relative to the walked root, using the
    /// native path separator.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// This entry's filesystem kind.
    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    /// Whether this entry is (or, for a followed symlink, resolves to) a
    /// directory, without re-`stat`ing.
    pub fn is_dir(&self) -> bool {
        self.is_dir
    }

    /// Whether this entry is a regular file, or a symlink that resolves to
    /// one.
    pub fn is_file(&self) -> bool {
        matches!(self.kind, EntryKind::File) || (self.kind == EntryKind::Symlink && !self.is_dir)
    }
}

/// Options controlling [`iter_tree_entries`] and [`iter_tree_files`].
pub struct WalkOptions<'a> {
    follow_links: bool,
    extra_separators: &'a [char],
    on_error: Option<Box<dyn FnMut(Error) -> Result<(), Error> + 'a>>,
}

impl<'a> Default for WalkOptions<'a> {
    fn default() -> WalkOptions<'a> {
        WalkOptions { follow_links: true, extra_separators: &[], on_error: None }
    }
}

impl<'a> WalkOptions<'a> {
    /// Start from the default options: `follow_links = true`, no separator
    /// overrides, errors ignored (the walk continues past them).
    pub fn new() -> WalkOptions<'a> {
        WalkOptions::default()
    }

    /// Whether to follow symbolic links (default `true`).
    pub fn follow_links(mut self, yes: bool) -> WalkOptions<'a> {
        self.follow_links = yes;
        self
    }

    /// Additional separator characters to normalize when this walk's
    /// entries are later fed into a [`crate::spec::PathSpec`] query.
    pub fn extra_separators(mut self, seps: &'a [char]) -> WalkOptions<'a> {
        self.extra_separators = seps;
        self
    }

    /// Install a handler for recoverable I/O errors encountered during the
    /// walk (e.g. a broken symlink, or a directory that can't be read).
    ///
    /// If the handler returns `Err`, the walk aborts and that error
    /// propagates. If it returns `Ok(())`, the offending entry is skipped
    /// and the walk continues. Without a handler, errors are silently
    /// ignored.
    pub fn on_error<F>(mut self, handler: F) -> WalkOptions<'a>
    where
        F: FnMut(Error) -> Result<(), Error> + 'a,
    {
        self.on_error = Some(Box::new(handler));
        self
    }
}

/// A single ancestor directory on the current traversal path, tracked so
/// that `iter_tree_entries` can detect a symlink that points back at one
/// of its own ancestors.
struct Ancestor {
    path: PathBuf,
    relative: PathBuf,
}

/// Walk the directory tree rooted at `root`, yielding every file,
/// directory, and (per `options.follow_links`) symlink underneath it.
///
/// Entries are yielded as they're discovered; the walk itself is
/// depth-first. A [`Error::Recursion`] is returned (ending the walk) if a
/// followed symlink points back at one of its own ancestor directories.
pub fn iter_tree_entries(
    root: impl AsRef<Path>,
    mut options: WalkOptions<'_>,
) -> Result<Vec<TreeEntry>, Error> {
    let root = root.as_ref();
    let mut out = Vec::new();
    let mut ancestors = vec![Ancestor { path: root.to_path_buf(), relative: PathBuf::new() }];
    walk_dir(root, Path::new(""), &mut ancestors, &mut out, &mut options)?;
    Ok(out)
}

/// Like [`iter_tree_entries`] but omits directories, yielding only files
/// (including symlinks that resolve to files).
pub fn iter_tree_files(
    root: impl AsRef<Path>,
    options: WalkOptions<'_>,
) -> Result<Vec<TreeEntry>, Error> {
    let entries = iter_tree_entries(root, options)?;
    Ok(entries.into_iter().filter(|e| !e.is_dir()).collect())
}

fn walk_dir(
    abs_dir: &Path,
    rel_dir: &Path,
    ancestors: &mut Vec<Ancestor>,
    out: &mut Vec<TreeEntry>,
    options: &mut WalkOptions<'_>,
) -> Result<(), Error> {
    let read_dir = match fs::read_dir(abs_dir) {
        Ok(rd) => rd,
        Err(err) => return handle_io(options, err, abs_dir),
    };

    for entry in read_dir {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                handle_io(options, err, abs_dir)?;
                continue;
            }
        };
        let abs_path = entry.path();
        let rel_path = rel_dir.join(entry.file_name());

        let meta = match fs::symlink_metadata(&abs_path) {
            Ok(m) => m,
            Err(err) => {
                handle_io(options, err, &abs_path)?;
                continue;
            }
        };

        if meta.is_symlink() {
            if !options.follow_links {
                out.push(TreeEntry {
                    path: rel_path,
                    kind: EntryKind::Symlink,
                    is_dir: false,
                });
                continue;
            }
            match fs::metadata(&abs_path) {
                Ok(target_meta) if target_meta.is_dir() => {
                    out.push(TreeEntry {
                        path: rel_path.clone(),
                        kind: EntryKind::Symlink,
                        is_dir: true,
                    });
                    recurse_into(abs_path, rel_path, ancestors, out, options)?;
                }
                Ok(_) => {
                    out.push(TreeEntry {
                        path: rel_path,
                        kind: EntryKind::Symlink,
                        is_dir: false,
                    });
                }
                Err(err) => {
                    // A dangling symlink: the error handler decides
                    // whether this aborts the walk.
                    handle_io(options, err, &abs_path)?;
                }
            }
            continue;
        }

        if meta.is_dir() {
            out.push(TreeEntry {
                path: rel_path.clone(),
                kind: EntryKind::Dir,
                is_dir: true,
            });
            recurse_into(abs_path, rel_path, ancestors, out, options)?;
        } else if meta.is_file() {
            out.push(TreeEntry { path: rel_path, kind: EntryKind::File, is_dir: false });
        } else {
            out.push(TreeEntry { path: rel_path, kind: EntryKind::Other, is_dir: false });
        }
    }
    Ok(())
}

/// Push `abs_dir` onto the ancestor stack (checking for a cycle first),
/// recurse, then pop it back off on the way out so that sibling arrivals
/// at the same real directory (e.g. two symlinks pointing at one target)
/// are not mistaken for recursion.
fn recurse_into(
    abs_dir: PathBuf,
    rel_dir: PathBuf,
    ancestors: &mut Vec<Ancestor>,
    out: &mut Vec<TreeEntry>,
    options: &mut WalkOptions<'_>,
) -> Result<(), Error> {
    for ancestor in ancestors.iter() {
        let same = match is_same_file(&ancestor.path, &abs_dir) {
            Ok(same) => same,
            Err(err) => return handle_io(options, err, &abs_dir),
        };
        if same {
            let real_path = fs::canonicalize(&abs_dir).unwrap_or_else(|_| abs_dir.clone());
            let err = Error::Recursion {
                real_path,
                first_path: ancestor.relative.clone(),
                second_path: rel_dir,
            };
            log::warn!("{err}");
            return Err(err);
        }
    }

    ancestors.push(Ancestor { path: abs_dir.clone(), relative: rel_dir.clone() });
    let result = walk_dir(&abs_dir, &rel_dir, ancestors, out, options);
    ancestors.pop();
    result
}

fn handle_io(options: &mut WalkOptions<'_>, err: io::Error, path: &Path) -> Result<(), Error> {
    let err = Error::Io(err).with_path(path);
    match options.on_error.as_mut() {
        Some(handler) => handler(err),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_is_noop_on_forward_slash_paths() {
        assert_eq!(normalize("a/b/c", &[]), "a/b/c");
    }

    #[test]
    fn normalize_replaces_extra_separators() {
        assert_eq!(normalize("a\\b\\c", &['\\']), "a/b/c");
    }

    #[test]
    fn normalize_is_idempotent() {
        let once = normalize("a\\b", &['\\']);
        let twice = normalize(&once, &['\\']);
        assert_eq!(once, twice);
    }

    #[test]
    fn walks_files_and_directories() {
        let dir = tempfile_dir();
        fs::write(dir.join("a"), b"").unwrap();
        fs::write(dir.join("b"), b"").unwrap();
        fs::create_dir(dir.join("Dir")).unwrap();
        fs::write(dir.join("Dir").join("c"), b"").unwrap();
        fs::write(dir.join("Dir").join("d"), b"").unwrap();
        fs::create_dir(dir.join("Dir").join("Inner")).unwrap();
        fs::write(dir.join("Dir").join("Inner").join("e"), b"").unwrap();

        let entries = iter_tree_entries(&dir, WalkOptions::new()).unwrap();
        let mut files: Vec<_> =
            entries.iter().filter(|e| !e.is_dir()).map(|e| e.path().to_path_buf()).collect();
        files.sort();
        let mut expected = vec![
            PathBuf::from("a"),
            PathBuf::from("b"),
            Path::new("Dir").join("c"),
            Path::new("Dir").join("d"),
            Path::new("Dir").join("Inner").join("e"),
        ];
        expected.sort();
        assert_eq!(files, expected);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn detects_symlink_cycle() {
        let dir = tempfile_dir();
        fs::create_dir(dir.join("loop")).unwrap();
        std::os::unix::fs::symlink(&dir, dir.join("loop").join("back")).unwrap();

        let err = iter_tree_entries(&dir, WalkOptions::new()).unwrap_err();
        assert!(matches!(err, Error::Recursion { .. }));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn sibling_symlinks_are_not_a_cycle() {
        let dir = tempfile_dir();
        fs::create_dir(dir.join("target")).unwrap();
        fs::write(dir.join("target").join("f"), b"").unwrap();
        std::os::unix::fs::symlink(dir.join("target"), dir.join("link1")).unwrap();
        std::os::unix::fs::symlink(dir.join("target"), dir.join("link2")).unwrap();

        let entries = iter_tree_entries(&dir, WalkOptions::new()).unwrap();
        let hits = entries
            .iter()
            .filter(|e| e.path().ends_with("f"))
            .count();
        assert_eq!(hits, 3); // target/f, link1/f, link2/f

        fs::remove_dir_all(&dir).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn broken_symlink_is_skipped_and_reported_via_on_error() {
        use std::{cell::RefCell, rc::Rc};

        let dir = tempfile_dir();
        std::os::unix::fs::symlink(dir.join("nonexistent"), dir.join("dangling")).unwrap();
        fs::write(dir.join("present"), b"").unwrap();

        let errors = Rc::new(RefCell::new(crate::error::PartialErrorBuilder::new()));
        let errors_clone = errors.clone();
        let options = WalkOptions::new().on_error(move |err| {
            errors_clone.borrow_mut().push(err);
            Ok(())
        });
        let entries = iter_tree_entries(&dir, options).unwrap();

        assert!(!errors.borrow().is_empty());
        let names: Vec<_> = entries.iter().map(|e| e.path().to_path_buf()).collect();
        assert!(names.contains(&PathBuf::from("present")));
        assert!(!names.contains(&PathBuf::from("dangling")));

        fs::remove_dir_all(&dir).unwrap();
    }

    fn tempfile_dir() -> PathBuf {
        let mut dir = std::env::temp_dir();
        dir.push(format!("pathspec-test-{}-{}", std::process::id(), unique_suffix()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn unique_suffix() -> u64 {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        COUNTER.fetch_add(1, Ordering::Relaxed) as u64
    }
}
