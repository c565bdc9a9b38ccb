use std::{borrow::Cow, path::Path};

use bstr::{ByteSlice, ByteVec};

/// A pre-processed path, ready to be matched against a [`MultiRegex`].
///
/// [`MultiRegex`]: crate::MultiRegex
///
/// Building a `Candidate` once and reusing it amortizes the cost of
/// normalizing path separators across repeated queries against the same
/// path, the same way `globset::Candidate` avoids re-normalizing on every
/// single-pattern test.
#[derive(Clone, Debug)]
pub struct Candidate<'a> {
    path: Cow<'a, [u8]>,
}

impl<'a> Candidate<'a> {
    /// Build a candidate from a filesystem path, normalizing its separators
    /// to `/`.
    pub fn new<P: AsRef<Path> + ?Sized>(path: &'a P) -> Candidate<'a> {
        let path = normalize_path(Vec::from_path_lossy(path.as_ref()));
        Candidate { path }
    }

    /// The normalized path bytes, suitable as a `MultiRegex` haystack.
    pub fn as_bytes(&self) -> &[u8] {
        &self.path
    }
}

/// Normalizes a path for use with `/` as a separator everywhere, even on
/// platforms that recognize other characters as separators.
#[cfg(unix)]
fn normalize_path(path: Cow<'_, [u8]>) -> Cow<'_, [u8]> {
    path
}

#[cfg(not(unix))]
fn normalize_path(mut path: Cow<[u8]>) -> Cow<[u8]> {
    use std::path::is_separator;

    for i in 0..path.len() {
        if path[i] == b'/' || !is_separator(char::from(path[i])) {
            continue;
        }
        path.to_mut()[i] = b'/';
    }
    path
}

#[cfg(test)]
mod tests {
    use super::Candidate;
    use std::path::Path;

    #[test]
    fn normalizes_to_forward_slash() {
        let c = Candidate::new(Path::new("foo/bar"));
        assert_eq!(c.as_bytes(), b"foo/bar");
    }
}
