/*!
The matching backend interface and its implementations.

A backend turns a candidate path and a compiled pattern list into a single
verdict: which pattern (if any) decided the match, and whether that pattern
includes or excludes the path. [`SimpleBackend`] is the reference
implementation; [`AcceleratedBackend`] produces identical verdicts using a
multi-pattern automaton instead of testing each pattern's regex in turn.
*/

mod accelerated;
mod simple;

pub use accelerated::AcceleratedBackend;
pub use simple::SimpleBackend;

use crate::pattern::Pattern;

/// Below this many active (non-`NoOp`) patterns, [`Backend::best`] prefers
/// [`SimpleBackend`] over [`AcceleratedBackend`]: building the combined
/// automaton only pays for itself once there's enough patterns to search.
const ACCELERATE_THRESHOLD: usize = 32;

/// A compiled multi-pattern matcher.
///
/// Implementations must agree with [`SimpleBackend`]'s priority rule
/// (directory-match beats file-match, ties go to the later pattern, and a
/// later `Include` pattern matched as a directory always beats an earlier
/// index regardless of priority) since that rule is Git's actual behavior,
/// not an implementation detail of the reference backend.
pub trait Backend: Send + Sync + std::fmt::Debug {
    /// Match `path` (already normalized, `/`-separated bytes) against the
    /// compiled pattern list, returning the winning pattern's inclusion
    /// verdict and index, or `(None, None)` if nothing matched.
    fn match_file(&self, path: &[u8]) -> (Option<bool>, Option<usize>);
}

/// The name of a backend, as accepted by [`crate::spec::PathSpecBuilder`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BackendName {
    /// Pick [`AcceleratedBackend`] or [`SimpleBackend`] based on pattern
    /// count.
    Best,
    /// Always use [`SimpleBackend`].
    Simple,
    /// Always use [`AcceleratedBackend`].
    Accelerated,
}

impl std::str::FromStr for BackendName {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<BackendName, crate::Error> {
        match s {
            "best" => Ok(BackendName::Best),
            "simple" => Ok(BackendName::Simple),
            "accelerated" => Ok(BackendName::Accelerated),
            other => Err(crate::Error::Unknown { kind: "backend", name: other.to_string() }),
        }
    }
}

/// Build the backend named by `name` from `patterns`.
pub fn build(
    name: BackendName,
    patterns: std::sync::Arc<[Pattern]>,
) -> Result<Box<dyn Backend>, crate::Error> {
    match name {
        BackendName::Simple => Ok(Box::new(SimpleBackend::new(patterns))),
        BackendName::Accelerated => {
            Ok(Box::new(AcceleratedBackend::new(patterns)?))
        }
        BackendName::Best => {
            let active = patterns.iter().filter(|p| !p.include().is_noop()).count();
            if active >= ACCELERATE_THRESHOLD {
                log::debug!(
                    "selecting accelerated backend ({active} active patterns >= {ACCELERATE_THRESHOLD})"
                );
                Ok(Box::new(AcceleratedBackend::new(patterns)?))
            } else {
                log::debug!(
                    "selecting simple backend ({active} active patterns < {ACCELERATE_THRESHOLD})"
                );
                Ok(Box::new(SimpleBackend::new(patterns)))
            }
        }
    }
}

/// Apply the priority rule across an iterator of `(index, dir_match)` hits
/// against `patterns`, returning the winning `(include, index)`.
///
/// Shared by [`SimpleBackend`] and [`AcceleratedBackend`] so that the two
/// engines can never disagree on how ties and the directory-reinclusion
/// override are resolved.
pub(crate) fn resolve_priority<I>(patterns: &[Pattern], hits: I) -> (Option<bool>, Option<usize>)
where
    I: IntoIterator<Item = (usize, bool)>,
{
    use crate::pattern::Include;

    let mut best_include = None;
    let mut best_index: Option<usize> = None;
    let mut best_priority = 0u8;

    for (i, dir_match) in hits {
        let pattern = &patterns[i];
        let priority: u8 = if dir_match { 1 } else { 2 };
        let later = match best_index {
            Some(bi) => i > bi,
            None => true,
        };
        let is_whitelist_override =
            pattern.include() == Include::Include && dir_match && later;
        let wins = priority > best_priority
            || (priority == best_priority && later)
            || is_whitelist_override;
        if wins {
            best_priority = priority;
            best_index = Some(i);
            best_include = Some(pattern.include() == Include::Include);
        }
    }
    (best_include, best_index)
}
