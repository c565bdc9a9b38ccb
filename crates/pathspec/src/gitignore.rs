/*!
Translation of one `.gitignore`-dialect line into a compiled [`Pattern`].

This module carries two dialects, mirroring the two pattern classes the
wire format has historically had:

- [`Dialect::Spec`] replicates what Git itself actually does, including the
  edge case where a whitelisted directory re-introduces its contents even
  against a later file-priority exclusion. This is the dialect
  [`crate::spec::GitIgnoreSpec`] uses, and the one callers should prefer.
- [`Dialect::Documented`] implements the simpler behavior described by
  `gitignore(5)`, which diverges from Git's real behavior in exactly the
  directory re-inclusion case above. It's kept for compatibility with
  callers who depend on the documented (but not fully accurate) semantics,
  and is registered under the name `"gitignore"`.
*/

use crate::pattern::{Include, Pattern};

/// Which gitignore pattern dialect to translate a line under.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Dialect {
    /// The behavior documented by `gitignore(5)`.
    Documented,
    /// Git's actual behavior, including the directory-reinclusion quirk.
    Spec,
}

const DIR_MARK_CG: &str = "(?P<ps_d>/)";

fn dir_mark_opt() -> String {
    format!("(?:{DIR_MARK_CG}|$)")
}

/// Strip a raw pattern line the way Git does: trailing whitespace is
/// insignificant unless the line ends with an escaped space (`"\ "`), in
/// which case only leading whitespace is stripped.
fn strip(raw: &str) -> String {
    if raw.ends_with("\\ ") {
        raw.trim_start().to_string()
    } else {
        raw.trim().to_string()
    }
}

/// Translate a single segment glob (the text between two `/`) into a
/// regex fragment. This is shared by both dialects.
fn translate_segment_glob(seg: &str) -> Result<String, &'static str> {
    let chars: Vec<char> = seg.chars().collect();
    let mut out = String::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        i += 1;
        match c {
            '\\' => {
                let Some(&escaped) = chars.get(i) else {
                    return Err("dangling escape");
                };
                i += 1;
                out.push_str(&regex_escape_char(escaped));
            }
            '*' => out.push_str("[^/]*"),
            '?' => out.push_str("[^/]"),
            '[' => {
                let mut j = i;
                if chars.get(j) == Some(&'!') {
                    j += 1;
                }
                if chars.get(j) == Some(&']') {
                    j += 1;
                }
                while j < chars.len() && chars[j] != ']' {
                    j += 1;
                }
                if j < chars.len() {
                    j += 1;
                    let mut expr = String::from("[");
                    if chars.get(i) == Some(&'!') {
                        expr.push('^');
                        i += 1;
                    } else if chars.get(i) == Some(&'^') {
                        expr.push_str("\\^");
                        i += 1;
                    }
                    for &ch in &chars[i..j - 1] {
                        if ch == '\\' {
                            expr.push_str("\\\\");
                        } else {
                            expr.push(ch);
                        }
                    }
                    expr.push(']');
                    out.push_str(&expr);
                    i = j;
                } else {
                    out.push_str("\\[");
                }
            }
            other => out.push_str(&regex_escape_char(other)),
        }
    }
    Ok(out)
}

fn regex_escape_char(c: char) -> String {
    if c.is_ascii_alphanumeric() || c == '_' {
        c.to_string()
    } else {
        format!("\\{c}")
    }
}

fn collapse_duplicate_double_star(segs: &mut Vec<String>) {
    let mut i = segs.len();
    while i > 1 {
        i -= 1;
        if segs[i - 1] == "**" && segs[i] == "**" {
            segs.remove(i);
        }
    }
}

/// Compile one raw line of gitignore syntax into a [`Pattern`].
pub fn compile_line(raw_line: &str, dialect: Dialect) -> Result<Pattern, crate::Error> {
    let pattern_str = strip(raw_line);

    if pattern_str.is_empty() || pattern_str.starts_with('#') || pattern_str == "/" {
        return Ok(Pattern::noop(raw_line.to_string()));
    }

    let (include, body) = if let Some(rest) = pattern_str.strip_prefix('!') {
        (Include::Exclude, rest)
    } else {
        (Include::Include, pattern_str.as_str())
    };

    let mut segs: Vec<String> = body.split('/').map(|s| s.to_string()).collect();
    let is_dir_pattern = segs.last().is_some_and(|s| s.is_empty());

    let result = match dialect {
        Dialect::Spec => translate_spec(&mut segs, is_dir_pattern),
        Dialect::Documented => translate_documented(&mut segs, is_dir_pattern),
    };
    let (regex, has_dir_mark) = result.map_err(|reason| crate::Error::Pattern {
        line: raw_line.to_string(),
        reason: reason.to_string(),
    })?;

    Pattern::compiled(raw_line.to_string(), include, is_dir_pattern, &regex, has_dir_mark)
}

fn translate_spec(
    segs: &mut Vec<String>,
    is_dir_pattern: bool,
) -> Result<(String, bool), &'static str> {
    collapse_duplicate_double_star(segs);

    let mut override_regex: Option<(String, bool)> = None;
    if segs.len() == 2 && segs[0] == "**" && segs[1].is_empty() {
        override_regex = Some((DIR_MARK_CG.to_string(), true));
    }

    if segs[0].is_empty() {
        segs.remove(0);
    } else if segs.len() == 1 || (segs.len() == 2 && segs[1].is_empty()) {
        if segs[0] != "**" {
            segs.insert(0, "**".to_string());
        }
    }

    if segs.is_empty() {
        return Err("invalid pattern: no segments remain after normalization");
    }
    if segs.last().unwrap().is_empty() {
        *segs.last_mut().unwrap() = "**".to_string();
    }

    if override_regex.is_none() {
        let n = segs.len();
        if n == 1 && segs[0] == "**" {
            override_regex = Some((".".to_string(), false));
        } else if n == 2 && segs[0] == "**" && segs[1] == "*" {
            override_regex = Some((".".to_string(), false));
        } else if n == 3 && segs[0] == "**" && segs[1] == "*" && segs[2] == "**" {
            override_regex = Some(if is_dir_pattern {
                (DIR_MARK_CG.to_string(), true)
            } else {
                ("/".to_string(), false)
            });
        }
    }

    if let Some((regex, has_dir_mark)) = override_regex {
        return Ok((regex, has_dir_mark));
    }

    let mut out = String::new();
    let mut has_dir_mark = false;
    let mut need_slash = false;
    let end = segs.len() - 1;
    for (i, seg) in segs.iter().enumerate() {
        if seg == "**" {
            if i == 0 {
                out.push_str("^(?:.+/)?");
            } else if i < end {
                out.push_str("(?:/.+)?");
                need_slash = true;
            } else if is_dir_pattern {
                out.push_str(DIR_MARK_CG);
                has_dir_mark = true;
            } else {
                out.push('/');
            }
        } else {
            if i == 0 {
                out.push('^');
            }
            if need_slash {
                out.push('/');
            }
            if seg == "*" {
                out.push_str("[^/]+");
            } else {
                out.push_str(&translate_segment_glob(seg)?);
            }
            if i == end {
                out.push_str(&dir_mark_opt());
                has_dir_mark = true;
            }
            need_slash = true;
        }
    }
    Ok((out, has_dir_mark))
}

fn translate_documented(
    segs: &mut Vec<String>,
    mut is_dir_pattern: bool,
) -> Result<(String, bool), &'static str> {
    if segs.len() == 2 && segs[0].is_empty() && segs[1].is_empty() {
        // The body was empty (pattern was exactly "/"); handled as NoOp by
        // the caller before reaching here in this crate, kept defensive.
        is_dir_pattern = false;
    }

    if segs[0].is_empty() {
        segs.remove(0);
    } else if segs.len() == 1 || (segs.len() == 2 && segs[1].is_empty()) {
        if segs[0] != "**" {
            segs.insert(0, "**".to_string());
        }
    }

    if segs.is_empty() {
        return Err("invalid pattern: no segments remain after normalization");
    }

    let last_is_empty = segs.last().unwrap().is_empty();
    let preceded_by_double_star = segs.len() >= 2 && segs[segs.len() - 2] == "**";
    if last_is_empty && !preceded_by_double_star {
        *segs.last_mut().unwrap() = "**".to_string();
    }

    collapse_duplicate_double_star(segs);

    let mut override_regex: Option<String> = None;
    let n = segs.len();
    if n == 1 && segs[0] == "**" {
        override_regex = Some(if is_dir_pattern { "/".to_string() } else { ".".to_string() });
    } else if n == 2 && segs[0] == "**" && segs[1] == "*" {
        override_regex = Some(".".to_string());
    } else if n == 3 && segs[0] == "**" && segs[1] == "*" && segs[2] == "**" {
        override_regex = Some("/".to_string());
    }

    if let Some(regex) = override_regex {
        return Ok((regex, false));
    }

    let mut out = String::new();
    let mut need_slash = false;
    let end = segs.len() - 1;
    for (i, seg) in segs.iter().enumerate() {
        if seg == "**" {
            if i == 0 {
                out.push_str("^(?:.+/)?");
            } else if i < end {
                out.push_str("(?:/.+)?");
                need_slash = true;
            } else {
                out.push('/');
            }
        } else {
            if i == 0 {
                out.push('^');
            }
            if need_slash {
                out.push('/');
            }
            if seg == "*" {
                out.push_str("[^/]+");
            } else {
                out.push_str(&translate_segment_glob(seg)?);
            }
            if i == end {
                if seg == "*" {
                    out.push_str("/?$");
                } else {
                    out.push_str("(?:/|$)");
                }
            }
            need_slash = true;
        }
    }
    Ok((out, false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::Include;

    fn regex_of(line: &str, dialect: Dialect) -> String {
        let p = compile_line(line, dialect).unwrap();
        p.regex_source().unwrap().to_string()
    }

    #[test]
    fn comment_and_blank_are_noop() {
        assert_eq!(compile_line("", Dialect::Spec).unwrap().include(), Include::NoOp);
        assert_eq!(compile_line("# hi", Dialect::Spec).unwrap().include(), Include::NoOp);
        assert_eq!(compile_line("/", Dialect::Spec).unwrap().include(), Include::NoOp);
    }

    #[test]
    fn negation_flips_polarity() {
        let p = compile_line("!foo", Dialect::Spec).unwrap();
        assert_eq!(p.include(), Include::Exclude);
    }

    #[test]
    fn double_star_matches_everything() {
        assert_eq!(regex_of("**", Dialect::Spec), ".");
    }

    #[test]
    fn root_anchor_on_single_slash_prefix() {
        let p = compile_line("/foo", Dialect::Spec).unwrap();
        assert_eq!(p.test(b"foo"), Some(false));
        assert_eq!(p.test(b"x/foo"), None);
    }

    #[test]
    fn trailing_slash_sets_dir_only_and_dir_mark() {
        let p = compile_line("dirG/", Dialect::Spec).unwrap();
        assert!(p.dir_only());
        assert_eq!(p.test(b"dirG/fileO"), Some(true));
        assert_eq!(p.test(b"fileA"), None);
    }

    #[test]
    fn malformed_bracket_falls_back_to_literal() {
        // No closing bracket: '[' is treated as a literal character.
        let p = compile_line("a[b", Dialect::Spec).unwrap();
        assert_eq!(p.test(b"a[b"), Some(false));
    }

    #[test]
    fn dangling_escape_is_an_error() {
        assert!(compile_line("foo\\", Dialect::Spec).is_err());
    }
}
