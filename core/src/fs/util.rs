use std::cmp::Ordering;
use std::path::{Component, Path};

/// Run of digits or run of anything else inside a file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Chunk<'a> {
    Digits(&'a str),
    Text(&'a str),
}

fn chunks(name: &str) -> impl Iterator<Item = Chunk<'_>> {
    let mut rest = name;
    std::iter::from_fn(move || {
        let digit = rest.chars().next()?.is_ascii_digit();
        let end = rest.find(|ch: char| ch.is_ascii_digit() != digit).unwrap_or(rest.len());
        let (head, tail) = rest.split_at(end);
        rest = tail;
        Some(if digit { Chunk::Digits(head) } else { Chunk::Text(head) })
    })
}

/// Numeric comparison of digit runs of any length; more leading zeros sort later.
fn cmp_digits(a: &str, b: &str) -> Ordering {
    let (a_value, b_value) = (a.trim_start_matches('0'), b.trim_start_matches('0'));
    a_value
        .len()
        .cmp(&b_value.len())
        .then_with(|| a_value.cmp(b_value))
        .then_with(|| a.len().cmp(&b.len()))
}

/// Case-insensitive natural ordering for names in a listing: `file2` before `file10`.
/// Names equal up to case fall back to a byte comparison so the order is total.
pub fn natural_cmp_name(a: &str, b: &str) -> Ordering {
    let (a_lower, b_lower) = (a.to_lowercase(), b.to_lowercase());
    let (mut left, mut right) = (chunks(&a_lower), chunks(&b_lower));

    loop {
        let ordering = match (left.next(), right.next()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(Chunk::Digits(x)), Some(Chunk::Digits(y))) => cmp_digits(x, y),
            (Some(Chunk::Text(x)), Some(Chunk::Text(y))) => x.cmp(y),
            (Some(Chunk::Digits(_)), Some(Chunk::Text(_))) => Ordering::Less,
            (Some(Chunk::Text(_)), Some(Chunk::Digits(_))) => Ordering::Greater,
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
}

/// Collapse `.`/`..` segments and duplicate separators. The root stays `/`.
pub fn normalize(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();

    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                if parts.last().is_some_and(|last| *last != "..") {
                    parts.pop();
                } else if !absolute {
                    parts.push("..");
                }
            }
            other => parts.push(other),
        }
    }

    let joined = parts.join("/");
    if absolute {
        format!("/{joined}")
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

pub fn join(base: &str, child: &str) -> String {
    if base.is_empty() {
        return normalize(child);
    }
    normalize(&format!("{base}/{child}"))
}

pub fn basename(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or("")
}

pub fn dirname(path: &str) -> String {
    let normalized = normalize(path);
    match normalized.rfind('/') {
        Some(0) => "/".to_string(),
        Some(idx) => normalized[..idx].to_string(),
        None => ".".to_string(),
    }
}

/// Extension including the dot, or an empty string. Dot files have no extension.
pub fn extname(path: &str) -> &str {
    let base = basename(path);
    match base.rfind('.') {
        Some(idx) if idx > 0 => &base[idx..],
        _ => "",
    }
}

pub fn file_stem(path: &str) -> &str {
    let base = basename(path);
    &base[..base.len() - extname(base).len()]
}

/// Path of `to` relative to `from`, both taken as absolute.
pub fn relative(from: &str, to: &str) -> String {
    let from = normalize(from);
    let to = normalize(to);
    let from_parts: Vec<&str> = from.split('/').filter(|p| !p.is_empty()).collect();
    let to_parts: Vec<&str> = to.split('/').filter(|p| !p.is_empty()).collect();

    let common = from_parts.iter().zip(to_parts.iter()).take_while(|(a, b)| a == b).count();
    let mut out: Vec<&str> = vec![".."; from_parts.len() - common];
    out.extend_from_slice(&to_parts[common..]);
    out.join("/")
}

/// `"name (n).ext"`, keeping any leading directory part of `name`.
pub fn iterate_name(name: &str, iteration: u32) -> String {
    let (parent, base) = match name.rfind('/') {
        Some(idx) => (&name[..=idx], &name[idx + 1..]),
        None => ("", name),
    };
    let ext = extname(base);
    let stem = &base[..base.len() - ext.len()];
    format!("{parent}{stem} ({iteration}){ext}")
}

/// Strip characters the store rejects and trim surrounding whitespace.
pub fn sanitize_file_name(name: &str, invalid: &str) -> Option<String> {
    let cleaned: String = name.chars().filter(|ch| !invalid.contains(*ch)).collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() { None } else { Some(cleaned.to_string()) }
}

/// Relative archive member path with traversal and absolute prefixes rejected.
pub fn sanitize_archive_path(path: &str) -> Option<String> {
    let unified = path.replace('\\', "/");
    let mut clean: Vec<String> = Vec::new();

    for component in Path::new(&unified).components() {
        match component {
            Component::Normal(part) => clean.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            Component::ParentDir | Component::Prefix(_) | Component::RootDir => return None,
        }
    }

    if clean.is_empty() { None } else { Some(clean.join("/")) }
}
