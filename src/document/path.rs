use std::cmp::Ordering;

/// Child-index chain from the document root down to a node.
pub type Path = Vec<usize>;

/// Orders two paths in document order. An ancestor compares equal to its
/// descendants, so callers that need strict containment checks combine this
/// with [`is_ancestor`].
pub fn compare(a: &[usize], b: &[usize]) -> Ordering {
    for (left, right) in a.iter().zip(b.iter()) {
        match left.cmp(right) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

pub fn is_ancestor(ancestor: &[usize], path: &[usize]) -> bool {
    ancestor.len() < path.len() && path.starts_with(ancestor)
}

pub fn is_ancestor_or_equal(ancestor: &[usize], path: &[usize]) -> bool {
    ancestor.len() <= path.len() && path.starts_with(ancestor)
}

pub fn is_sibling(a: &[usize], b: &[usize]) -> bool {
    if a.is_empty() || a.len() != b.len() || a == b {
        return false;
    }
    let last = a.len() - 1;
    a[..last] == b[..last]
}

/// True when `a` sits before `b` among the children of a shared parent at
/// `a`'s depth.
pub fn ends_before(a: &[usize], b: &[usize]) -> bool {
    let Some(level) = a.len().checked_sub(1) else {
        return false;
    };
    if b.len() <= level {
        return false;
    }
    a[..level] == b[..level] && a[level] < b[level]
}

pub fn parent(path: &[usize]) -> Path {
    match path.split_last() {
        Some((_, prefix)) => prefix.to_vec(),
        None => Vec::new(),
    }
}

pub fn next(path: &[usize]) -> Path {
    let mut result = path.to_vec();
    if let Some(last) = result.last_mut() {
        *last += 1;
    }
    result
}

pub fn previous(path: &[usize]) -> Option<Path> {
    let mut result = path.to_vec();
    let last = result.last_mut()?;
    *last = last.checked_sub(1)?;
    Some(result)
}

pub fn child(path: &[usize], index: usize) -> Path {
    let mut result = path.to_vec();
    result.push(index);
    result
}

/// Length of the longest shared prefix.
pub fn common_len(a: &[usize], b: &[usize]) -> usize {
    a.iter().zip(b.iter()).take_while(|(l, r)| l == r).count()
}
