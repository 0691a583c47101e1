//! String-set diffing.

/// Compare two string lists.
///
/// Returns `(added, removed)`: entries of `new` missing from `old`, and
/// entries of `old` missing from `new`. Both keep the order of their source list.
#[must_use]
pub fn diff_strings<S: AsRef<str>>(old: &[S], new: &[S]) -> (Vec<String>, Vec<String>) {
    let missing_from = |haystack: &[S], needle: &S| {
        !haystack.iter().any(|h| h.as_ref() == needle.as_ref())
    };

    let added = new
        .iter()
        .filter(|v| missing_from(old, *v))
        .map(|v| v.as_ref().to_string())
        .collect();
    let removed = old
        .iter()
        .filter(|v| missing_from(new, *v))
        .map(|v| v.as_ref().to_string())
        .collect();

    (added, removed)
}
