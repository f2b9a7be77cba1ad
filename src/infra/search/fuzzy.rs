//! Term matching with automatic edit-distance tolerance.
//!
//! Tolerance follows the `AUTO` rule of the index engine: terms of 1-2
//! characters must match exactly, 3-5 characters allow one edit, longer terms
//! allow two.

pub fn auto_fuzziness(term: &str) -> usize {
    match term.chars().count() {
        0..=2 => 0,
        3..=5 => 1,
        _ => 2,
    }
}

/// Lowercased alphanumeric tokens of `text`.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

/// Levenshtein distance with adjacent transpositions counted as one edit.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let width = b.len() + 1;
    let mut d = vec![0usize; (a.len() + 1) * width];
    for i in 0..=a.len() {
        d[i * width] = i;
    }
    for j in 0..=b.len() {
        d[j] = j;
    }

    for i in 1..=a.len() {
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            let mut best = (d[(i - 1) * width + j] + 1)
                .min(d[i * width + j - 1] + 1)
                .min(d[(i - 1) * width + j - 1] + cost);
            if i > 1 && j > 1 && a[i - 1] == b[j - 2] && a[i - 2] == b[j - 1] {
                best = best.min(d[(i - 2) * width + j - 2] + 1);
            }
            d[i * width + j] = best;
        }
    }
    d[a.len() * width + b.len()]
}

/// Whether `term` (from the query) matches `token` (from a document).
pub fn fuzzy_match(term: &str, token: &str) -> bool {
    let allowed = auto_fuzziness(term);
    if allowed == 0 {
        return term == token;
    }
    let len_gap = term.chars().count().abs_diff(token.chars().count());
    len_gap <= allowed && edit_distance(term, token) <= allowed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_fuzziness() {
        assert_eq!(auto_fuzziness("tv"), 0);
        assert_eq!(auto_fuzziness("apple"), 1);
        assert_eq!(auto_fuzziness("samsung"), 2);
    }

    #[test]
    fn test_edit_distance() {
        assert_eq!(edit_distance("apple", "apple"), 0);
        assert_eq!(edit_distance("aple", "apple"), 1);
        assert_eq!(edit_distance("appel", "apple"), 1);
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(edit_distance("", "abc"), 3);
    }

    #[test]
    fn test_fuzzy_match() {
        assert!(fuzzy_match("aple", "apple"));
        assert!(fuzzy_match("samsng", "samsung"));
        assert!(!fuzzy_match("tv", "tb"));
        assert!(fuzzy_match("tv", "tv"));
        assert!(!fuzzy_match("apple", "maple syrup"));
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(tokenize("Galaxy S23-Ultra"), vec!["galaxy", "s23", "ultra"]);
        assert!(tokenize("  ").is_empty());
    }
}
