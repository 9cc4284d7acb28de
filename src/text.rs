//! Answer canonicalization and fuzzy matching helpers.

/// Reduce a string to its canonical id: lowercase alphanumerics only.
/// Answers, categories, and user names are all compared in this form.
pub fn to_id(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Edit distance between two strings, counting insertions, deletions,
/// and substitutions.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Whether a submitted canonical answer matches an accepted canonical answer.
/// Exact match always counts; accepted answers longer than 5 characters also
/// tolerate up to 2 edits of typo.
pub fn answer_matches(submitted: &str, accepted: &str) -> bool {
    submitted == accepted || (accepted.len() > 5 && levenshtein(submitted, accepted) < 3)
}
