//! Relevance heuristic, highlight scan and context window
//!
//! Scores are additive and case-insensitive. They order results inside one
//! search call and mean nothing across calls with different queries.

const EXACT_MATCH_BONUS: f64 = 100.0;
const SUBSTRING_BONUS: f64 = 50.0;
const WORD_BONUS: f64 = 10.0;
const MAX_POSITION_BONUS: f64 = 20.0;
const MIN_WORD_CHARS: usize = 2;

/// Query words that take part in word scoring and highlighting
pub fn query_words(query: &str) -> Vec<&str> {
    query
        .split_whitespace()
        .filter(|word| word.chars().count() >= MIN_WORD_CHARS)
        .collect()
}

/// Relevance of `content` for `query`
///
/// - equal (ignoring case): +100
/// - contains the query: +50
/// - each query word of two or more chars found: +10 (repeats count again)
/// - query found at char offset `i`: +max(0, 20 - i/10)
pub fn score(content: &str, query: &str) -> f64 {
    let query = query.trim();
    if content.is_empty() || query.is_empty() {
        return 0.0;
    }

    let content = content.to_lowercase();
    let query = query.to_lowercase();
    let mut total = 0.0;

    if content == query {
        total += EXACT_MATCH_BONUS;
    }

    if let Some(byte_index) = content.find(&query) {
        total += SUBSTRING_BONUS;
        let char_index = content[..byte_index].chars().count() as f64;
        total += (MAX_POSITION_BONUS - char_index / 10.0).max(0.0);
    }

    total += query_words(&query)
        .into_iter()
        .filter(|word| content.contains(word))
        .count() as f64
        * WORD_BONUS;

    total
}

/// Every occurrence of every query word in `content`, in word order then
/// position order, duplicates kept
pub fn highlights(content: &str, query: &str) -> Vec<String> {
    let lowered = content.to_lowercase();
    // Slicing the original is only safe when lowercasing kept byte offsets.
    let same_offsets = lowered.len() == content.len();

    let mut found = Vec::new();
    for word in query_words(query) {
        let word = word.to_lowercase();
        for (start, matched) in lowered.match_indices(word.as_str()) {
            if same_offsets {
                found.push(content[start..start + matched.len()].to_string());
            } else {
                found.push(matched.to_string());
            }
        }
    }
    found
}

/// `radius` chars either side of the first match of the query (or, failing
/// that, of its first matching word), with `...` where the text was cut
pub fn context_window(content: &str, query: &str, radius: usize) -> Option<String> {
    let query = query.trim();
    if content.is_empty() || query.is_empty() {
        return None;
    }

    let lowered: Vec<char> = content.to_lowercase().chars().collect();
    let (start, len) = find_chars(&lowered, &query.to_lowercase()).or_else(|| {
        query_words(query)
            .into_iter()
            .find_map(|word| find_chars(&lowered, &word.to_lowercase()))
    })?;

    let chars: Vec<char> = content.chars().collect();
    let window_start = start.saturating_sub(radius).min(chars.len());
    let window_end = (start + len + radius).min(chars.len());

    let mut window = String::new();
    if window_start > 0 {
        window.push_str("...");
    }
    window.extend(&chars[window_start..window_end]);
    if window_end < chars.len() {
        window.push_str("...");
    }
    Some(window)
}

/// Char offset and char length of the first occurrence of `needle`
fn find_chars(haystack: &[char], needle: &str) -> Option<(usize, usize)> {
    let needle: Vec<char> = needle.chars().collect();
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle.as_slice())
        .map(|start| (start, needle.len()))
}
