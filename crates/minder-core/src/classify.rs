//! Follow-through classification via word overlap.
//!
//! A deliberately simple, stateless heuristic: the user's reply counts as
//! follow-through when it shares at least one content word with the task
//! name. Pure function of (name, response) so it is testable without any
//! scheduling machinery.

/// Extract content words: lowercase, alphanumeric runs longer than 2 chars.
fn content_words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .map(|w| w.to_lowercase())
        .filter(|w| w.len() > 2)
        .collect()
}

/// Whether a free-text response counts as doing the named task.
///
/// Case-insensitive; an empty or stop-word-only response never matches.
pub fn response_matches_task(task_name: &str, response: &str) -> bool {
    let name_words = content_words(task_name);
    if name_words.is_empty() {
        return false;
    }
    content_words(response)
        .iter()
        .any(|w| name_words.contains(w))
}
