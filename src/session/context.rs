//! Context window rendering
//!
//! Builds the truncated textual summary of recent exchanges that is
//! prepended to a new outbound message. The upstream thread already
//! accumulates the full history server-side; the context window only
//! provides cross-session hinting, so it stays small.

use crate::session::Exchange;

/// Render the last `max_exchanges` exchanges as a context window
///
/// Exchanges are rendered oldest-first as alternating `User:` /
/// `Assistant:` lines, with each response truncated to
/// `response_budget` characters.
///
/// # Arguments
///
/// * `history` - Full exchange history, oldest-first
/// * `max_exchanges` - Number of trailing exchanges to include
/// * `response_budget` - Character budget applied to each response
///
/// # Returns
///
/// Returns `None` when the history is empty, otherwise the rendered
/// window.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use deskmind::session::context::build_context_window;
/// use deskmind::session::Exchange;
///
/// let history = vec![Exchange {
///     query: "Hello".to_string(),
///     response: "Hi there".to_string(),
///     timestamp: Utc::now(),
///     metadata: None,
/// }];
///
/// let window = build_context_window(&history, 3, 500).unwrap();
/// assert!(window.starts_with("User: Hello"));
/// assert!(window.contains("Assistant: Hi there"));
/// ```
pub fn build_context_window(
    history: &[Exchange],
    max_exchanges: usize,
    response_budget: usize,
) -> Option<String> {
    if history.is_empty() {
        return None;
    }

    let start = history.len().saturating_sub(max_exchanges);
    let window = history[start..]
        .iter()
        .map(|entry| {
            format!(
                "User: {}\nAssistant: {}",
                entry.query,
                truncate_response(&entry.response, response_budget)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    Some(window)
}

/// Truncates a response to a maximum character count, adding ellipsis if truncated
fn truncate_response(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let mut truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        truncated.push_str("...");
        truncated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn exchange(query: &str, response: &str) -> Exchange {
        Exchange {
            query: query.to_string(),
            response: response.to_string(),
            timestamp: Utc::now(),
            metadata: None,
        }
    }

    #[test]
    fn test_empty_history_returns_none() {
        assert!(build_context_window(&[], 3, 500).is_none());
    }

    #[test]
    fn test_single_exchange() {
        let history = vec![exchange("Hello", "Hi")];
        let window = build_context_window(&history, 3, 500).unwrap();
        assert_eq!(window, "User: Hello\nAssistant: Hi");
    }

    #[test]
    fn test_window_keeps_most_recent_oldest_first() {
        let history: Vec<Exchange> = (0..5)
            .map(|i| exchange(&format!("q{}", i), &format!("r{}", i)))
            .collect();

        let window = build_context_window(&history, 3, 500).unwrap();

        // Only the last three exchanges appear
        assert!(!window.contains("q0"));
        assert!(!window.contains("q1"));
        assert!(window.contains("q2"));
        assert!(window.contains("q3"));
        assert!(window.contains("q4"));

        // Oldest of the retained exchanges comes first
        let pos2 = window.find("q2").unwrap();
        let pos4 = window.find("q4").unwrap();
        assert!(pos2 < pos4);
    }

    #[test]
    fn test_window_smaller_than_limit_keeps_everything() {
        let history = vec![exchange("a", "b"), exchange("c", "d")];
        let window = build_context_window(&history, 10, 500).unwrap();
        assert!(window.contains("User: a"));
        assert!(window.contains("User: c"));
    }

    #[test]
    fn test_responses_are_truncated_to_budget() {
        let long_response = "x".repeat(600);
        let history = vec![exchange("q", &long_response)];

        let window = build_context_window(&history, 3, 100).unwrap();
        let rendered = window.strip_prefix("User: q\nAssistant: ").unwrap();
        assert_eq!(rendered.chars().count(), 100);
        assert!(rendered.ends_with("..."));
    }

    #[test]
    fn test_queries_are_not_truncated() {
        let long_query = "y".repeat(300);
        let history = vec![exchange(&long_query, "short")];

        let window = build_context_window(&history, 3, 100).unwrap();
        assert!(window.contains(&long_query));
    }

    #[test]
    fn test_truncate_response_exact_fit() {
        assert_eq!(truncate_response("exact", 5), "exact");
        assert_eq!(truncate_response("toolong", 6), "too...");
    }
}
