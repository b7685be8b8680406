//! Text rendering utilities for human-friendly error messages.
//!
//! Build chains, identifiers derived from type names, and
//! "did you mean?" suggestions for unknown identifiers.

/// Renders a build chain as a readable string.
///
/// # Examples
/// ```
/// use khazna_support::rendering::render_chain;
///
/// let chain = vec!["UserService", "UserRepo", "Database"];
/// assert_eq!(render_chain(&chain), "UserService -> UserRepo -> Database");
/// ```
pub fn render_chain(chain: &[impl AsRef<str>]) -> String {
    let mut rendered = String::new();
    for (i, entry) in chain.iter().enumerate() {
        if i > 0 {
            rendered.push_str(" -> ");
        }
        rendered.push_str(entry.as_ref());
    }
    rendered
}

/// Strips module paths from a type name, keeping generic structure.
///
/// This is how container identifiers are derived from Rust types.
///
/// ```
/// use khazna_support::rendering::shorten_type_name;
///
/// assert_eq!(shorten_type_name("my_app::services::user::UserService"), "UserService");
/// assert_eq!(shorten_type_name("dyn my_app::traits::Logger"), "dyn Logger");
/// assert_eq!(
///     shorten_type_name("alloc::sync::Arc<dyn my_app::traits::Logger>"),
///     "Arc<dyn Logger>"
/// );
/// ```
pub fn shorten_type_name(full_name: &str) -> String {
    let mut shortened = String::with_capacity(full_name.len());
    let mut rest = full_name;

    while let Some(offset) = rest.find(is_delimiter) {
        let (path, tail) = rest.split_at(offset);
        shortened.push_str(last_path_segment(path));

        let mut chars = tail.chars();
        if let Some(delimiter) = chars.next() {
            shortened.push(delimiter);
        }
        rest = chars.as_str();
    }

    shortened.push_str(last_path_segment(rest));
    shortened
}

fn is_delimiter(ch: char) -> bool {
    matches!(ch, '<' | '>' | ',' | ' ' | '(' | ')' | '[' | ']' | ';' | '&')
}

fn last_path_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}

/// Generates "did you mean?" suggestions based on known identifiers.
///
/// A known identifier qualifies when it contains the requested one (or the
/// other way round) or is within a small edit distance of it, ignoring
/// case. Returns at most `max_suggestions` names, closest first.
pub fn suggest_similar(requested: &str, available: &[&str], max_suggestions: usize) -> Vec<String> {
    let wanted = requested.to_lowercase();
    if wanted.is_empty() {
        return Vec::new();
    }
    let tolerance = (wanted.chars().count() / 3).max(1);

    let mut scored: Vec<(usize, &str)> = available
        .iter()
        .copied()
        .filter(|&name| name != requested)
        .filter_map(|name| {
            let candidate = name.to_lowercase();
            if wanted.len() >= 3 && (candidate.contains(&wanted) || wanted.contains(&candidate)) {
                return Some((0, name));
            }
            let distance = edit_distance(&wanted, &candidate);
            (distance <= tolerance).then_some((distance, name))
        })
        .collect();

    scored.sort_unstable();
    scored.dedup();
    scored
        .into_iter()
        .take(max_suggestions)
        .map(|(_, name)| name.to_string())
        .collect()
}

/// Levenshtein distance over chars.
fn edit_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        current[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chains() {
        assert_eq!(render_chain(&["A", "B", "A"]), "A -> B -> A");
        assert_eq!(render_chain(&["A"]), "A");
        let empty: [&str; 0] = [];
        assert_eq!(render_chain(&empty), "");
    }

    #[test]
    fn shortens_nested_generics_and_tuples() {
        assert_eq!(
            shorten_type_name("core::option::Option<alloc::sync::Arc<app::db::Pool>>"),
            "Option<Arc<Pool>>"
        );
        assert_eq!(shorten_type_name("(alloc::string::String, u8)"), "(String, u8)");
        assert_eq!(shorten_type_name("&[app::Item]"), "&[Item]");
    }

    #[test]
    fn keeps_plain_names() {
        assert_eq!(shorten_type_name("f64"), "f64");
        assert_eq!(shorten_type_name("config.database_url"), "config.database_url");
    }

    #[test]
    fn typo_is_suggested_first() {
        let known = ["UserService", "UserRepository", "Logger", "Database"];

        let suggestions = suggest_similar("UserServise", &known, 3);
        assert_eq!(suggestions.first().map(String::as_str), Some("UserService"));
    }

    #[test]
    fn substring_matches_rank_before_typos() {
        let known = ["maler", "mailers", "mailer.transport", "courier"];

        assert_eq!(suggest_similar("mailer", &known, 3), vec!["mailer.transport", "mailers", "maler"]);
    }

    #[test]
    fn exact_and_unrelated_names_are_skipped() {
        assert!(suggest_similar("Database", &["Database"], 3).is_empty());
        assert!(suggest_similar("XyzAbcDef", &["app::Database"], 3).is_empty());
        assert!(suggest_similar("", &["Database"], 3).is_empty());
    }

    #[test]
    fn edit_distance_basics() {
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("same", "same"), 0);
    }
}
