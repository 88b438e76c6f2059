/*!
 * Topic names, topic filters and matching between them.
 *
 * Ref: 4.7 Topic Names and Topic Filters
 */

/// Why a topic name or filter was rejected.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InvalidTopic {
    Empty,
    ContainsNul,
    WildcardInName,
    MisplacedWildcard,
}

impl std::fmt::Display for InvalidTopic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidTopic::Empty => f.write_str("empty topic"),
            InvalidTopic::ContainsNul => f.write_str("topic containing a NUL character"),
            InvalidTopic::WildcardInName => f.write_str("wildcard character in topic name"),
            InvalidTopic::MisplacedWildcard => {
                f.write_str("wildcard that does not occupy a whole topic level")
            }
        }
    }
}

impl std::error::Error for InvalidTopic {}

/// Checks that `topic_name` can be published to.
///
/// Ref: 4.7.3 Topic semantic and usage
pub fn validate_topic_name(topic_name: &str) -> Result<(), InvalidTopic> {
    if topic_name.is_empty() {
        return Err(InvalidTopic::Empty);
    }

    if topic_name.contains('\0') {
        return Err(InvalidTopic::ContainsNul);
    }

    if topic_name.contains(['+', '#']) {
        return Err(InvalidTopic::WildcardInName);
    }

    Ok(())
}

/// Checks that `topic_filter` can be subscribed to.
///
/// `+` must occupy a whole level. `#` must occupy a whole level and be the last one.
///
/// Ref: 4.7.1 Topic wildcards
pub fn validate_topic_filter(topic_filter: &str) -> Result<(), InvalidTopic> {
    if topic_filter.is_empty() {
        return Err(InvalidTopic::Empty);
    }

    if topic_filter.contains('\0') {
        return Err(InvalidTopic::ContainsNul);
    }

    let mut levels = topic_filter.split('/').peekable();
    while let Some(level) = levels.next() {
        match level {
            "+" => (),
            "#" if levels.peek().is_none() => (),
            level if level.contains(['+', '#']) => return Err(InvalidTopic::MisplacedWildcard),
            "#" => return Err(InvalidTopic::MisplacedWildcard),
            _ => (),
        }
    }

    Ok(())
}

/// Whether a publication on `topic_name` is delivered to a subscription with `topic_filter`.
///
/// Both arguments are assumed to be valid. Filters that start with a wildcard never match topic names starting with `$`.
///
/// Ref: 4.7.2 Topics beginning with $
pub fn topic_matches(topic_filter: &str, topic_name: &str) -> bool {
    if topic_name.starts_with('$') && topic_filter.starts_with(['+', '#']) {
        return false;
    }

    let mut filter_levels = topic_filter.split('/');
    let mut name_levels = topic_name.split('/');

    loop {
        match (filter_levels.next(), name_levels.next()) {
            (Some("#"), _) => return true,
            (Some("+"), Some(_)) => (),
            (Some(filter_level), Some(name_level)) if filter_level == name_level => (),
            (None, None) => return true,
            _ => return false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{topic_matches, validate_topic_filter, validate_topic_name, InvalidTopic};

    #[test]
    fn topic_names() {
        assert_eq!(validate_topic_name("a/b/c"), Ok(()));
        assert_eq!(validate_topic_name("/"), Ok(()));
        assert_eq!(validate_topic_name("$SYS/uptime"), Ok(()));

        assert_eq!(validate_topic_name(""), Err(InvalidTopic::Empty));
        assert_eq!(validate_topic_name("a\0b"), Err(InvalidTopic::ContainsNul));
        assert_eq!(validate_topic_name("a/+/c"), Err(InvalidTopic::WildcardInName));
        assert_eq!(validate_topic_name("a/#"), Err(InvalidTopic::WildcardInName));
    }

    #[test]
    fn topic_filters() {
        for filter in &["#", "+", "a/#", "a/+/c", "+/+", "/+", "a//b", "sport/tennis/+"] {
            assert_eq!(validate_topic_filter(filter), Ok(()), "{}", filter);
        }

        assert_eq!(validate_topic_filter(""), Err(InvalidTopic::Empty));
        for filter in &["a/#/c", "#/a", "a#", "a/b+", "+a/b", "a/##"] {
            assert_eq!(
                validate_topic_filter(filter),
                Err(InvalidTopic::MisplacedWildcard),
                "{}",
                filter
            );
        }
    }

    #[test]
    fn exact_and_single_level_matches() {
        assert!(topic_matches("a/b", "a/b"));
        assert!(!topic_matches("a/b", "a/b/c"));
        assert!(!topic_matches("a/b/c", "a/b"));

        assert!(topic_matches("sport/tennis/+", "sport/tennis/player1"));
        assert!(!topic_matches("sport/tennis/+", "sport/tennis/player1/ranking"));
        assert!(topic_matches("sport/+", "sport/"));
        assert!(!topic_matches("sport/+", "sport"));
        assert!(topic_matches("+/+", "/finance"));
        assert!(topic_matches("/+", "/finance"));
        assert!(!topic_matches("+", "/finance"));
    }

    #[test]
    fn multi_level_matches() {
        assert!(topic_matches("#", "a"));
        assert!(topic_matches("#", "a/b/c"));
        assert!(topic_matches("sport/#", "sport"));
        assert!(topic_matches("sport/#", "sport/tennis/player1"));
        assert!(!topic_matches("sport/#", "sports"));
        assert!(topic_matches("a/+/#", "a/b"));
    }

    #[test]
    fn dollar_topics() {
        assert!(!topic_matches("#", "$SYS/uptime"));
        assert!(!topic_matches("+/uptime", "$SYS/uptime"));
        assert!(topic_matches("$SYS/#", "$SYS/uptime"));
        assert!(topic_matches("$SYS/+", "$SYS/uptime"));
    }
}
