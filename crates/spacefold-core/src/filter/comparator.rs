use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use super::multi::parse_multi_string;

/// Named predicate over `(field value, filter value)`.
#[derive(Debug, Clone, Copy)]
pub struct Comparator {
    pub name: &'static str,
    pub needs_value: bool,
    test: fn(&str, &str) -> bool,
}

impl Comparator {
    const fn new(name: &'static str, needs_value: bool, test: fn(&str, &str) -> bool) -> Self {
        Self {
            name,
            needs_value,
            test,
        }
    }

    #[must_use]
    pub fn test(&self, actual: &str, expected: &str) -> bool {
        (self.test)(actual, expected)
    }
}

static COMPARATORS: [Comparator; 21] = [
    Comparator::new("isNotEmpty", false, is_not_empty),
    Comparator::new("isEmpty", false, is_empty),
    Comparator::new("include", true, include),
    Comparator::new("notInclude", true, not_include),
    Comparator::new("contains", true, contains),
    Comparator::new("notContains", true, not_contains),
    Comparator::new("is", true, is),
    Comparator::new("isNot", true, is_not),
    Comparator::new("equal", true, equal),
    Comparator::new("isGreatThan", true, greater),
    Comparator::new("isLessThan", true, less),
    Comparator::new("isGreatThanOrEqual", true, greater_or_equal),
    Comparator::new("isLessThanOrEqual", true, less_or_equal),
    Comparator::new("dateBefore", true, date_before),
    Comparator::new("dateAfter", true, date_after),
    Comparator::new("isSameDate", true, same_date),
    Comparator::new("isAnyInList", true, any_in_list),
    Comparator::new("isNoneInList", true, none_in_list),
    Comparator::new("isAllInList", true, all_in_list),
    Comparator::new("isTrue", false, is_true),
    Comparator::new("isFalse", false, is_false),
];

#[must_use]
pub fn comparator(name: &str) -> Option<&'static Comparator> {
    COMPARATORS.iter().find(|comparator| comparator.name == name)
}

pub fn comparator_names() -> impl Iterator<Item = &'static str> {
    COMPARATORS.iter().map(|comparator| comparator.name)
}

fn is_not_empty(actual: &str, _: &str) -> bool {
    !actual.trim().is_empty()
}

fn is_empty(actual: &str, _: &str) -> bool {
    actual.trim().is_empty()
}

/// Exact item membership; unlike the text comparators, case matters.
fn include(actual: &str, expected: &str) -> bool {
    let expected = expected.trim();
    parse_multi_string(actual).iter().any(|item| item == expected)
}

fn not_include(actual: &str, expected: &str) -> bool {
    !include(actual, expected)
}

fn contains(actual: &str, expected: &str) -> bool {
    actual
        .to_lowercase()
        .contains(&expected.trim().to_lowercase())
}

fn not_contains(actual: &str, expected: &str) -> bool {
    !contains(actual, expected)
}

fn is(actual: &str, expected: &str) -> bool {
    actual.trim().to_lowercase() == expected.trim().to_lowercase()
}

fn is_not(actual: &str, expected: &str) -> bool {
    !is(actual, expected)
}

fn numbers(actual: &str, expected: &str) -> Option<(f64, f64)> {
    let actual = actual.trim().parse::<f64>().ok()?;
    let expected = expected.trim().parse::<f64>().ok()?;
    Some((actual, expected))
}

fn equal(actual: &str, expected: &str) -> bool {
    numbers(actual, expected).is_some_and(|(a, b)| a == b)
}

fn greater(actual: &str, expected: &str) -> bool {
    numbers(actual, expected).is_some_and(|(a, b)| a > b)
}

fn less(actual: &str, expected: &str) -> bool {
    numbers(actual, expected).is_some_and(|(a, b)| a < b)
}

fn greater_or_equal(actual: &str, expected: &str) -> bool {
    numbers(actual, expected).is_some_and(|(a, b)| a >= b)
}

fn less_or_equal(actual: &str, expected: &str) -> bool {
    numbers(actual, expected).is_some_and(|(a, b)| a <= b)
}

/// Accepts RFC 3339, `YYYY-MM-DD`, `YYYY-MM-DD HH:MM[:SS]` and epoch millis.
pub(crate) fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.naive_utc());
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(parsed);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    raw.parse::<i64>()
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|parsed| parsed.naive_utc())
}

fn dates(actual: &str, expected: &str) -> Option<(NaiveDateTime, NaiveDateTime)> {
    Some((parse_date(actual)?, parse_date(expected)?))
}

fn date_before(actual: &str, expected: &str) -> bool {
    dates(actual, expected).is_some_and(|(a, b)| a < b)
}

fn date_after(actual: &str, expected: &str) -> bool {
    dates(actual, expected).is_some_and(|(a, b)| a > b)
}

fn same_date(actual: &str, expected: &str) -> bool {
    dates(actual, expected).is_some_and(|(a, b)| a.date() == b.date())
}

fn lists(actual: &str, expected: &str) -> (Vec<String>, Vec<String>) {
    let lower = |items: Vec<String>| {
        items
            .into_iter()
            .map(|item| item.to_lowercase())
            .collect::<Vec<_>>()
    };
    (
        lower(parse_multi_string(actual)),
        lower(parse_multi_string(expected)),
    )
}

fn any_in_list(actual: &str, expected: &str) -> bool {
    let (have, wanted) = lists(actual, expected);
    wanted.iter().any(|item| have.contains(item))
}

fn none_in_list(actual: &str, expected: &str) -> bool {
    let (have, wanted) = lists(actual, expected);
    !wanted.iter().any(|item| have.contains(item))
}

fn all_in_list(actual: &str, expected: &str) -> bool {
    let (have, wanted) = lists(actual, expected);
    !wanted.is_empty() && wanted.iter().all(|item| have.contains(item))
}

fn is_true(actual: &str, _: &str) -> bool {
    actual.trim().eq_ignore_ascii_case("true")
}

fn is_false(actual: &str, _: &str) -> bool {
    !is_true(actual, "")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(name: &str, actual: &str, expected: &str) -> bool {
        comparator(name)
            .unwrap_or_else(|| panic!("missing comparator {name}"))
            .test(actual, expected)
    }

    #[test]
    fn registry_lookup() {
        assert!(comparator("include").is_some_and(|c| c.needs_value));
        assert!(comparator("isEmpty").is_some_and(|c| !c.needs_value));
        assert!(comparator("isFalse").is_some());
        assert!(comparator("nope").is_none());
        assert_eq!(comparator_names().count(), 21);
    }

    #[test]
    fn include_matches_whole_items() {
        assert!(check("include", "#done,#later", "#done"));
        assert!(!check("include", "#Done", "#done"));
        assert!(check("notInclude", "#DONE", "#done"));
        assert!(!check("include", "#done-later", "#done"));
        assert!(check("notInclude", "#todo", "#done"));
    }

    #[test]
    fn contains_is_substring() {
        assert!(check("contains", "Quarterly Review", "review"));
        assert!(!check("notContains", "Quarterly Review", "review"));
    }

    #[test]
    fn numeric_comparators_reject_text() {
        assert!(check("isGreatThan", "10", "9.5"));
        assert!(check("isLessThanOrEqual", "3", "3"));
        assert!(check("equal", "2.0", "2"));
        assert!(!check("isGreatThan", "ten", "9"));
    }

    #[test]
    fn date_comparators_accept_mixed_formats() {
        assert!(check("dateBefore", "2024-01-01", "2024-02-01T10:00:00Z"));
        assert!(check("dateAfter", "2024-03-05 08:30", "2024-03-05"));
        assert!(check("isSameDate", "2024-03-05T23:00", "2024-03-05"));
        assert!(check("isSameDate", "1709596800000", "2024-03-05"));
        assert!(!check("dateBefore", "soon", "2024-01-01"));
    }

    #[test]
    fn list_comparators() {
        assert!(check("isAnyInList", "a,b", "c,b"));
        assert!(check("isNoneInList", "a,b", "c,d"));
        assert!(check("isAllInList", "a,b,c", "a,c"));
        assert!(!check("isAllInList", "a,b", "a,z"));
    }

    #[test]
    fn boolean_comparators() {
        assert!(check("isTrue", "true", ""));
        assert!(check("isFalse", "false", ""));
        assert!(check("isFalse", "", ""));
        assert!(!check("isTrue", "yes", ""));
    }
}
