/// Glob-style matching of a single string against a pattern.
///
/// Supported wildcards:
/// * `*` matches any run of characters, including an empty one
/// * `?` matches exactly one character
///
/// Every other character must match literally (case-sensitive). There is no
/// escaping and no character classes; an empty pattern only matches an empty value.
pub fn matches(value: &str, pattern: &str) -> bool {
    let value: Vec<char> = value.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();
    matches_chars(&value, &pattern)
}

fn matches_chars(value: &[char], pattern: &[char]) -> bool {
    match pattern.split_first() {
        None => value.is_empty(),
        Some(('*', rest)) => {
            // Either the star matches nothing, or it swallows one more character
            matches_chars(value, rest) || (!value.is_empty() && matches_chars(&value[1..], pattern))
        }
        Some(('?', rest)) => !value.is_empty() && matches_chars(&value[1..], rest),
        Some((literal, rest)) => match value.split_first() {
            Some((c, value_rest)) if c == literal => matches_chars(value_rest, rest),
            _ => false,
        },
    }
}
