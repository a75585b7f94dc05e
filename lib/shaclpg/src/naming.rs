//! Identifier derivation shared by every stage.
//!
//! Local names are a lossy simplification: two IRIs from different namespaces
//! with the same trailing fragment map to the same identifier.

/// Returns the part of `iri` after its last `#`, else after its last `/`, else the whole string.
///
/// ```
/// use shaclpg::naming::local_name;
///
/// assert_eq!(local_name("http://schema.org/Person"), "Person");
/// assert_eq!(local_name("http://www.w3.org/2001/XMLSchema#string"), "string");
/// assert_eq!(local_name("Person"), "Person");
/// ```
pub fn local_name(iri: &str) -> &str {
    if let Some(position) = iri.rfind('#') {
        &iri[position + 1..]
    } else if let Some(position) = iri.rfind('/') {
        &iri[position + 1..]
    } else {
        iri
    }
}

/// Returns the prefix of `iri` that [`local_name`] strips, separator included.
pub fn namespace_of(iri: &str) -> &str {
    &iri[..iri.len() - local_name(iri).len()]
}

/// Normalizes a relationship name into a property graph relationship type.
///
/// camelCase word boundaries become `_`, letters are upper-cased and every run of
/// non-alphanumeric characters collapses into a single `_`.
///
/// ```
/// use shaclpg::naming::upper_snake_case;
///
/// assert_eq!(upper_snake_case("underName"), "UNDER_NAME");
/// assert_eq!(upper_snake_case("has-part  of"), "HAS_PART_OF");
/// ```
pub fn upper_snake_case(name: &str) -> String {
    normalize_type(name, true)
}

/// Upper-cases a relationship name without splitting camelCase words (`memberOf` becomes `MEMBEROF`).
///
/// Non-alphanumeric runs still collapse into a single `_`.
pub fn flat_upper_case(name: &str) -> String {
    normalize_type(name, false)
}

fn normalize_type(name: &str, split_camel_case: bool) -> String {
    let mut normalized = String::with_capacity(name.len() + 4);
    let mut previous = None::<char>;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if split_camel_case
                && c.is_ascii_uppercase()
                && previous.is_some_and(|p| p.is_ascii_lowercase() || p.is_ascii_digit())
            {
                normalized.push('_');
            }
            normalized.push(c.to_ascii_uppercase());
        } else if !normalized.is_empty() && !normalized.ends_with('_') {
            normalized.push('_');
        }
        previous = Some(c);
    }
    while normalized.ends_with('_') {
        normalized.pop();
    }
    normalized
}

/// Turns a relationship type back into a lowerCamelCase predicate name (`MEMBER_OF` becomes `memberOf`).
///
/// Flat types cannot be split again: `MEMBEROF` becomes `memberof`.
pub fn lower_camel_case(edge_type: &str) -> String {
    let mut name = String::with_capacity(edge_type.len());
    for (i, word) in edge_type.split('_').filter(|w| !w.is_empty()).enumerate() {
        let lower = word.to_ascii_lowercase();
        if i == 0 {
            name.push_str(&lower);
        } else {
            let mut chars = lower.chars();
            if let Some(first) = chars.next() {
                name.push(first.to_ascii_uppercase());
                name.push_str(chars.as_str());
            }
        }
    }
    name
}
