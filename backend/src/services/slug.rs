//! URL slugs for events and packages.

use crate::db::repository::RepositoryError;

/// Build a slug from a display name.
///
/// Spanish accents fold to their base letter, anything other than ASCII
/// letters, digits, whitespace and `-` is dropped, whitespace runs become a
/// single `-` and repeated dashes collapse.
pub fn slugify(name: &str) -> String {
    let folded: String = name
        .to_lowercase()
        .chars()
        .map(fold_accent)
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace() || *c == '-')
        .collect();

    let mut slug = String::with_capacity(folded.len());
    for c in folded.trim().chars() {
        let c = if c.is_whitespace() { '-' } else { c };
        if c == '-' && slug.ends_with('-') {
            continue;
        }
        slug.push(c);
    }
    slug
}

fn fold_accent(c: char) -> char {
    match c {
        'á' | 'ä' | 'à' | 'â' | 'ã' => 'a',
        'é' | 'ë' | 'è' | 'ê' => 'e',
        'í' | 'ï' | 'ì' | 'î' => 'i',
        'ó' | 'ö' | 'ò' | 'ô' | 'õ' => 'o',
        'ú' | 'ü' | 'ù' | 'û' => 'u',
        'ñ' => 'n',
        other => other,
    }
}

/// Suffix a slug that is already taken with the current unix time in
/// milliseconds.
pub fn disambiguate(slug: &str) -> String {
    format!("{}-{}", slug, chrono::Utc::now().timestamp_millis())
}

/// Slug for a new record: the requested one or one derived from the name,
/// suffixed when already taken.
pub async fn unique_slug<F, Fut>(base: &str, fallback: &str, taken: F) -> Result<String, RepositoryError>
where
    F: FnOnce(String) -> Fut,
    Fut: std::future::Future<Output = Result<bool, RepositoryError>>,
{
    let mut candidate = slugify(base);
    if candidate.is_empty() {
        candidate = fallback.to_string();
    }
    if taken(candidate.clone()).await? {
        Ok(disambiguate(&candidate))
    } else {
        Ok(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_folds_accents() {
        assert_eq!(slugify("Año Nuevo en Cochabamba"), "ano-nuevo-en-cochabamba");
        assert_eq!(slugify("ÉXITO Único"), "exito-unico");
    }

    #[test]
    fn test_slugify_drops_symbols_and_collapses_separators() {
        assert_eq!(slugify("  Summer   Fest!! 2026 "), "summer-fest-2026");
        assert_eq!(slugify("Rock -- Pop"), "rock-pop");
        assert_eq!(slugify("¡¿?!"), "");
    }

    #[test]
    fn test_disambiguate_appends_timestamp() {
        let slug = disambiguate("summer-fest");
        let suffix = slug.strip_prefix("summer-fest-").unwrap();
        assert!(suffix.parse::<i64>().unwrap() > 0);
    }
}
