use crate::error::Error;

/// Normalize a raw user-supplied name into its canonical display form.
///
/// Surrounding whitespace is trimmed, internal whitespace runs collapse to
/// a single space, and each word is title-cased. The normalized form is
/// also the dedup key for the roster, so "john  doe" and "John Doe"
/// normalize to the same string.
///
/// Rejects names that are empty after trimming, and names containing
/// anything other than letters and spaces.
pub fn normalize(raw: &str) -> Result<String, Error> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::EmptyName);
    }

    if trimmed
        .chars()
        .any(|c| !c.is_alphabetic() && !c.is_whitespace())
    {
        return Err(Error::InvalidName(trimmed.to_owned()));
    }

    Ok(trimmed
        .split_whitespace()
        .map(title_case)
        .collect::<Vec<String>>()
        .join(" "))
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::normalize;
    use crate::error::Error;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("john").unwrap(), "John");
        assert_eq!(normalize("  jOhN   dOE ").unwrap(), "John Doe");
        assert_eq!(normalize("MARY ANNE").unwrap(), "Mary Anne");
        assert_eq!(normalize("único").unwrap(), "Único");
    }

    #[test]
    fn test_normalized_forms_collide() {
        assert_eq!(
            normalize("john doe").unwrap(),
            normalize("John  Doe").unwrap()
        );
    }

    #[test]
    fn test_rejections() {
        assert!(matches!(normalize(""), Err(Error::EmptyName)));
        assert!(matches!(normalize("   "), Err(Error::EmptyName)));
        assert!(matches!(normalize("John123"), Err(Error::InvalidName(_))));
        assert!(matches!(normalize("John_Doe"), Err(Error::InvalidName(_))));
        assert!(matches!(normalize(".add"), Err(Error::InvalidName(_))));
    }
}
