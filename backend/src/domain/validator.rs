//! Name validation for the sign-in form.
//!
//! Pure function; the verdicts here are the contract the sign-in endpoint
//! and its clients rely on, so the rules are applied in a fixed order and
//! short-circuit at the first failure.

/// Validate a raw sign-in name.
///
/// On success returns the whitespace-normalized two-word name with its
/// original capitalization. On failure returns the human-readable reasons
/// shown inline in the form.
pub fn validate_name(raw: &str) -> Result<String, Vec<String>> {
    let trimmed = raw.trim();

    if trimmed.is_empty() {
        return Err(vec!["Please enter your name".to_string()]);
    }

    let words: Vec<&str> = trimmed.split_whitespace().collect();

    if words.len() != 2 {
        return Err(vec![
            "Please enter exactly two names (first and last)".to_string(),
        ]);
    }

    if words.iter().any(|w| w.chars().any(|c| c.is_ascii_digit())) {
        return Err(vec!["Names cannot contain numbers".to_string()]);
    }

    let valid_char = |c: char| c.is_ascii_alphabetic() || c == '-' || c == '\'';
    if words.iter().any(|w| !w.chars().all(valid_char)) {
        return Err(vec![
            "Names can only contain letters, hyphens, and apostrophes".to_string(),
        ]);
    }

    if words.iter().any(|w| w.len() < 2) {
        return Err(vec![
            "Each name must be at least 2 characters long".to_string(),
        ]);
    }

    Ok(words.join(" "))
}
