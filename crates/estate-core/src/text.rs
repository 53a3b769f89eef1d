//! Text helpers shared by the classifier and the responders.

/// Trim a reply and upper-case its first alphabetic character.
///
/// Leading emoji and punctuation are left alone, so `"🙂 привет"` becomes
/// `"🙂 Привет"`. Applying the function twice gives the same result as once.
pub fn normalize_response(text: &str) -> String {
    let trimmed = text.trim();
    let mut out = String::with_capacity(trimmed.len());
    let mut done = false;
    for c in trimmed.chars() {
        if !done && c.is_alphabetic() {
            out.extend(c.to_uppercase());
            done = true;
        } else {
            out.push(c);
        }
    }
    out
}

/// Lower-case and trim user input for matching.
pub fn normalize_input(text: &str) -> String {
    text.trim().to_lowercase()
}
