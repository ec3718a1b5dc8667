// Placeholder resolution for card templates.
//
// A placeholder is `{` followed by a canonical decimal index and `}`. The
// template is scanned once, left to right; substituted color names are
// copied verbatim and never rescanned.

use crate::model::Color;

/// Replace every `{i}` with `colors[i].name`. Placeholders whose index is out
/// of range, and any other brace text, are left untouched.
pub fn resolve(template: &str, colors: &[Color]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match parse_placeholder(after) {
            Some((index, consumed)) if index < colors.len() => {
                out.push_str(&colors[index].name);
                rest = &after[consumed..];
            }
            _ => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

/// All placeholder indices in `template`, in order of appearance.
pub fn placeholder_indices(template: &str) -> Vec<usize> {
    let mut indices = Vec::new();
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        match parse_placeholder(after) {
            Some((index, consumed)) => {
                indices.push(index);
                rest = &after[consumed..];
            }
            None => rest = after,
        }
    }
    indices
}

/// Parse `<digits>}` at the start of `s` (the text after an opening brace).
/// Returns the index and the number of bytes consumed, closing brace
/// included.
fn parse_placeholder(s: &str) -> Option<(usize, usize)> {
    let digits = s.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 || s.as_bytes().get(digits) != Some(&b'}') {
        return None;
    }
    // `{01}` is not the same placeholder as `{1}`.
    if digits > 1 && s.starts_with('0') {
        return None;
    }
    let index = s[..digits].parse().ok()?;
    Some((index, digits + 1))
}
