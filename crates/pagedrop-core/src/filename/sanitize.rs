//! Filename sanitization for the shared downloads area.

/// Longest name accepted by common filesystems (Linux NAME_MAX, in bytes).
const NAME_MAX: usize = 255;

/// Makes a page- or server-supplied name safe to use as a single path component.
///
/// - Replaces NUL, path separators, control characters and the characters
///   rejected by FAT-formatted shared storage (`:*?"<>|`) with `_`
/// - Replaces whitespace runs with a single `_`
/// - Trims leading/trailing dots, spaces and underscores
/// - Limits length to 255 bytes, keeping the extension when possible
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_underscore = false;

    for c in name.chars() {
        let bad = c == '\0'
            || c == '/'
            || c == '\\'
            || c.is_control()
            || c.is_whitespace()
            || matches!(c, ':' | '*' | '?' | '"' | '<' | '>' | '|');
        if bad || c == '_' {
            if !prev_underscore {
                out.push('_');
            }
            prev_underscore = true;
        } else {
            out.push(c);
            prev_underscore = false;
        }
    }

    let trimmed = out.trim_matches(|c| c == '.' || c == '_');
    truncate_keeping_extension(trimmed)
}

fn truncate_keeping_extension(name: &str) -> String {
    if name.len() <= NAME_MAX {
        return name.to_string();
    }
    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && ext.len() <= 16 => (stem, Some(ext)),
        _ => (name, None),
    };
    let budget = NAME_MAX - ext.map(|e| e.len() + 1).unwrap_or(0);
    let mut take = budget.min(stem.len());
    while take > 0 && !stem.is_char_boundary(take) {
        take -= 1;
    }
    match ext {
        Some(ext) => format!("{}.{}", &stem[..take], ext),
        None => stem[..take].to_string(),
    }
}
