//! Storage-safe object names from user-supplied filenames.

use unicode_normalization::UnicodeNormalization;

/// Name used when neither a base nor an extension survives.
pub const FALLBACK_BASE: &str = "file";

/// Turn an arbitrary filename into an object key segment.
///
/// The last extension is split off and kept (case preserved). Accented
/// characters are decomposed and their combining marks dropped; anything
/// still outside `[A-Za-z0-9._-]` becomes `_`. A name without an extension
/// gets no trailing dot.
///
/// The extension goes through the same filter as the base, so `photo.jpé`
/// becomes `photo.jpe`. Object keys stay within `[A-Za-z0-9._-]` end to end.
///
/// The result is never empty and sanitizing it again returns it unchanged.
#[must_use]
pub fn safe_object_name(filename: &str) -> String {
    let (base, ext) = filename.rsplit_once('.').unwrap_or((filename, ""));
    let ext = clean(ext);

    let mut base = clean(base);
    if ext.is_empty() {
        base.truncate(base.trim_end_matches('.').len());
    }
    if base.is_empty() && ext.is_empty() {
        FALLBACK_BASE.clone_into(&mut base);
    }

    if ext.is_empty() { base } else { format!("{base}.{ext}") }
}

fn clean(part: &str) -> String {
    part.nfd()
        .filter(|c| !is_combining_diacritic(*c))
        .map(|c| if is_safe(c) { c } else { '_' })
        .collect()
}

/// Combining Diacritical Marks block, U+0300..=U+036F.
fn is_combining_diacritic(c: char) -> bool {
    ('\u{0300}'..='\u{036f}').contains(&c)
}

fn is_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')
}

#[cfg(test)]
#[path = "sanitize_test.rs"]
mod tests;
