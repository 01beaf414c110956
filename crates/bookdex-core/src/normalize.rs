//! Canonicalization of ISBNs, titles, authors, and image URLs.
//!
//! Pure functions, no I/O. These functions define cache-key identity: two
//! callers producing byte-identical normalized strings must hit the same
//! cache entry, so any change here invalidates the distributed cache.

use sha2::{Digest, Sha256};

// ============================================================================
// ISBN
// ============================================================================

/// Strip hyphens/whitespace and canonicalize an ISBN.
///
/// Accepts ISBN-13 (`^\d{13}$`) and ISBN-10 (`^\d{9}[\dX]$`, case-insensitive
/// check character, canonicalized to upper-case `X`). Returns `None` for
/// anything else. Idempotent: normalizing a normalized ISBN is a no-op.
#[must_use]
pub fn normalize_isbn(raw: &str) -> Option<String> {
    let compact: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .map(|c| c.to_ascii_uppercase())
        .collect();

    let bytes = compact.as_bytes();
    match bytes.len() {
        13 if bytes.iter().all(u8::is_ascii_digit) => Some(compact),
        10 if bytes[..9].iter().all(u8::is_ascii_digit)
            && (bytes[9].is_ascii_digit() || bytes[9] == b'X') =>
        {
            Some(compact)
        }
        _ => None,
    }
}

/// Hyphen/space-tolerant ISBN validator.
#[must_use]
pub fn is_valid_isbn(raw: &str) -> bool {
    normalize_isbn(raw).is_some()
}

/// Convert a normalized ISBN-10 to its 978-prefixed ISBN-13 equivalent.
///
/// Input must already be in the compact 10-character form.
#[must_use]
pub fn isbn10_to_isbn13(isbn10: &str) -> Option<String> {
    let bytes = isbn10.as_bytes();
    if bytes.len() != 10 || !bytes[..9].iter().all(u8::is_ascii_digit) {
        return None;
    }

    let mut digits: Vec<u32> = Vec::with_capacity(13);
    digits.extend([9, 7, 8]);
    digits.extend(bytes[..9].iter().map(|b| u32::from(b - b'0')));
    digits.push(isbn13_check_digit(&digits));

    Some(digits.iter().map(|d| char::from(b'0' + *d as u8)).collect())
}

/// Convert a 978-prefixed normalized ISBN-13 back to ISBN-10.
///
/// 979-prefixed ISBNs have no ISBN-10 equivalent and return `None`.
#[must_use]
pub fn isbn13_to_isbn10(isbn13: &str) -> Option<String> {
    let bytes = isbn13.as_bytes();
    if bytes.len() != 13 || !isbn13.starts_with("978") || !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }

    let core = &isbn13[3..12];
    let sum: u32 = core
        .bytes()
        .enumerate()
        .map(|(i, b)| (10 - i as u32) * u32::from(b - b'0'))
        .sum();
    let check = (11 - sum % 11) % 11;
    let check_char = if check == 10 { 'X' } else { char::from(b'0' + check as u8) };

    Some(format!("{core}{check_char}"))
}

fn isbn13_check_digit(first_twelve: &[u32]) -> u32 {
    let sum: u32 = first_twelve
        .iter()
        .enumerate()
        .map(|(i, d)| if i % 2 == 0 { *d } else { *d * 3 })
        .sum();
    (10 - sum % 10) % 10
}

// ============================================================================
// Titles and authors
// ============================================================================

/// Canonicalize a title for cache keys and fuzzy matching.
///
/// Trim, lowercase, strip one leading article (`the `, `a `, `an `), drop
/// punctuation (keeping alphanumerics and spaces), collapse internal
/// whitespace.
#[must_use]
pub fn normalize_title(raw: &str) -> String {
    let lower = raw.trim().to_lowercase();

    let without_article = ["the ", "a ", "an "]
        .iter()
        .find_map(|article| lower.strip_prefix(article))
        .unwrap_or(&lower);

    collapse_whitespace(
        &without_article
            .chars()
            .filter(|c| c.is_alphanumeric() || c.is_whitespace())
            .collect::<String>(),
    )
}

/// Canonicalize an author name for cache keys.
///
/// Deliberately light: trim + lowercase. Punctuation is preserved so
/// "O'Brien" and "OBrien" stay distinct at the cache layer; merging uses the
/// stricter [`author_key`].
#[must_use]
pub fn normalize_author(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Deduplication key for authors: lowercase, diacritics stripped, whitespace
/// collapsed, everything outside `[a-z0-9 ]` removed.
#[must_use]
pub fn author_key(name: &str) -> String {
    let folded: String = name.trim().to_lowercase().chars().map(fold_diacritic).collect();
    collapse_whitespace(
        &folded
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == ' ')
            .collect::<String>(),
    )
}

/// Map accented Latin letters onto their ASCII base character.
///
/// Covers Latin-1 Supplement and the Latin Extended letters that appear in
/// practice in author names; anything unhandled passes through and is then
/// filtered by the `[a-z0-9 ]` step.
const fn fold_diacritic(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => 'a',
        'ç' | 'ć' | 'č' | 'ĉ' | 'ċ' => 'c',
        'ď' | 'đ' => 'd',
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ĕ' | 'ė' | 'ę' | 'ě' => 'e',
        'ĝ' | 'ğ' | 'ġ' | 'ģ' => 'g',
        'ĥ' | 'ħ' => 'h',
        'ì' | 'í' | 'î' | 'ï' | 'ĩ' | 'ī' | 'ĭ' | 'į' | 'ı' => 'i',
        'ĵ' => 'j',
        'ķ' => 'k',
        'ĺ' | 'ļ' | 'ľ' | 'ł' => 'l',
        'ñ' | 'ń' | 'ņ' | 'ň' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ŏ' | 'ő' => 'o',
        'ŕ' | 'ř' => 'r',
        'ś' | 'ŝ' | 'ş' | 'š' => 's',
        'ţ' | 'ť' | 'ŧ' => 't',
        'ù' | 'ú' | 'û' | 'ü' | 'ũ' | 'ū' | 'ŭ' | 'ů' | 'ű' | 'ų' => 'u',
        'ŵ' => 'w',
        'ý' | 'ÿ' | 'ŷ' => 'y',
        'ź' | 'ż' | 'ž' => 'z',
        'æ' => 'a',
        'œ' => 'o',
        'ß' => 's',
        _ => c,
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ============================================================================
// URLs and fingerprints
// ============================================================================

/// Canonicalize a cover-image URL: trim, drop the query string, force https.
///
/// Anything that does not look like an http(s) URL is returned unchanged.
#[must_use]
pub fn normalize_image_url(raw: &str) -> String {
    let trimmed = raw.trim();

    let without_query = trimmed.split('?').next().unwrap_or(trimmed);
    if let Some(rest) = without_query.strip_prefix("http://") {
        format!("https://{rest}")
    } else if without_query.starts_with("https://") {
        without_query.to_string()
    } else {
        raw.to_string()
    }
}

/// SHA-256 hex digest, used for content-addressed CSV cache keys.
#[must_use]
pub fn sha256_hex(content: &str) -> String {
    let digest = Sha256::digest(content.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_isbn_accepts_hyphenated_13() {
        assert_eq!(
            normalize_isbn("978-0-439-70818-0").as_deref(),
            Some("9780439708180")
        );
    }

    #[test]
    fn test_normalize_isbn_accepts_isbn10_with_check_x() {
        assert_eq!(normalize_isbn("0-8044-2957-x").as_deref(), Some("080442957X"));
    }

    #[test]
    fn test_normalize_isbn_rejects_garbage() {
        assert_eq!(normalize_isbn(""), None);
        assert_eq!(normalize_isbn("12345"), None);
        assert_eq!(normalize_isbn("978043970818X"), None);
        assert_eq!(normalize_isbn("not-an-isbn"), None);
    }

    #[test]
    fn test_normalize_isbn_idempotent() {
        let once = normalize_isbn("978 0451 524 935").unwrap();
        assert_eq!(normalize_isbn(&once).as_deref(), Some(once.as_str()));
    }

    #[test]
    fn test_isbn10_to_isbn13_known_value() {
        // Nineteen Eighty-Four: 0451524934 <-> 9780451524935
        assert_eq!(isbn10_to_isbn13("0451524934").as_deref(), Some("9780451524935"));
    }

    #[test]
    fn test_isbn13_to_isbn10_round_trip() {
        assert_eq!(isbn13_to_isbn10("9780451524935").as_deref(), Some("0451524934"));
        // 979-prefixed ISBNs have no ISBN-10 form.
        assert_eq!(isbn13_to_isbn10("9791234567896"), None);
    }

    #[test]
    fn test_isbn10_with_x_check_round_trips() {
        let thirteen = isbn10_to_isbn13("080442957X").unwrap();
        assert_eq!(isbn13_to_isbn10(&thirteen).as_deref(), Some("080442957X"));
    }

    #[test]
    fn test_normalize_title_strips_one_article() {
        assert_eq!(normalize_title("The Left Hand of Darkness"), "left hand of darkness");
        // Only the first article is stripped.
        assert_eq!(normalize_title("A The End"), "the end");
    }

    #[test]
    fn test_normalize_title_drops_punctuation_and_collapses() {
        assert_eq!(normalize_title("  Don't   Panic! (42nd ed.)  "), "dont panic 42nd ed");
    }

    #[test]
    fn test_normalize_author_preserves_punctuation() {
        assert_eq!(normalize_author("  Ursula K. Le Guin "), "ursula k. le guin");
    }

    #[test]
    fn test_author_key_strips_diacritics_and_punctuation() {
        assert_eq!(author_key("Gabriel García Márquez"), "gabriel garcia marquez");
        assert_eq!(author_key("  ursula  K.  LE GUIN "), "ursula k le guin");
        assert_eq!(author_key("O'Brien"), "obrien");
    }

    #[test]
    fn test_author_key_equates_accented_variants() {
        assert_eq!(author_key("García Márquez"), author_key("Garcia Marquez"));
    }

    #[test]
    fn test_normalize_image_url() {
        assert_eq!(
            normalize_image_url("http://covers.example.org/b/id/240727-L.jpg?default=false"),
            "https://covers.example.org/b/id/240727-L.jpg"
        );
        assert_eq!(
            normalize_image_url("https://img.example.com/x.png"),
            "https://img.example.com/x.png"
        );
        // Invalid input passes through unchanged.
        assert_eq!(normalize_image_url("not a url"), "not a url");
    }

    #[test]
    fn test_sha256_hex_stable() {
        assert_eq!(
            sha256_hex(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(sha256_hex("title,author"), sha256_hex("title,author"));
        assert_ne!(sha256_hex("a"), sha256_hex("b"));
    }
}
