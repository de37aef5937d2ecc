//! Filesystem-safe names for downloaded attachments.

/// Leaves room for a de-duplication suffix and the extension under NAME_MAX.
const TOKEN_MAX: usize = 200;

/// Normalizes an attachment title into a lowercase filename token.
///
/// - Lowercases everything
/// - Replaces whitespace runs, path separators, control and reserved characters with a single `_`
/// - Trims leading/trailing `_` and `.`
///
/// Normalizing an already normalized token returns it unchanged. May return an
/// empty string when the title has nothing usable in it.
pub fn normalize_title(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut prev_sep = false;

    for c in title.chars() {
        let is_sep = c == '_'
            || c.is_whitespace()
            || c.is_control()
            || matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|');

        if is_sep {
            if !prev_sep {
                out.push('_');
            }
            prev_sep = true;
        } else {
            out.extend(c.to_lowercase());
            prev_sep = false;
        }
    }

    // Truncate before trimming so a cut never leaves a trailing separator behind.
    if out.len() > TOKEN_MAX {
        let mut take = TOKEN_MAX;
        while !out.is_char_boundary(take) {
            take -= 1;
        }
        out.truncate(take);
    }

    out.trim_matches(|c| c == '_' || c == '.').to_string()
}

/// Extracts the filename a server advertises in a `Content-Disposition` header.
///
/// `filename*=UTF-8''...` wins over a plain `filename=`.
pub fn content_disposition_filename(header_value: &str) -> Option<String> {
    let mut plain = None;

    for param in header_value.split(';') {
        let Some((name, value)) = param.trim().split_once('=') else {
            continue;
        };
        let value = value.trim();
        match name.trim().to_ascii_lowercase().as_str() {
            "filename*" => {
                let encoded = value
                    .strip_prefix("UTF-8''")
                    .or_else(|| value.strip_prefix("utf-8''"));
                if let Some(decoded) = encoded.and_then(percent_decode) {
                    if !decoded.is_empty() {
                        return Some(decoded);
                    }
                }
            }
            "filename" => {
                let unquoted = value
                    .strip_prefix('"')
                    .and_then(|v| v.strip_suffix('"'))
                    .unwrap_or(value);
                if !unquoted.is_empty() {
                    plain = Some(unquoted.to_string());
                }
            }
            _ => {}
        }
    }

    plain
}

fn percent_decode(input: &str) -> Option<String> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let high = hex_digit(bytes[i + 1])?;
            let low = hex_digit(bytes[i + 2])?;
            out.push(high << 4 | low);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
