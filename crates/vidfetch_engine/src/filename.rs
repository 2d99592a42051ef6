use sha2::{Digest, Sha256};

const MAX_NAME_LEN: usize = 120;

/// Picks a safe local file name for a retrieved result.
///
/// Preference order: the server's `Content-Disposition` name, the name the
/// status poll reported, then `download--{short_hash(session_id)}`.
pub fn result_filename(
    content_disposition: Option<&str>,
    reported: Option<&str>,
    session_id: &str,
) -> String {
    content_disposition
        .and_then(disposition_filename)
        .and_then(|name| sanitize(&name))
        .or_else(|| reported.and_then(sanitize))
        .unwrap_or_else(|| format!("download--{}", short_hash(session_id)))
}

/// Extracts `filename="..."` from a `Content-Disposition` header value.
///
/// A quoted value runs to its closing quote, so `;` inside it is kept.
pub(crate) fn disposition_filename(header: &str) -> Option<String> {
    let mut rest = header;
    while let Some(eq) = rest.find('=') {
        let key = rest[..eq].rsplit(';').next().unwrap_or_default().trim();
        let after = rest[eq + 1..].trim_start();
        let (value, next) = match after.strip_prefix('"') {
            Some(quoted) => match quoted.find('"') {
                Some(end) => (&quoted[..end], &quoted[end + 1..]),
                None => (quoted, ""),
            },
            None => match after.find(';') {
                Some(end) => (&after[..end], &after[end..]),
                None => (after, ""),
            },
        };
        let value = value.trim();
        if key.eq_ignore_ascii_case("filename") && !value.is_empty() {
            return Some(value.to_string());
        }
        rest = next;
    }
    None
}

/// Windows-safe name; `None` when nothing usable is left.
fn sanitize(input: &str) -> Option<String> {
    // Never honour directory components sent by the server.
    let base = input.rsplit(['/', '\\']).next().unwrap_or(input);
    let cleaned: String = base
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim_matches(&['_', ' ', '.'][..]);
    if cleaned.is_empty() {
        return None;
    }

    let mut compacted = String::with_capacity(cleaned.len());
    let mut prev_underscore = false;
    for c in cleaned.chars() {
        if c == '_' && prev_underscore {
            continue;
        }
        prev_underscore = c == '_';
        compacted.push(c);
    }
    if compacted.len() > MAX_NAME_LEN {
        let mut end = MAX_NAME_LEN;
        while !compacted.is_char_boundary(end) {
            end -= 1;
        }
        compacted.truncate(end);
    }
    let stem = compacted.split('.').next().unwrap_or(&compacted);
    if is_reserved_windows_name(stem) {
        compacted.insert(stem.len(), '_');
    }
    Some(compacted)
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}

fn short_hash(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    digest.iter().take(4).map(|byte| format!("{byte:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disposition_name_wins() {
        let name = result_filename(
            Some(r#"attachment; filename="My_Clip_1700000000.mp4""#),
            Some("other.mp4"),
            "abc123",
        );
        assert_eq!(name, "My_Clip_1700000000.mp4");
    }

    #[test]
    fn disposition_without_name_falls_back_to_reported() {
        assert_eq!(
            result_filename(Some("attachment"), Some("clip.webm"), "abc123"),
            "clip.webm"
        );
    }

    #[test]
    fn unusable_names_fall_back_to_hash() {
        let name = result_filename(Some(r#"attachment; filename="..""#), None, "abc123");
        assert!(name.starts_with("download--"));
        assert_eq!(name.len(), "download--".len() + 8);
        assert_eq!(name, result_filename(None, None, "abc123"));
    }

    #[test]
    fn path_components_and_reserved_names_are_neutralised() {
        assert_eq!(
            result_filename(None, Some("../../etc/passwd"), "x"),
            "passwd"
        );
        assert_eq!(result_filename(None, Some("a:b?.mp4"), "x"), "a_b_.mp4");
        assert_eq!(result_filename(None, Some("CON.mp4"), "x"), "CON_.mp4");
    }

    #[test]
    fn disposition_parsing_is_case_insensitive() {
        assert_eq!(
            disposition_filename("attachment; FileName=plain.mp3"),
            Some("plain.mp3".to_string())
        );
        assert_eq!(disposition_filename("inline"), None);
    }

    #[test]
    fn quoted_disposition_name_keeps_semicolons() {
        let name = result_filename(
            Some(r#"attachment; filename="Live; Part 2_1700000000.mp4""#),
            Some("fallback.mp4"),
            "abc123",
        );
        assert_eq!(name, "Live; Part 2_1700000000.mp4");
        assert_eq!(
            disposition_filename(r#"attachment; filename="a;b=c.webm"; size=10"#),
            Some("a;b=c.webm".to_string())
        );
        assert_eq!(
            disposition_filename(r#"attachment; name="x;y"; filename=z.mp4"#),
            Some("z.mp4".to_string())
        );
    }
}
