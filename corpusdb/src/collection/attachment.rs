use crate::document::AttachmentRef;

/// Find the document key that owns `file_name`.
///
/// A key owns a file when the name starts with the key followed by the
/// boundary marker and a non-empty tag. When several keys qualify, the
/// longest one wins so keys that prefix each other stay unambiguous.
pub fn match_owner<'a, I>(file_name: &str, keys: I, boundary: &str) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    keys.into_iter()
        .filter(|key| {
            file_name
                .strip_prefix(key)
                .and_then(|rest| rest.strip_prefix(boundary))
                .is_some_and(|tail| !split_extension(tail).0.is_empty())
        })
        .max_by_key(|key| key.len())
}

/// Build an attachment reference for a file already matched to `owner_key`
pub fn parse_attachment(file_name: &str, owner_key: &str, boundary: &str, path: String) -> AttachmentRef {
    let tail = &file_name[owner_key.len() + boundary.len()..];
    let (stem, extension) = split_extension(tail);
    let (tag, part) = split_part(stem);
    AttachmentRef {
        owner_key: owner_key.to_string(),
        tag: tag.to_string(),
        part,
        extension,
        path,
    }
}

/// Split `tag-3.txt` style names into the stem and the lowercased `.ext`
fn split_extension(name: &str) -> (&str, String) {
    match name.rfind('.') {
        Some(idx) => (&name[..idx], name[idx..].to_lowercase()),
        None => (name, String::new()),
    }
}

/// A trailing `-<digits>` is the part index
fn split_part(stem: &str) -> (&str, Option<u32>) {
    if let Some((tag, part)) = stem.rsplit_once('-') {
        if !tag.is_empty() && !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(n) = part.parse() {
                return (tag, Some(n));
            }
        }
    }
    (stem, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_longest_prefix_wins() {
        let keys = ["isvaravada", "isvarasiddhi"];
        assert_eq!(
            match_owner("isvaravada_fake-1.txt", keys.iter().copied(), "_"),
            Some("isvaravada")
        );

        let keys = ["nyaya", "nyaya_sutra"];
        assert_eq!(
            match_owner("nyaya_sutra_ver1.txt", keys.iter().copied(), "_"),
            Some("nyaya_sutra")
        );
        assert_eq!(match_owner("nyaya_ver1.txt", keys.iter().copied(), "_"), Some("nyaya"));
    }

    #[test]
    fn test_boundary_is_required() {
        let keys = ["isvara"];
        assert_eq!(match_owner("isvaravada_fake.txt", keys.iter().copied(), "_"), None);
        assert_eq!(match_owner("isvara.txt", keys.iter().copied(), "_"), None);
        assert_eq!(match_owner("isvara_.txt", keys.iter().copied(), "_"), None);
    }

    #[test]
    fn test_parse_attachment_parts() {
        let att = parse_attachment("isvaravada_fake-1.txt", "isvaravada", "_", "p".into());
        assert_eq!(att.tag, "fake");
        assert_eq!(att.part, Some(1));
        assert_eq!(att.extension, ".txt");

        let att = parse_attachment("mybook_ver1.PDF", "mybook", "_", "p".into());
        assert_eq!(att.tag, "ver1");
        assert_eq!(att.part, None);
        assert_eq!(att.extension, ".pdf");

        let att = parse_attachment("mybook_scan-3fa2c.jpg", "mybook", "_", "p".into());
        assert_eq!(att.tag, "scan-3fa2c");
        assert_eq!(att.part, None);

        let att = parse_attachment("mybook_notes", "mybook", "_", "p".into());
        assert_eq!(att.tag, "notes");
        assert_eq!(att.extension, "");
    }
}
