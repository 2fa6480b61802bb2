/// Extract the file name from a `Content-Disposition` header value
///
/// Only the final path component is returned, so a hostile header cannot
/// direct the write outside the destination directory.
pub fn content_disposition_filename(value: &str) -> Option<String> {
    let raw = value.split(';').map(str::trim).find_map(|param| {
        let (key, val) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("filename")
            .then(|| val.trim().trim_matches('"'))
    })?;

    let name = raw.rsplit(['/', '\\']).next()?.trim();
    if name.is_empty() || name == "." || name == ".." {
        return None;
    }
    Some(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoted_filename() {
        assert_eq!(
            content_disposition_filename(r#"attachment; filename="app.tar.gz""#),
            Some("app.tar.gz".to_string())
        );
    }

    #[test]
    fn test_unquoted_filename() {
        assert_eq!(
            content_disposition_filename("attachment; filename=app.zip"),
            Some("app.zip".to_string())
        );
    }

    #[test]
    fn test_path_is_stripped() {
        assert_eq!(
            content_disposition_filename(r#"attachment; filename="../../etc/passwd""#),
            Some("passwd".to_string())
        );
        assert_eq!(
            content_disposition_filename(r#"attachment; filename="..""#),
            None
        );
    }

    #[test]
    fn test_missing_filename() {
        assert_eq!(content_disposition_filename("inline"), None);
        assert_eq!(content_disposition_filename("attachment; filename=\"\""), None);
    }
}
