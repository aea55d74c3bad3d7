//! Drive query expressions and field masks.

/// Field mask for image discovery pages.
pub const IMAGE_LIST_FIELDS: &str =
    "nextPageToken, files(id, name, thumbnailLink, imageMediaMetadata(location))";

/// Field mask for the thumbnail link lookup.
pub const THUMBNAIL_LINK_FIELDS: &str = "thumbnailLink";

/// Escape a value for use inside a single-quoted Drive query literal.
///
/// Backslashes are escaped first so the escapes added for quotes survive.
pub fn escape_query_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Query matching non-trashed image files directly inside `folder_id`.
pub fn images_in_folder_query(folder_id: &str) -> String {
    format!(
        "'{}' in parents and mimeType contains 'image/' and trashed=false",
        escape_query_value(folder_id)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_plain_value_unchanged() {
        assert_eq!(escape_query_value("1AbC-xyz_09"), "1AbC-xyz_09");
    }

    #[test]
    fn test_escape_quote() {
        assert_eq!(escape_query_value("Tom's trip"), r"Tom\'s trip");
    }

    #[test]
    fn test_escape_backslash_before_quote() {
        assert_eq!(escape_query_value(r"a\'b"), r"a\\\'b");
        assert_eq!(escape_query_value(r"C:\photos"), r"C:\\photos");
    }

    #[test]
    fn test_images_in_folder_query() {
        assert_eq!(
            images_in_folder_query("folder123"),
            "'folder123' in parents and mimeType contains 'image/' and trashed=false"
        );
    }

    #[test]
    fn test_images_query_escapes_folder_id() {
        let query = images_in_folder_query("x' or 'a'='a");
        assert!(query.starts_with(r"'x\' or \'a\'=\'a' in parents"));
    }
}
