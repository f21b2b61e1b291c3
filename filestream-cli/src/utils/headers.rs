use tracing::warn;

/// Split a header string in format "Name: Value".
///
/// Returns `None` and logs a warning when there is no colon or the name is empty.
pub fn parse_header(header_str: &str) -> Option<(&str, &str)> {
    // Find the first colon which separates name and value
    let Some((name, value)) = header_str.split_once(':') else {
        warn!(
            "Invalid header format: '{}'. Expected 'Name: Value'",
            header_str
        );
        return None;
    };

    let name = name.trim();
    if name.is_empty() {
        warn!("Invalid header name in '{}'", header_str);
        return None;
    }

    Some((name, value.trim()))
}
