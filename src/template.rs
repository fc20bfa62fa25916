//! `%%symbol%%` substitution for HTML pages.

use std::collections::HashMap;

const DELIMITER: &str = "%%";

/// Replace every `%%name%%` in `text` with its value from `symbols`.
///
/// Unknown symbols are replaced with nothing. An opening delimiter with no
/// closing one is left as-is.
pub fn render_template(text: &str, symbols: &HashMap<&str, String>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find(DELIMITER) {
        let after_open = &rest[start + DELIMITER.len()..];
        let Some(end) = after_open.find(DELIMITER) else {
            break;
        };

        out.push_str(&rest[..start]);
        let name = &after_open[..end];
        if let Some(value) = symbols.get(name) {
            out.push_str(value);
        }
        rest = &after_open[end + DELIMITER.len()..];
    }

    out.push_str(rest);
    out
}
