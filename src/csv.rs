//! CSV row codec for review import/export.
//!
//! Parsing: a double quote toggles quoted mode, `""` inside quotes decodes
//! to one literal quote, a comma splits fields only outside quotes, and
//! every field is trimmed after extraction. Writing wraps free-text fields
//! in quotes and doubles any embedded quotes.

/// Split one CSV line into its fields.
///
/// The final field is emitted even without a trailing separator, so an
/// empty line yields a single empty field.
pub fn parse_row(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                if in_quotes && chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = !in_quotes;
                }
            }
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    fields.push(current.trim().to_string());

    fields
}

/// Quote a free-text field for output: wrap in double quotes, double any
/// embedded quotes.
pub fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}
