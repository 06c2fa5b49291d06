/// Extract Module
///
/// Turns the raw bytes of a dropped file into ordered records.
///
/// Splitting is purely positional: there is no quoting or escaping support,
/// so a value containing the delimiter or a line break shifts every field
/// after it. Malformed input never fails here; bad rows surface at load time.
use crate::models::Record;

pub const FIELD_DELIMITER: char = ',';

/// Parse file content into records, one per non-blank data line
///
/// Returns an empty vector when there is no header plus at least one data line.
pub fn parse_csv(content: &[u8]) -> Vec<Record> {
    let text = String::from_utf8_lossy(content);
    let mut lines = text.split('\n').filter(|line| !line.trim().is_empty());

    let Some(header_line) = lines.next() else {
        return Vec::new();
    };
    let headers: Vec<String> = split_line(header_line).map(str::to_string).collect();

    let records: Vec<Record> = lines
        .map(|line| headers.iter().cloned().zip(split_line(line).map(str::to_string)).collect())
        .collect();

    tracing::debug!("Parsed {} data lines against {} header fields", records.len(), headers.len());
    records
}

fn split_line(line: &str) -> impl Iterator<Item = &str> {
    line.split(FIELD_DELIMITER).map(clean_token)
}

/// Trim whitespace, then drop one leading and one trailing quote
fn clean_token(token: &str) -> &str {
    let token = token.trim();
    let token = token.strip_prefix('"').unwrap_or(token);
    token.strip_suffix('"').unwrap_or(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "id,name,email,age,city,salary\n\
        1,Ada Lovelace,ada@example.com,36,London,72000.50\n\
        2,Alan Turing,alan@example.com,41,Manchester,68000\n\
        3,Grace Hopper,grace@example.com,85,New York,91000.25\n";

    #[test]
    fn test_parse_csv() {
        let records = parse_csv(SAMPLE.as_bytes());

        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.len() == 6));
        assert_eq!(records[0].get("name"), Some("Ada Lovelace"));
        assert_eq!(records[1].get("city"), Some("Manchester"));
        assert_eq!(records[2].get("salary"), Some("91000.25"));
    }

    #[test]
    fn test_preserves_line_order() {
        let content: String = std::iter::once("id,name".to_string())
            .chain((1..=50).map(|i| format!("{},user{}", i, i)))
            .collect::<Vec<_>>()
            .join("\n");

        let ids: Vec<String> =
            parse_csv(content.as_bytes()).iter().map(|r| r.get("id").unwrap_or_default().to_string()).collect();
        let expected: Vec<String> = (1..=50).map(|i| i.to_string()).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_header_only_is_empty() {
        assert!(parse_csv(b"id,name,email,age,city,salary\n").is_empty());
        assert!(parse_csv(b"").is_empty());
        assert!(parse_csv(b"\n   \n\n").is_empty());
    }

    #[test]
    fn test_blank_lines_and_crlf_are_skipped() {
        let records = parse_csv(b"\r\nid,name\r\n\r\n1,Ada\r\n   \r\n2,Alan\r\n");

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("name"), Some("Ada"));
        assert_eq!(records[1].get("id"), Some("2"));
    }

    #[test]
    fn test_enclosing_quotes_are_stripped() {
        let records = parse_csv(b"\"id\",\"name\"\n\"7\",\"Ada\"\n");

        assert_eq!(records[0].get("id"), Some("7"));
        assert_eq!(records[0].get("name"), Some("Ada"));
    }

    #[test]
    fn test_short_line_leaves_fields_absent() {
        let records = parse_csv(b"id,name,email\n1,Ada\n");

        assert_eq!(records[0].len(), 2);
        assert_eq!(records[0].get("email"), None);
    }

    #[test]
    fn test_embedded_delimiter_misaligns_fields() {
        let records = parse_csv(b"id,name,city\n1,\"Lovelace, Ada\",London\n");

        // No quote awareness: the quoted comma splits the value.
        assert_eq!(records[0].get("name"), Some("Lovelace"));
        assert_eq!(records[0].get("city"), Some("Ada"));
    }
}
