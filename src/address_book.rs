use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{Error, Result};
use crate::models::LoginRecord;

pub const FIELD_SEPARATOR: char = '|';
pub const FIELD_COUNT: usize = 6;
pub const FILE_FORMAT: &str = "name|host|user|password|port|comment";

/// Load every record of the address book at `path`, in file order.
///
/// The first line is a header and is skipped whatever it contains. A single
/// malformed line fails the whole load.
pub fn load(path: &Path) -> Result<Vec<LoginRecord>> {
    let file = File::open(path).map_err(|e| Error::Config {
        path: path.to_path_buf(),
        reason: format!("open failed: {}", e),
    })?;

    let mut records = Vec::new();
    for (i, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| Error::Config {
            path: path.to_path_buf(),
            reason: format!("read failed at line {}: {}", i + 1, e),
        })?;

        if i == 0 {
            continue;
        }

        let record = parse_line(&line).ok_or_else(|| Error::Config {
            path: path.to_path_buf(),
            reason: format!(
                "parse line {} failed, line({}), format is {}",
                i + 1,
                line,
                FILE_FORMAT
            ),
        })?;
        records.push(record);
    }

    tracing::info!("Loaded {} hosts from {:?}", records.len(), path);
    Ok(records)
}

/// Split one data line into a record; `None` unless it has exactly six fields.
pub fn parse_line(line: &str) -> Option<LoginRecord> {
    let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
    let [name, address, user, password, port, comment] =
        <[&str; FIELD_COUNT]>::try_from(fields).ok()?;
    Some(LoginRecord::new(name, address, user, password, port, comment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn book(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_records_in_file_order() {
        let file = book(
            "name|host|user|password|port|comment\n\
             work|10.0.0.5|alice|s3cr3t|22|prod box\n\
             home|192.168.1.10|bob|hunter2|2222|home lab\n",
        );
        let records = load(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0],
            LoginRecord::new("work", "10.0.0.5", "alice", "s3cr3t", "22", "prod box")
        );
        assert_eq!(
            records[1],
            LoginRecord::new("home", "192.168.1.10", "bob", "hunter2", "2222", "home lab")
        );
    }

    #[test]
    fn first_line_is_skipped_whatever_it_contains() {
        let file = book("a|b|c|d|e|f\nx|h|u|p|22|c\n");
        let records = load(file.path()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "x");

        let file = book("not a header at all\nx|h|u|p|22|c\n");
        assert_eq!(load(file.path()).unwrap().len(), 1);
    }

    #[test]
    fn header_only_file_has_no_records() {
        let file = book("name|host|user|password|port|comment\n");
        assert!(load(file.path()).unwrap().is_empty());
    }

    #[test]
    fn crlf_line_endings_are_accepted() {
        let file = book("name|host|user|password|port|comment\r\nw|h|u|p|22|c\r\n");
        let records = load(file.path()).unwrap();
        assert_eq!(records[0].comment, "c");
    }

    #[test]
    fn empty_fields_are_kept_as_is() {
        let file = book("header\nw|h|u||22|\n");
        let records = load(file.path()).unwrap();
        assert_eq!(records[0].password, "");
        assert_eq!(records[0].comment, "");
    }

    #[test]
    fn wrong_field_count_fails_the_whole_load() {
        for bad in ["w|h|u|p|22", "w|h|u|p|22|c|extra", ""] {
            let file = book(&format!("header\nok|h|u|p|22|c\n{}\nok2|h|u|p|22|c\n", bad));
            match load(file.path()) {
                Err(Error::Config { path, reason }) => {
                    assert_eq!(path, file.path());
                    assert!(reason.contains("line 3"), "{}", reason);
                    assert!(reason.contains(FILE_FORMAT));
                }
                other => panic!("expected config error for {:?}, got {:?}", bad, other),
            }
        }
    }

    #[test]
    fn missing_file_is_a_config_error_naming_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope");
        let err = load(&path).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
        assert!(err.to_string().contains(&path.display().to_string()));
    }

    #[test]
    fn parse_line_requires_exactly_six_fields() {
        assert!(parse_line("a|b|c|d|e|f").is_some());
        assert!(parse_line("a|b|c|d|e").is_none());
        assert!(parse_line("a|b|c|d|e|f|g").is_none());

        let sep = FIELD_SEPARATOR.to_string();
        for count in [FIELD_COUNT - 1, FIELD_COUNT, FIELD_COUNT + 1] {
            let line = vec!["x"; count].join(&sep);
            assert_eq!(parse_line(&line).is_some(), count == FIELD_COUNT, "{}", line);
        }
        assert_eq!(FILE_FORMAT.split(FIELD_SEPARATOR).count(), FIELD_COUNT);
    }
}
