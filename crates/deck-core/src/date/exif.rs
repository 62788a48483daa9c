use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::NaiveDateTime;
use exif::{In, Reader, Tag, Value};

const EXIF_DATETIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Read DateTimeOriginal from the image's EXIF block.
/// EXIF datetimes have no timezone info - they are local time as-is.
/// Missing or malformed values are treated as absent.
pub fn read_capture_time(path: &Path) -> Option<NaiveDateTime> {
    let file = File::open(path).ok()?;
    let reader = Reader::new()
        .read_from_container(&mut BufReader::new(file))
        .ok()?;

    let field = reader.get_field(Tag::DateTimeOriginal, In::PRIMARY)?;
    match &field.value {
        Value::Ascii(values) => values
            .first()
            .and_then(|raw| std::str::from_utf8(raw).ok())
            .and_then(parse_exif_datetime),
        _ => None,
    }
}

fn parse_exif_datetime(s: &str) -> Option<NaiveDateTime> {
    let trimmed = s.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    NaiveDateTime::parse_from_str(trimmed, EXIF_DATETIME_FORMAT).ok()
}
