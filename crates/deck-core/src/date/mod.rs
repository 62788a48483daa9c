pub mod exif;

use std::fs::Metadata;

use chrono::{DateTime, Local, NaiveDateTime};
use filetime::FileTime;

use crate::record::TimestampSource;

/// Resolved capture time and where it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateResult {
    pub date: NaiveDateTime,
    pub source: TimestampSource,
}

/// Pick the capture time in priority order. Always yields a timestamp.
pub fn resolve_timestamp(exif: Option<NaiveDateTime>, modified: Option<NaiveDateTime>) -> DateResult {
    // 1. EXIF DateTimeOriginal
    if let Some(date) = exif {
        return DateResult { date, source: TimestampSource::Exif };
    }

    // 2. File modification time, epoch if the filesystem reports nonsense
    DateResult {
        date: modified.unwrap_or_default(),
        source: TimestampSource::FileModified,
    }
}

/// File modification time as local wall clock, matching how EXIF stores capture time.
pub fn file_modified(meta: &Metadata) -> Option<NaiveDateTime> {
    let ft = FileTime::from_last_modification_time(meta);
    DateTime::from_timestamp(ft.unix_seconds(), ft.nanoseconds())
        .map(|utc| utc.with_timezone(&Local).naive_local())
}
