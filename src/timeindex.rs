//! Locating a time window inside a file of time-ordered records.
//!
//! Records have a fixed size and non-decreasing times. [`find_range`] does
//! two binary searches, one for the first record at or after the window
//! start and one, starting from there, for the last record at or before the
//! window end. Only `O(log n)` records are read.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use tracing::debug;

use crate::error::SearchError;
use crate::time::OrderedTime;

/// Inclusive time window; `None` leaves that side unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: Option<OrderedTime>,
    pub end: Option<OrderedTime>,
}

impl TimeWindow {
    pub fn new(start: Option<OrderedTime>, end: Option<OrderedTime>) -> Self {
        TimeWindow { start, end }
    }

    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn contains(&self, time: OrderedTime) -> bool {
        self.start.map_or(true, |s| s <= time) && self.end.map_or(true, |e| time <= e)
    }
}

/// The records of a file that fall inside a [`TimeWindow`].
///
/// Both offsets are inclusive: `last_offset` is the start of the last
/// record in the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordRange {
    pub first_offset: u64,
    pub last_offset: u64,
    pub first_time: OrderedTime,
    pub last_time: OrderedTime,
}

impl RecordRange {
    /// Number of records in the range.
    pub fn record_count(&self, record_size: u64) -> u64 {
        (self.last_offset - self.first_offset) / record_size + 1
    }
}

/// Random access to the time of the record starting at a byte offset.
pub trait RecordTimes {
    fn time_at(&mut self, offset: u64) -> Result<OrderedTime, SearchError>;
}

impl<F> RecordTimes for F
where
    F: FnMut(u64) -> Result<OrderedTime, SearchError>,
{
    fn time_at(&mut self, offset: u64) -> Result<OrderedTime, SearchError> {
        self(offset)
    }
}

/// Find the records in `[first_offset, last_offset)` whose times fall in
/// `window`.
///
/// `Ok(None)` means the window and the records don't intersect.
pub fn find_range<T: RecordTimes + ?Sized>(
    reader: &mut T,
    first_offset: u64,
    last_offset: u64,
    record_size: u64,
    window: TimeWindow,
) -> Result<Option<RecordRange>, SearchError> {
    if record_size == 0 {
        return Err(SearchError::ZeroRecordSize);
    }
    if let (Some(start), Some(end)) = (window.start, window.end) {
        if start > end {
            return Ok(None);
        }
    }
    let count = last_offset.saturating_sub(first_offset) / record_size;
    if count == 0 {
        return Ok(None);
    }

    let offset_of = |index: u64| first_offset + index * record_size;

    let Some((first, first_time)) = search_start(reader, offset_of, count, window.start)? else {
        debug!("window starts after the last record");
        return Ok(None);
    };
    let Some((last, last_time)) = search_end(reader, offset_of, first, count, window.end)? else {
        debug!("window ends before the first record");
        return Ok(None);
    };

    Ok(Some(RecordRange {
        first_offset: offset_of(first),
        last_offset: offset_of(last),
        first_time,
        last_time,
    }))
}

/// Earliest index with time `>= start`.
fn search_start<T, O>(
    reader: &mut T,
    offset_of: O,
    count: u64,
    start: Option<OrderedTime>,
) -> Result<Option<(u64, OrderedTime)>, SearchError>
where
    T: RecordTimes + ?Sized,
    O: Fn(u64) -> u64,
{
    let first_time = reader.time_at(offset_of(0))?;
    let Some(start) = start else {
        return Ok(Some((0, first_time)));
    };
    if first_time >= start {
        return Ok(Some((0, first_time)));
    }
    let last_time = reader.time_at(offset_of(count - 1))?;
    if last_time < start {
        return Ok(None);
    }

    // time(low) < start <= time(high)
    let (mut low, mut high) = (0, count - 1);
    let mut high_time = last_time;
    loop {
        let mid = (low + high) / 2;
        if mid == low {
            break;
        }
        let time = reader.time_at(offset_of(mid))?;
        if time >= start {
            high = mid;
            high_time = time;
        } else {
            low = mid;
        }
    }
    Ok(Some((high, high_time)))
}

/// Latest index in `[from, count)` with time `<= end`.
fn search_end<T, O>(
    reader: &mut T,
    offset_of: O,
    from: u64,
    count: u64,
    end: Option<OrderedTime>,
) -> Result<Option<(u64, OrderedTime)>, SearchError>
where
    T: RecordTimes + ?Sized,
    O: Fn(u64) -> u64,
{
    let last_time = reader.time_at(offset_of(count - 1))?;
    let Some(end) = end else {
        return Ok(Some((count - 1, last_time)));
    };
    if last_time <= end {
        return Ok(Some((count - 1, last_time)));
    }
    let from_time = reader.time_at(offset_of(from))?;
    if from_time > end {
        return Ok(None);
    }

    // time(low) <= end < time(high)
    let (mut low, mut high) = (from, count - 1);
    let mut low_time = from_time;
    loop {
        let mid = low + (high - low) / 2;
        if mid == low {
            break;
        }
        let time = reader.time_at(offset_of(mid))?;
        if time > end {
            high = mid;
        } else {
            low = mid;
            low_time = time;
        }
    }
    Ok(Some((low, low_time)))
}

/// [`RecordTimes`] over a seekable reader, decoding each record's time with
/// `time_of`.
pub struct FileRecordTimes<R, F> {
    reader: R,
    buf: Vec<u8>,
    time_of: F,
}

impl<R, F> FileRecordTimes<R, F>
where
    R: Read + Seek,
    F: Fn(&[u8]) -> Option<OrderedTime>,
{
    pub fn new(reader: R, record_size: usize, time_of: F) -> Self {
        FileRecordTimes {
            reader,
            buf: vec![0; record_size],
            time_of,
        }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R, F> RecordTimes for FileRecordTimes<R, F>
where
    R: Read + Seek,
    F: Fn(&[u8]) -> Option<OrderedTime>,
{
    fn time_at(&mut self, offset: u64) -> Result<OrderedTime, SearchError> {
        self.reader
            .seek(SeekFrom::Start(offset))
            .map_err(|source| SearchError::Seek { offset, source })?;
        self.reader
            .read_exact(&mut self.buf)
            .map_err(|source| SearchError::Read { offset, source })?;
        (self.time_of)(&self.buf).ok_or(SearchError::Extract { offset })
    }
}

/// Search a record file laid out as a `header_size` byte header followed by
/// `record_size` byte records. A trailing partial record is ignored.
pub fn search_file<F>(
    path: &Path,
    header_size: u64,
    record_size: usize,
    time_of: F,
    window: TimeWindow,
) -> Result<Option<RecordRange>, SearchError>
where
    F: Fn(&[u8]) -> Option<OrderedTime>,
{
    if record_size == 0 {
        return Err(SearchError::ZeroRecordSize);
    }
    let open_err = |source| SearchError::Open {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(open_err)?;
    let len = file.metadata().map_err(open_err)?.len();
    let record_size_u64 = record_size as u64;
    let body = len.saturating_sub(header_size);
    let last_offset = header_size + body / record_size_u64 * record_size_u64;
    debug!(
        "Searching {} ({} records) for {:?}",
        path.display(),
        body / record_size_u64,
        window
    );

    let mut times = FileRecordTimes::new(file, record_size, time_of);
    find_range(&mut times, header_size, last_offset, record_size_u64, window)
}
