//! DOS packed date/time stamps for archive listings

use chrono::{DateTime, Datelike, Local, NaiveDateTime, Timelike};
use std::time::SystemTime;

/// Pack a file time as a DOS date/time in local time
///
/// Layout, high to low bits: year since 1980 (7), month (4), day (5),
/// hour (5), minute (6), seconds / 2 (5). Times outside 1980..=2107 cannot be
/// represented and yield `None`.
pub fn to_dos_datetime(time: SystemTime) -> Option<u32> {
    let local: DateTime<Local> = time.into();
    pack(&local.naive_local())
}

/// Unpack a DOS date/time; `None` if a field is out of range
pub fn from_dos_datetime(packed: u32) -> Option<NaiveDateTime> {
    let year = 1980 + (packed >> 25) as i32;
    let month = (packed >> 21) & 0x0F;
    let day = (packed >> 16) & 0x1F;
    let hour = (packed >> 11) & 0x1F;
    let minute = (packed >> 5) & 0x3F;
    let second = (packed & 0x1F) * 2;

    chrono::NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)
}

fn pack(dt: &NaiveDateTime) -> Option<u32> {
    let year = dt.year();
    if !(1980..=2107).contains(&year) {
        return None;
    }

    Some(
        ((year - 1980) as u32) << 25
            | dt.month() << 21
            | dt.day() << 16
            | dt.hour() << 11
            | dt.minute() << 5
            | dt.second() / 2,
    )
}
