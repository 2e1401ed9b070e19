use jiff::civil::DateTime;
use jiff::tz::TimeZone;

use super::error::{DecodeError, DecodeResult};

/// Year the packed calendar counts up from.
pub const CALENDAR_BASE_YEAR: i16 = 2000;

const DAYS_PER_YEAR: u32 = 372;
const DAYS_PER_MONTH: u32 = 31;
const TIME_FIELD_BASE: u32 = 100_000;

/// The tracker's compressed encoding of a calendar instant.
///
/// Device firmware packs date and time into one u32 using a calendar where
/// every month has 31 days and every year has 12 such months (372 day-units
/// per year), offset from 2000. Months shorter than 31 days therefore drift
/// relative to the real calendar; the drift is part of the wire contract and
/// must not be corrected here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PackedTimestamp(pub u32);

/// Calendar fields carried by a [`PackedTimestamp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeParts {
    /// Gregorian year, base offset already applied.
    pub year: i16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl PackedTimestamp {
    /// Splits the packed value into its calendar fields.
    pub fn parts(self) -> TimeParts {
        let mut date = self.0 / TIME_FIELD_BASE;
        let mut time = self.0 - date * TIME_FIELD_BASE;

        let year = date / DAYS_PER_YEAR;
        date -= year * DAYS_PER_YEAR;
        let month = date / DAYS_PER_MONTH;
        let day = date - month * DAYS_PER_MONTH;

        let hour = time / 3600;
        time -= hour * 3600;
        let minute = time / 60;
        let second = time - minute * 60;

        TimeParts {
            year: CALENDAR_BASE_YEAR + year as i16,
            month: month as u8,
            day: day as u8,
            hour: hour as u8,
            minute: minute as u8,
            second: second as u8,
        }
    }

    /// Packs calendar fields into the wire encoding. Inverse of [`parts`].
    ///
    /// [`parts`]: PackedTimestamp::parts
    pub fn from_parts(parts: TimeParts) -> Self {
        let year = (parts.year - CALENDAR_BASE_YEAR) as u32;
        let date =
            year * DAYS_PER_YEAR + u32::from(parts.month) * DAYS_PER_MONTH + u32::from(parts.day);
        let time =
            u32::from(parts.hour) * 3600 + u32::from(parts.minute) * 60 + u32::from(parts.second);

        Self(date * TIME_FIELD_BASE + time)
    }

    /// Converts the packed value to epoch seconds (UTC).
    ///
    /// The decoded fields are taken as literal Gregorian calendar values;
    /// combinations that do not form a valid date or time (month or day
    /// index 0, hour past 23, a day February does not have) fail with
    /// [`DecodeError::TimestampOutOfRange`].
    pub fn to_epoch_seconds(self) -> DecodeResult<i64> {
        let parts = self.parts();

        let datetime = DateTime::new(
            parts.year,
            parts.month as i8,
            parts.day as i8,
            parts.hour as i8,
            parts.minute as i8,
            parts.second as i8,
            0,
        )
        .map_err(|_| DecodeError::TimestampOutOfRange { packed: self.0 })?;

        let timestamp = TimeZone::UTC
            .to_timestamp(datetime)
            .map_err(|_| DecodeError::TimestampOutOfRange { packed: self.0 })?;

        Ok(timestamp.as_second())
    }
}
