//! FAT directory-entry timestamps.
//!
//! FAT stores creation time as a packed date word, a packed time word with
//! two-second resolution, and a 10 ms refinement byte carrying the odd
//! second.

/// Seconds from the Unix epoch to 1980-01-01T00:00:00Z.
const FAT_EPOCH_UNIX: u32 = 315_532_800;

const SECS_PER_DAY: u32 = 86_400;

/// A packed FAT timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FatDateTime {
    /// `((year - 1980) << 9) | (month << 5) | day`
    pub date: u16,
    /// `(hour << 11) | (minute << 5) | (second / 2)`
    pub time: u16,
    /// Hundredths of a second beyond `time`: 100 on odd seconds, else 0.
    pub ms10: u8,
}

impl FatDateTime {
    /// 1980-01-01 00:00:00, the earliest representable instant.
    pub const EPOCH: Self = FatDateTime {
        date: (1 << 5) | 1,
        time: 0,
        ms10: 0,
    };

    /// Pack a UTC Unix timestamp. Instants before 1980 clamp to [`EPOCH`](Self::EPOCH).
    pub fn from_unix(secs: u32) -> Self {
        if secs < FAT_EPOCH_UNIX {
            return Self::EPOCH;
        }

        let (year, month, day) = civil_from_days(secs / SECS_PER_DAY);
        let rem = secs % SECS_PER_DAY;
        let hour = rem / 3600;
        let minute = rem / 60 % 60;
        let second = rem % 60;

        FatDateTime {
            date: (((year - 1980) << 9) | (month << 5) | day) as u16,
            time: ((hour << 11) | (minute << 5) | (second >> 1)) as u16,
            ms10: if second & 1 == 1 { 100 } else { 0 },
        }
    }

    pub fn year(&self) -> u16 {
        1980 + (self.date >> 9)
    }

    pub fn month(&self) -> u8 {
        ((self.date >> 5) & 0x0F) as u8
    }

    pub fn day(&self) -> u8 {
        (self.date & 0x1F) as u8
    }

    pub fn hour(&self) -> u8 {
        (self.time >> 11) as u8
    }

    pub fn minute(&self) -> u8 {
        ((self.time >> 5) & 0x3F) as u8
    }

    /// Full second, including the odd second carried by `ms10`.
    pub fn second(&self) -> u8 {
        ((self.time & 0x1F) * 2) as u8 + self.ms10 / 100
    }
}

impl Default for FatDateTime {
    fn default() -> Self {
        Self::EPOCH
    }
}

/// Days since 1970-01-01 to `(year, month, day)` in the proleptic Gregorian
/// calendar. Eras are 400-year cycles starting on March 1st.
fn civil_from_days(days: u32) -> (u32, u32, u32) {
    let z = days + 719_468;
    let era = z / 146_097;
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + u32::from(month <= 2);
    (year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_date_and_time() {
        // 2017-06-15 12:34:57 UTC
        let ts = FatDateTime::from_unix(1_497_530_097);
        assert_eq!(ts.date, 19151);
        assert_eq!(ts.time, 25692);
        assert_eq!(ts.ms10, 100);
        assert_eq!(
            (ts.year(), ts.month(), ts.day()),
            (2017, 6, 15)
        );
        assert_eq!((ts.hour(), ts.minute(), ts.second()), (12, 34, 57));
    }

    #[test]
    fn leap_day_even_second() {
        // 2000-02-29 23:59:58 UTC
        let ts = FatDateTime::from_unix(951_868_798);
        assert_eq!(ts.date, 10333);
        assert_eq!(ts.time, 49021);
        assert_eq!(ts.ms10, 0);
    }

    #[test]
    fn year_end() {
        // 2024-12-31 00:00:01 UTC
        let ts = FatDateTime::from_unix(1_735_603_201);
        assert_eq!(ts.date, 22943);
        assert_eq!(ts.second(), 1);
    }

    #[test]
    fn clamps_before_1980() {
        assert_eq!(FatDateTime::from_unix(0), FatDateTime::EPOCH);
        assert_eq!(FatDateTime::from_unix(FAT_EPOCH_UNIX), FatDateTime::EPOCH);
        assert_eq!(FatDateTime::EPOCH.date, 33);
    }

    #[test]
    fn latest_unix_second_fits() {
        let ts = FatDateTime::from_unix(u32::MAX);
        assert_eq!(ts.year(), 2106);
        assert_eq!((ts.month(), ts.day()), (2, 7));
    }
}
