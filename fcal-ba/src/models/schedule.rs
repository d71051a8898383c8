//! Schedule specifications for the automation ticker

use chrono::{DateTime, Datelike, Local, Timelike, Weekday};

/// When a scheduled pass should fire
///
/// The ticker wakes once a minute and fires every spec whose clock fields
/// match the current local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleSpec {
    /// Every day at hour:minute
    Daily { hour: u32, minute: u32 },
    /// Every week on `weekday` at hour:minute
    Weekly {
        weekday: Weekday,
        hour: u32,
        minute: u32,
    },
    /// Every month on `day` (1-based) at hour:minute
    Monthly { day: u32, hour: u32, minute: u32 },
}

impl ScheduleSpec {
    /// True when the spec matches the given local time's minute
    pub fn is_due(&self, now: &DateTime<Local>) -> bool {
        match self {
            ScheduleSpec::Daily { hour, minute } => {
                now.hour() == *hour && now.minute() == *minute
            }
            ScheduleSpec::Weekly {
                weekday,
                hour,
                minute,
            } => now.weekday() == *weekday && now.hour() == *hour && now.minute() == *minute,
            ScheduleSpec::Monthly { day, hour, minute } => {
                now.day() == *day && now.hour() == *hour && now.minute() == *minute
            }
        }
    }

    /// Human-readable description for the cache-info surface
    pub fn describe(&self) -> String {
        match self {
            ScheduleSpec::Daily { hour, minute } => {
                format!("Daily at {:02}:{:02}", hour, minute)
            }
            ScheduleSpec::Weekly {
                weekday,
                hour,
                minute,
            } => format!("Weekly on {} at {:02}:{:02}", weekday_name(*weekday), hour, minute),
            ScheduleSpec::Monthly { day, hour, minute } => {
                format!("Monthly on day {} at {:02}:{:02}", day, hour, minute)
            }
        }
    }
}

fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn local(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn daily_matches_only_its_minute() {
        let spec = ScheduleSpec::Daily { hour: 2, minute: 0 };
        assert!(spec.is_due(&local(2026, 3, 10, 2, 0)));
        assert!(!spec.is_due(&local(2026, 3, 10, 2, 1)));
        assert!(!spec.is_due(&local(2026, 3, 10, 3, 0)));
    }

    #[test]
    fn weekly_requires_matching_weekday() {
        let spec = ScheduleSpec::Weekly {
            weekday: Weekday::Mon,
            hour: 2,
            minute: 0,
        };
        // 2026-03-09 is a Monday
        assert!(spec.is_due(&local(2026, 3, 9, 2, 0)));
        assert!(!spec.is_due(&local(2026, 3, 10, 2, 0)));
    }

    #[test]
    fn monthly_requires_matching_day() {
        let spec = ScheduleSpec::Monthly {
            day: 1,
            hour: 2,
            minute: 0,
        };
        assert!(spec.is_due(&local(2026, 4, 1, 2, 0)));
        assert!(!spec.is_due(&local(2026, 4, 2, 2, 0)));
    }

    #[test]
    fn descriptions_are_readable() {
        assert_eq!(
            ScheduleSpec::Daily { hour: 2, minute: 0 }.describe(),
            "Daily at 02:00"
        );
        assert_eq!(
            ScheduleSpec::Weekly {
                weekday: Weekday::Mon,
                hour: 2,
                minute: 30
            }
            .describe(),
            "Weekly on Monday at 02:30"
        );
        assert_eq!(
            ScheduleSpec::Monthly {
                day: 1,
                hour: 2,
                minute: 0
            }
            .describe(),
            "Monthly on day 1 at 02:00"
        );
    }
}
