//! Cron schedules for partitioned jobs
//!
//! Supports the five standard fields (minute, hour, day of month, month,
//! day of week) with `*`, lists, ranges and `/` steps, evaluated in UTC.

use crate::error::{CoreError, CoreResult};
use crate::partition::PartitionKey;
use chrono::{DateTime, Datelike, Duration, DurationRound, Timelike, Utc};
use serde::Serialize;
use std::fmt;

/// Cron expression of the daily schedule (02:00 UTC)
pub const DAILY_CRON: &str = "0 2 * * *";

/// Upper bound on the search in `next_after` (about four years of minutes)
const MAX_SEARCH_MINUTES: i64 = 4 * 366 * 24 * 60;

/// One parsed cron field: the set of allowed values as a bitmask
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CronField {
    allowed: u64,
    wildcard: bool,
}

impl CronField {
    fn parse(field: &str, min: u32, max: u32, expr: &str) -> CoreResult<Self> {
        let invalid = |reason: String| CoreError::InvalidCron {
            expr: expr.to_string(),
            reason,
        };

        let mut allowed = 0u64;
        for part in field.split(',') {
            let (range, step) = match part.split_once('/') {
                Some((range, step)) => {
                    let step: u32 = step
                        .parse()
                        .map_err(|_| invalid(format!("invalid step '{}'", step)))?;
                    if step == 0 {
                        return Err(invalid("step must be positive".to_string()));
                    }
                    (range, step)
                }
                None => (part, 1),
            };

            let (lo, hi) = if range == "*" {
                (min, max)
            } else if let Some((lo, hi)) = range.split_once('-') {
                (parse_value(lo, expr)?, parse_value(hi, expr)?)
            } else {
                let value = parse_value(range, expr)?;
                // `5/15` means "from 5 to the end, every 15"
                if step > 1 {
                    (value, max)
                } else {
                    (value, value)
                }
            };

            if lo < min || hi > max || lo > hi {
                return Err(invalid(format!("'{}' is outside {}-{}", part, min, max)));
            }

            let mut v = lo;
            while v <= hi {
                allowed |= 1 << v;
                v += step;
            }
        }

        Ok(Self {
            allowed,
            wildcard: field == "*",
        })
    }

    fn matches(&self, value: u32) -> bool {
        self.allowed & (1 << value) != 0
    }
}

fn parse_value(s: &str, expr: &str) -> CoreResult<u32> {
    s.parse().map_err(|_| CoreError::InvalidCron {
        expr: expr.to_string(),
        reason: format!("'{}' is not a number", s),
    })
}

/// A parsed five-field cron expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronSchedule {
    expr: String,
    minute: CronField,
    hour: CronField,
    day_of_month: CronField,
    month: CronField,
    day_of_week: CronField,
}

impl CronSchedule {
    /// Parse a cron expression
    pub fn parse(expr: &str) -> CoreResult<Self> {
        let fields: Vec<&str> = expr.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(CoreError::InvalidCron {
                expr: expr.to_string(),
                reason: format!("expected 5 fields, found {}", fields.len()),
            });
        }

        let mut day_of_week = CronField::parse(fields[4], 0, 7, expr)?;
        // 7 is an alias for Sunday
        if day_of_week.matches(7) {
            day_of_week.allowed |= 1;
        }

        Ok(Self {
            expr: fields.join(" "),
            minute: CronField::parse(fields[0], 0, 59, expr)?,
            hour: CronField::parse(fields[1], 0, 23, expr)?,
            day_of_month: CronField::parse(fields[2], 1, 31, expr)?,
            month: CronField::parse(fields[3], 1, 12, expr)?,
            day_of_week,
        })
    }

    /// The normalized expression
    pub fn expr(&self) -> &str {
        &self.expr
    }

    /// Whether `t` (truncated to the minute) is a tick of this schedule
    pub fn matches(&self, t: DateTime<Utc>) -> bool {
        self.minute.matches(t.minute())
            && self.hour.matches(t.hour())
            && self.month.matches(t.month())
            && self.day_matches(t)
    }

    // When both day fields are restricted, either may match.
    fn day_matches(&self, t: DateTime<Utc>) -> bool {
        let dom = self.day_of_month.matches(t.day());
        let dow = self.day_of_week.matches(t.weekday().num_days_from_sunday());
        match (self.day_of_month.wildcard, self.day_of_week.wildcard) {
            (true, true) => true,
            (true, false) => dow,
            (false, true) => dom,
            (false, false) => dom || dow,
        }
    }

    /// The first tick strictly after `after`
    pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let start = after.duration_trunc(Duration::minutes(1)).ok()? + Duration::minutes(1);
        let mut t = start;
        while (t - start).num_minutes() <= MAX_SEARCH_MINUTES {
            if !self.month.matches(t.month()) || !self.day_matches(t) {
                let next_day = t.date_naive().succ_opt()?;
                t = next_day.and_hms_opt(0, 0, 0)?.and_utc();
                continue;
            }
            if !self.hour.matches(t.hour()) {
                t = t.duration_trunc(Duration::hours(1)).ok()? + Duration::hours(1);
                continue;
            }
            if self.minute.matches(t.minute()) {
                return Some(t);
            }
            t += Duration::minutes(1);
        }
        None
    }
}

impl fmt::Display for CronSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expr)
    }
}

/// A named schedule that launches a job
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleDefinition {
    /// Schedule name
    pub name: String,

    /// Job launched on each tick
    pub job: String,

    /// Cron expression
    pub cron: String,

    #[serde(skip)]
    schedule: CronSchedule,
}

impl ScheduleDefinition {
    /// Create a schedule definition, validating the cron expression
    pub fn new(name: &str, job: &str, cron: &str) -> CoreResult<Self> {
        let schedule = CronSchedule::parse(cron)?;
        Ok(Self {
            name: name.to_string(),
            job: job.to_string(),
            cron: schedule.expr().to_string(),
            schedule,
        })
    }

    /// The parsed cron schedule
    pub fn schedule(&self) -> &CronSchedule {
        &self.schedule
    }

    /// Next tick strictly after `after`
    pub fn next_tick(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule.next_after(after)
    }

    /// Partition a tick materializes: the day before the tick
    pub fn partition_for_tick(tick: DateTime<Utc>) -> PartitionKey {
        PartitionKey::from_date(tick.date_naive()).previous()
    }
}

#[cfg(test)]
#[path = "schedule_test.rs"]
mod tests;
