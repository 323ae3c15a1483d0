use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::models::{AvailabilitySlot, DateKey, DayPeriod, ResolverError};

pub type GroupedSlots = BTreeMap<DateKey, Vec<AvailabilitySlot>>;

/// One ISO week of bookable days, used to page the calendar week by week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekPage {
    pub iso_year: i32,
    pub week: u32,
    pub days: Vec<DateKey>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AvailabilityOverview {
    pub period: DayPeriod,
    pub today: DateKey,
    pub days: GroupedSlots,
    pub available_days: BTreeSet<DateKey>,
    pub weeks: Vec<WeekPage>,
    pub earliest_available_day: Option<DateKey>,
    /// Bookable slots of the earliest available day, preselected by the picker.
    pub earliest_day_slots: Vec<AvailabilitySlot>,
}

/// Buckets and filters one practitioner's slots in the caller's timezone.
pub struct SlotAvailabilityResolver<Tz: TimeZone> {
    timezone: Tz,
}

impl<Tz: TimeZone> SlotAvailabilityResolver<Tz> {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    pub fn timezone(&self) -> &Tz {
        &self.timezone
    }

    pub fn local_date(&self, instant: &DateTime<Utc>) -> DateKey {
        DateKey::new(instant.with_timezone(&self.timezone).date_naive())
    }

    pub fn local_hour(&self, instant: &DateTime<Utc>) -> u32 {
        instant.with_timezone(&self.timezone).hour()
    }

    pub fn today(&self, now: DateTime<Utc>) -> DateKey {
        self.local_date(&now)
    }

    /// Bucket slots by the local date of their start, each bucket sorted by
    /// start time (ties broken by id).
    pub fn group_by_calendar_day(&self, slots: &[AvailabilitySlot]) -> GroupedSlots {
        let mut grouped = GroupedSlots::new();

        for slot in slots {
            grouped
                .entry(self.local_date(&slot.start))
                .or_default()
                .push(slot.clone());
        }

        for bucket in grouped.values_mut() {
            bucket.sort_by(|a, b| a.start.cmp(&b.start).then(a.id.cmp(&b.id)));
        }

        debug!("Grouped {} slots into {} days", slots.len(), grouped.len());
        grouped
    }

    pub fn filter_by_period(&self, slots: &[AvailabilitySlot], period: DayPeriod) -> Vec<AvailabilitySlot> {
        slots
            .iter()
            .filter(|slot| period.contains_hour(self.local_hour(&slot.start)))
            .cloned()
            .collect()
    }

    /// Everything a day picker needs in one pass: period-filtered buckets,
    /// the days that can still be booked and their week pages.
    pub fn overview(
        &self,
        slots: &[AvailabilitySlot],
        period: DayPeriod,
        now: DateTime<Utc>,
    ) -> AvailabilityOverview {
        let today = self.today(now);
        let grouped = self.group_by_calendar_day(&self.filter_by_period(slots, period));
        let available_days = days_with_availability(&grouped, today);
        let earliest_available_day = available_days.iter().next().copied();
        let earliest_day_slots = earliest_available_day
            .map(|day| available_slots_for_day(&grouped, day))
            .unwrap_or_default();

        AvailabilityOverview {
            period,
            today,
            weeks: group_days_by_week(&available_days),
            earliest_available_day,
            earliest_day_slots,
            available_days,
            days: grouped,
        }
    }
}

/// Days from `today` onwards holding at least one available slot.
pub fn days_with_availability(grouped: &GroupedSlots, today: DateKey) -> BTreeSet<DateKey> {
    grouped
        .range(today..)
        .filter(|(_, slots)| slots.iter().any(AvailabilitySlot::is_available))
        .map(|(day, _)| *day)
        .collect()
}

pub fn earliest_available_day(grouped: &GroupedSlots, today: DateKey) -> Option<DateKey> {
    days_with_availability(grouped, today).into_iter().next()
}

pub fn available_slots_for_day(grouped: &GroupedSlots, date_key: DateKey) -> Vec<AvailabilitySlot> {
    grouped
        .get(&date_key)
        .map(|slots| slots.iter().filter(|slot| slot.is_available()).cloned().collect())
        .unwrap_or_default()
}

/// First available slot of the day starting at or after `after`.
pub fn next_available_slot(
    grouped: &GroupedSlots,
    date_key: DateKey,
    after: DateTime<Utc>,
) -> Option<AvailabilitySlot> {
    grouped
        .get(&date_key)?
        .iter()
        .find(|slot| slot.is_available() && slot.start >= after)
        .cloned()
}

pub fn select_slot(
    grouped: &GroupedSlots,
    date_key: DateKey,
    slot_id: i64,
    today: DateKey,
) -> Result<AvailabilitySlot, ResolverError> {
    if date_key < today {
        warn!("Rejected slot {} on past day {}", slot_id, date_key);
        return Err(ResolverError::DayInPast(date_key));
    }

    grouped
        .get(&date_key)
        .and_then(|slots| slots.iter().find(|slot| slot.id == slot_id))
        .filter(|slot| slot.is_available())
        .cloned()
        .ok_or_else(|| {
            warn!("Slot {} not selectable on {}", slot_id, date_key);
            ResolverError::NotFound { date_key, slot_id }
        })
}

pub fn group_days_by_week(days: &BTreeSet<DateKey>) -> Vec<WeekPage> {
    let mut weeks: BTreeMap<(i32, u32), Vec<DateKey>> = BTreeMap::new();

    for day in days {
        let iso = day.date().iso_week();
        weeks.entry((iso.year(), iso.week())).or_default().push(*day);
    }

    weeks
        .into_iter()
        .map(|((iso_year, week), days)| WeekPage { iso_year, week, days })
        .collect()
}
