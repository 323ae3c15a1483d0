use std::collections::BTreeSet;

use chrono::{Duration, FixedOffset, TimeZone, Utc};
use proptest::prelude::*;

use availability_cell::services::resolver::days_with_availability;
use availability_cell::{AvailabilitySlot, SlotAvailabilityResolver, SlotStatus};

fn status() -> impl Strategy<Value = SlotStatus> {
    prop_oneof![
        Just(SlotStatus::Available),
        Just(SlotStatus::Reserved),
        Just(SlotStatus::Unavailable),
        Just(SlotStatus::Expired),
    ]
}

fn slots() -> impl Strategy<Value = Vec<AvailabilitySlot>> {
    proptest::collection::vec((0i64..14 * 24 * 60, 15i64..120, status()), 0..40).prop_map(|specs| {
        let origin = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        specs
            .into_iter()
            .enumerate()
            .map(|(index, (offset, length, status))| {
                let start = origin + Duration::minutes(offset);
                AvailabilitySlot::new(index as i64, 1, start, start + Duration::minutes(length), status)
                    .unwrap()
            })
            .collect()
    })
}

fn sorted_ids(slots: &[AvailabilitySlot]) -> Vec<i64> {
    let mut ids: Vec<i64> = slots.iter().map(|s| s.id).collect();
    ids.sort_unstable();
    ids
}

proptest! {
    #[test]
    fn grouping_preserves_the_multiset(slots in slots(), offset_hours in -12i32..=14) {
        let resolver = SlotAvailabilityResolver::new(FixedOffset::east_opt(offset_hours * 3600).unwrap());
        let grouped = resolver.group_by_calendar_day(&slots);
        let flattened: Vec<AvailabilitySlot> = grouped.values().flatten().cloned().collect();

        prop_assert_eq!(sorted_ids(&flattened), sorted_ids(&slots));
        prop_assert_eq!(&grouped, &resolver.group_by_calendar_day(&slots));

        for (day, bucket) in &grouped {
            prop_assert!(bucket.iter().all(|slot| resolver.local_date(&slot.start) == *day));
            prop_assert!(bucket.windows(2).all(|pair| pair[0].start <= pair[1].start));
        }
    }

    #[test]
    fn qualifying_days_have_an_open_slot_and_are_not_past(slots in slots(), today_offset in 0i64..14) {
        let resolver = SlotAvailabilityResolver::new(FixedOffset::west_opt(3 * 3600).unwrap());
        let grouped = resolver.group_by_calendar_day(&slots);
        let today = resolver.today(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap() + Duration::days(today_offset));
        let days: BTreeSet<_> = days_with_availability(&grouped, today);

        for day in &days {
            prop_assert!(*day >= today);
            prop_assert!(grouped[day].iter().any(|slot| slot.status == SlotStatus::Available));
        }
    }
}
