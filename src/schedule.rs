//! Weekly availability editor.
//!
//! A [`WeeklySchedule`] is an ordered list of day entries, each holding the
//! bookable slots for that day. The only invariant the editor enforces is that
//! no two slots of the same day entry cover an identical start/end window.
//! Every operation either applies completely or returns a [`ScheduleError`]
//! and leaves the schedule untouched.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::coerce::parse_capacity;
use crate::constants::{
    ADDED_SLOT_ATTEMPTS, ADDED_SLOT_START_HOUR, DEFAULT_SLOT_CAPACITY, NEW_DAY_SLOT_START_HOUR,
};
use crate::domain::{hhmm, DayAvailability, DayLabel, TimeSlot};
use crate::observability::metrics;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("slot {} - {} already exists on this day", .start.format(hhmm::FORMAT), .end.format(hhmm::FORMAT))]
    DuplicateSlot { start: NaiveTime, end: NaiveTime },

    #[error("no free default slot left on this day")]
    NoFreeDefaultSlot,

    #[error("day {index} does not exist (schedule has {len} days)")]
    DayOutOfRange { index: usize, len: usize },

    #[error("slot {index} does not exist on day {day} (day has {len} slots)")]
    SlotOutOfRange { day: usize, index: usize, len: usize },

    #[error("invalid time {0:?}, expected HH:MM")]
    InvalidTime(String),
}

/// Editable fields of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotField {
    StartTime,
    EndTime,
    Capacity,
}

/// A single edit, for callers that drive the editor as `state + action -> state`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleAction {
    AddDay,
    RemoveDay { day: usize },
    SetDayLabel { day: usize, label: DayLabel },
    AddSlot { day: usize },
    RemoveSlot { day: usize, slot: usize },
    UpdateSlot { day: usize, slot: usize, field: SlotField, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeeklySchedule {
    days: Vec<DayAvailability>,
}

impl Default for WeeklySchedule {
    fn default() -> Self {
        Self {
            days: vec![default_day()],
        }
    }
}

fn hour(h: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h % 24, 0, 0).unwrap_or(NaiveTime::MIN)
}

fn default_day() -> DayAvailability {
    DayAvailability {
        day: DayLabel::default(),
        slots: vec![TimeSlot::new(
            hour(NEW_DAY_SLOT_START_HOUR),
            hour(NEW_DAY_SLOT_START_HOUR + 1),
            DEFAULT_SLOT_CAPACITY,
        )],
    }
}

/// First whole-hour window not already taken in `slots`.
///
/// Candidates start at 12:00-13:00 and move forward one hour at a time,
/// wrapping at midnight, for one full day. Returns `None` when all of them
/// are taken.
pub fn next_default_slot(slots: &[TimeSlot]) -> Option<TimeSlot> {
    (0..ADDED_SLOT_ATTEMPTS)
        .map(|offset| {
            let start = ADDED_SLOT_START_HOUR + offset;
            TimeSlot::new(hour(start), hour(start + 1), DEFAULT_SLOT_CAPACITY)
        })
        .find(|candidate| !slots.iter().any(|s| s.same_window(candidate)))
}

impl WeeklySchedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_days(days: Vec<DayAvailability>) -> Self {
        Self { days }
    }

    pub fn days(&self) -> &[DayAvailability] {
        &self.days
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn day(&self, day: usize) -> Result<&DayAvailability, ScheduleError> {
        self.days.get(day).ok_or(ScheduleError::DayOutOfRange {
            index: day,
            len: self.days.len(),
        })
    }

    fn day_mut(&mut self, day: usize) -> Result<&mut DayAvailability, ScheduleError> {
        let len = self.days.len();
        self.days
            .get_mut(day)
            .ok_or(ScheduleError::DayOutOfRange { index: day, len })
    }

    fn check_slot(&self, day: usize, slot: usize) -> Result<(), ScheduleError> {
        let len = self.day(day)?.slots.len();
        if slot >= len {
            return Err(ScheduleError::SlotOutOfRange { day, index: slot, len });
        }
        Ok(())
    }

    /// Append a Monday entry with the 09:00-10:00 slot. Returns its index.
    pub fn add_day(&mut self) -> usize {
        self.days.push(default_day());
        debug!(days = self.days.len(), "Added day entry");
        self.days.len() - 1
    }

    /// Remove a day entry. Removing the last entry is allowed here; callers
    /// that need a non-empty schedule check before submitting.
    pub fn remove_day(&mut self, day: usize) -> Result<DayAvailability, ScheduleError> {
        self.day(day)?;
        let removed = self.days.remove(day);
        debug!(day, label = %removed.day, "Removed day entry");
        Ok(removed)
    }

    pub fn set_day_label(&mut self, day: usize, label: DayLabel) -> Result<(), ScheduleError> {
        self.day_mut(day)?.day = label;
        Ok(())
    }

    /// Add the next free default slot to a day entry.
    pub fn add_slot(&mut self, day: usize) -> Result<TimeSlot, ScheduleError> {
        let entry = self.day_mut(day)?;
        let Some(slot) = next_default_slot(&entry.slots) else {
            warn!(day, slots = entry.slots.len(), "No free default slot left");
            metrics::slots::rejected("no_free_default");
            return Err(ScheduleError::NoFreeDefaultSlot);
        };
        entry.slots.push(slot);
        debug!(day, %slot, "Added slot");
        Ok(slot)
    }

    /// Remove a slot. A day may end up with no slots.
    pub fn remove_slot(&mut self, day: usize, slot: usize) -> Result<TimeSlot, ScheduleError> {
        self.check_slot(day, slot)?;
        let removed = self.day_mut(day)?.slots.remove(slot);
        debug!(day, slot, %removed, "Removed slot");
        Ok(removed)
    }

    /// Change one field of a slot.
    ///
    /// Time edits are rejected with [`ScheduleError::DuplicateSlot`] when the
    /// resulting window matches another slot of the same day. Capacity is
    /// coerced with [`parse_capacity`] and never rejected.
    pub fn update_slot(
        &mut self,
        day: usize,
        slot: usize,
        field: SlotField,
        value: &str,
    ) -> Result<TimeSlot, ScheduleError> {
        self.check_slot(day, slot)?;
        let entry = self.day_mut(day)?;

        let mut updated = entry.slots[slot];
        match field {
            SlotField::Capacity => updated.capacity = parse_capacity(value),
            SlotField::StartTime | SlotField::EndTime => {
                let time =
                    hhmm::parse(value).ok_or_else(|| ScheduleError::InvalidTime(value.to_string()))?;
                if field == SlotField::StartTime {
                    updated.start_time = time;
                } else {
                    updated.end_time = time;
                }

                let clash = entry
                    .slots
                    .iter()
                    .enumerate()
                    .any(|(idx, other)| idx != slot && other.same_window(&updated));
                if clash {
                    warn!(day, slot, %updated, "Rejected duplicate slot");
                    metrics::slots::rejected("duplicate");
                    return Err(ScheduleError::DuplicateSlot {
                        start: updated.start_time,
                        end: updated.end_time,
                    });
                }
            }
        }

        entry.slots[slot] = updated;
        Ok(updated)
    }

    /// Apply an action to a copy of the schedule and return the new state.
    pub fn apply(&self, action: ScheduleAction) -> Result<WeeklySchedule, ScheduleError> {
        let mut next = self.clone();
        match action {
            ScheduleAction::AddDay => {
                next.add_day();
            }
            ScheduleAction::RemoveDay { day } => {
                next.remove_day(day)?;
            }
            ScheduleAction::SetDayLabel { day, label } => next.set_day_label(day, label)?,
            ScheduleAction::AddSlot { day } => {
                next.add_slot(day)?;
            }
            ScheduleAction::RemoveSlot { day, slot } => {
                next.remove_slot(day, slot)?;
            }
            ScheduleAction::UpdateSlot {
                day,
                slot,
                field,
                value,
            } => {
                next.update_slot(day, slot, field, &value)?;
            }
        }
        Ok(next)
    }

    /// Whether any day entry holds two slots with the same window.
    pub fn has_duplicates(&self) -> bool {
        self.days.iter().any(|entry| {
            entry
                .slots
                .iter()
                .enumerate()
                .any(|(i, a)| entry.slots[i + 1..].iter().any(|b| a.same_window(b)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> NaiveTime {
        hhmm::parse(s).unwrap()
    }

    fn full_day() -> WeeklySchedule {
        let slots = (0..24)
            .map(|h| TimeSlot::new(hour(12 + h), hour(13 + h), 1))
            .collect();
        WeeklySchedule::from_days(vec![DayAvailability {
            day: DayLabel::Friday,
            slots,
        }])
    }

    #[test]
    fn test_new_schedule_has_default_monday() {
        let schedule = WeeklySchedule::new();
        assert_eq!(schedule.len(), 1);
        let day = schedule.day(0).unwrap();
        assert_eq!(day.day, DayLabel::Monday);
        assert_eq!(day.slots, vec![TimeSlot::new(t("09:00"), t("10:00"), 2)]);
    }

    #[test]
    fn test_add_day_allows_repeated_labels() {
        let mut schedule = WeeklySchedule::new();
        assert_eq!(schedule.add_day(), 1);
        assert_eq!(schedule.add_day(), 2);
        assert!(schedule.days().iter().all(|d| d.day == DayLabel::Monday));
    }

    #[test]
    fn test_remove_day_can_empty_schedule() {
        let mut schedule = WeeklySchedule::new();
        schedule.remove_day(0).unwrap();
        assert!(schedule.is_empty());
        assert_eq!(
            schedule.remove_day(0),
            Err(ScheduleError::DayOutOfRange { index: 0, len: 0 })
        );
    }

    #[test]
    fn test_set_day_label() {
        let mut schedule = WeeklySchedule::new();
        schedule.set_day_label(0, DayLabel::Saturday).unwrap();
        assert_eq!(schedule.day(0).unwrap().day, DayLabel::Saturday);
        assert!(schedule.set_day_label(3, DayLabel::Sunday).is_err());
    }

    #[test]
    fn test_add_slot_starts_at_noon_and_walks_forward() {
        let mut schedule = WeeklySchedule::new();
        let first = schedule.add_slot(0).unwrap();
        let second = schedule.add_slot(0).unwrap();
        assert_eq!(first, TimeSlot::new(t("12:00"), t("13:00"), 2));
        assert_eq!(second, TimeSlot::new(t("13:00"), t("14:00"), 2));
        assert_eq!(schedule.day(0).unwrap().slots.len(), 3);
    }

    #[test]
    fn test_add_slot_wraps_past_midnight() {
        let slots = (12..24)
            .map(|h| TimeSlot::new(hour(h), hour(h + 1), 2))
            .collect();
        let mut schedule = WeeklySchedule::from_days(vec![DayAvailability {
            day: DayLabel::Monday,
            slots,
        }]);
        let added = schedule.add_slot(0).unwrap();
        assert_eq!(added, TimeSlot::new(t("00:00"), t("01:00"), 2));
    }

    #[test]
    fn test_add_slot_tries_every_hour_before_giving_up() {
        let mut schedule = full_day();
        schedule.remove_slot(0, 23).unwrap(); // frees 11:00-12:00
        let added = schedule.add_slot(0).unwrap();
        assert_eq!(added, TimeSlot::new(t("11:00"), t("12:00"), 2));
    }

    #[test]
    fn test_add_slot_reports_exhaustion_without_change() {
        let mut schedule = full_day();
        let before = schedule.clone();
        assert_eq!(schedule.add_slot(0), Err(ScheduleError::NoFreeDefaultSlot));
        assert_eq!(schedule, before);
    }

    #[test]
    fn test_remove_slot_down_to_zero() {
        let mut schedule = WeeklySchedule::new();
        schedule.remove_slot(0, 0).unwrap();
        assert!(schedule.day(0).unwrap().slots.is_empty());
        assert_eq!(
            schedule.remove_slot(0, 0),
            Err(ScheduleError::SlotOutOfRange { day: 0, index: 0, len: 0 })
        );
    }

    #[test]
    fn test_update_slot_rejects_duplicate_window() {
        let mut schedule = WeeklySchedule::new();
        schedule.add_slot(0).unwrap(); // 12:00-13:00
        schedule.update_slot(0, 1, SlotField::EndTime, "10:00").unwrap();
        let before = schedule.clone();

        let result = schedule.update_slot(0, 1, SlotField::StartTime, "09:00");
        assert_eq!(
            result,
            Err(ScheduleError::DuplicateSlot {
                start: t("09:00"),
                end: t("10:00")
            })
        );
        assert_eq!(schedule, before);
        assert!(!schedule.has_duplicates());
    }

    #[test]
    fn test_update_slot_same_value_is_not_a_duplicate_of_itself() {
        let mut schedule = WeeklySchedule::new();
        let updated = schedule.update_slot(0, 0, SlotField::StartTime, "09:00").unwrap();
        assert_eq!(updated.start_time, t("09:00"));
    }

    #[test]
    fn test_duplicates_are_checked_per_day_entry() {
        let mut schedule = WeeklySchedule::new();
        schedule.add_day();
        // both entries hold 09:00-10:00, which is fine across entries
        assert!(!schedule.has_duplicates());
        schedule.update_slot(1, 0, SlotField::Capacity, "4").unwrap();
        assert_eq!(schedule.day(1).unwrap().slots[0].capacity, 4);
    }

    #[test]
    fn test_update_slot_capacity_coercion() {
        let mut schedule = WeeklySchedule::new();
        assert_eq!(
            schedule.update_slot(0, 0, SlotField::Capacity, "abc").unwrap().capacity,
            0
        );
        assert_eq!(
            schedule.update_slot(0, 0, SlotField::Capacity, "-3").unwrap().capacity,
            0
        );
        assert_eq!(
            schedule.update_slot(0, 0, SlotField::Capacity, "7").unwrap().capacity,
            7
        );
    }

    #[test]
    fn test_update_slot_rejects_bad_time() {
        let mut schedule = WeeklySchedule::new();
        let before = schedule.clone();
        assert_eq!(
            schedule.update_slot(0, 0, SlotField::StartTime, "25:99"),
            Err(ScheduleError::InvalidTime("25:99".into()))
        );
        assert_eq!(schedule, before);
    }

    #[test]
    fn test_end_before_start_is_accepted() {
        let mut schedule = WeeklySchedule::new();
        let slot = schedule.update_slot(0, 0, SlotField::EndTime, "08:00").unwrap();
        assert_eq!(slot.start_time, t("09:00"));
        assert_eq!(slot.end_time, t("08:00"));
    }

    #[test]
    fn test_apply_is_pure() {
        let schedule = WeeklySchedule::new();
        let next = schedule.apply(ScheduleAction::AddSlot { day: 0 }).unwrap();
        assert_eq!(schedule.day(0).unwrap().slots.len(), 1);
        assert_eq!(next.day(0).unwrap().slots.len(), 2);

        let err = next
            .apply(ScheduleAction::UpdateSlot {
                day: 0,
                slot: 1,
                field: SlotField::StartTime,
                value: "09:00".into(),
            })
            .and_then(|s| {
                s.apply(ScheduleAction::UpdateSlot {
                    day: 0,
                    slot: 1,
                    field: SlotField::EndTime,
                    value: "10:00".into(),
                })
            });
        assert!(matches!(err, Err(ScheduleError::DuplicateSlot { .. })));
    }

    #[test]
    fn test_no_duplicates_after_many_edits() {
        let mut schedule = WeeklySchedule::new();
        for _ in 0..30 {
            let _ = schedule.add_slot(0);
        }
        let len = schedule.day(0).unwrap().slots.len();
        for slot in 0..len {
            let _ = schedule.update_slot(0, slot, SlotField::StartTime, "12:00");
            let _ = schedule.update_slot(0, slot, SlotField::EndTime, "13:00");
        }
        assert_eq!(len, 24);
        assert!(!schedule.has_duplicates());
    }

    #[test]
    fn test_schedule_serializes_as_day_list() {
        let json = serde_json::to_value(WeeklySchedule::new()).unwrap();
        assert_eq!(json[0]["day"], "Monday");
        assert_eq!(json[0]["slots"][0]["startTime"], "09:00");
    }
}
