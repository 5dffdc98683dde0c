use chrono::{Duration, NaiveDate, NaiveTime};
use tracing::{debug, error, warn};

use crate::messages::MessageCode;
use crate::models::{Appointment, AppointmentError, FreeSlots, SchedulingRules, SlotAvailability};
use crate::services::ports::AppointmentStore;

/// Detects double bookings of a (dentist, date, time) slot.
pub struct ConflictChecker<'a> {
    store: &'a dyn AppointmentStore,
}

impl<'a> ConflictChecker<'a> {
    pub fn new(store: &'a dyn AppointmentStore) -> Self {
        Self { store }
    }

    /// Check a slot against the dentist's non-cancelled appointments of the
    /// day. `exclude_appointment_id` lets an appointment keep its own slot.
    pub async fn check_slot(
        &self,
        dentist_id: i64,
        date: NaiveDate,
        time: NaiveTime,
        exclude_appointment_id: Option<i64>,
    ) -> Result<SlotAvailability, AppointmentError> {
        debug!("Checking slot for dentist {} at {} {}", dentist_id, date, time);

        let existing = self.day_schedule(dentist_id, date).await?;
        let conflict = first_conflict(&existing, time, exclude_appointment_id);

        if let Some(appointment) = conflict {
            warn!(
                "Slot {} {} of dentist {} is held by appointment {}",
                date, time, dentist_id, appointment.id
            );
        }

        Ok(SlotAvailability {
            dentist_id,
            date,
            time,
            available: conflict.is_none(),
            conflicting_appointment_id: conflict.map(|a| a.id),
        })
    }

    /// Like `check_slot`, but a taken slot is a validation error.
    pub async fn ensure_free(
        &self,
        dentist_id: i64,
        date: NaiveDate,
        time: NaiveTime,
        exclude_appointment_id: Option<i64>,
    ) -> Result<(), AppointmentError> {
        let availability = self.check_slot(dentist_id, date, time, exclude_appointment_id).await?;
        if !availability.available {
            return Err(AppointmentError::ValidationError(MessageCode::SlotUnavailable));
        }
        Ok(())
    }

    pub async fn free_slots(
        &self,
        dentist_id: i64,
        date: NaiveDate,
        rules: &SchedulingRules,
    ) -> Result<FreeSlots, AppointmentError> {
        let existing = self.day_schedule(dentist_id, date).await?;
        let (free, taken) = partition_slots(&existing, rules);

        Ok(FreeSlots {
            dentist_id,
            date,
            slot_minutes: rules.slot_minutes,
            free,
            taken,
        })
    }

    async fn day_schedule(&self, dentist_id: i64, date: NaiveDate) -> Result<Vec<Appointment>, AppointmentError> {
        self.store
            .list_for_dentist_on(dentist_id, date)
            .await
            .map_err(|e| {
                error!("Failed to load schedule of dentist {} on {}: {}", dentist_id, date, e);
                AppointmentError::Unexpected(e.to_string())
            })
    }
}

/// First appointment, in store order, that holds exactly `time`.
pub fn first_conflict(
    existing: &[Appointment],
    time: NaiveTime,
    exclude_appointment_id: Option<i64>,
) -> Option<&Appointment> {
    existing.iter().find(|appointment| {
        appointment.occupies_slot()
            && appointment.time == time
            && Some(appointment.id) != exclude_appointment_id
    })
}

/// Clinic grid from opening time, `slot_minutes` apart, where each slot must
/// end by closing time. Returns `(free, taken)`; taken also lists
/// appointments booked off the grid.
pub fn partition_slots(existing: &[Appointment], rules: &SchedulingRules) -> (Vec<NaiveTime>, Vec<NaiveTime>) {
    let mut taken: Vec<NaiveTime> = existing
        .iter()
        .filter(|a| a.occupies_slot())
        .map(|a| a.time)
        .collect();
    taken.sort();
    taken.dedup();

    let free = slot_grid(rules)
        .into_iter()
        .filter(|slot| !taken.contains(slot))
        .collect();

    (free, taken)
}

pub fn slot_grid(rules: &SchedulingRules) -> Vec<NaiveTime> {
    let step = Duration::minutes(i64::from(rules.slot_minutes.max(1)));
    let mut slots = Vec::new();
    let mut current = rules.opening_time;

    loop {
        let (end, wrapped) = current.overflowing_add_signed(step);
        if wrapped != 0 || end > rules.closing_time {
            break;
        }
        slots.push(current);
        current = end;
    }

    slots
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AppointmentStatus;
    use crate::services::ports::MockAppointmentStore;
    use chrono::Utc;
    use mockall::predicate::eq;

    fn at(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 20).unwrap()
    }

    fn appointment(id: i64, time: NaiveTime, status: AppointmentStatus) -> Appointment {
        Appointment {
            id,
            patient_id: 10,
            dentist_id: 5,
            date: day(),
            time,
            status,
            reason: None,
            follow_up_of: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn exact_time_match_is_a_conflict() {
        let existing = vec![appointment(1, at(9, 0), AppointmentStatus::Confirmed)];

        assert_eq!(first_conflict(&existing, at(9, 0), None).map(|a| a.id), Some(1));
        assert!(first_conflict(&existing, at(9, 30), None).is_none());
    }

    #[test]
    fn cancelled_appointments_never_conflict() {
        let existing = vec![appointment(1, at(9, 0), AppointmentStatus::Cancelled)];
        assert!(first_conflict(&existing, at(9, 0), None).is_none());
    }

    #[test]
    fn excluded_appointment_keeps_its_slot() {
        let existing = vec![
            appointment(1, at(9, 0), AppointmentStatus::Confirmed),
            appointment(2, at(10, 0), AppointmentStatus::Pending),
        ];

        assert!(first_conflict(&existing, at(9, 0), Some(1)).is_none());
        assert_eq!(first_conflict(&existing, at(10, 0), Some(1)).map(|a| a.id), Some(2));
    }

    #[test]
    fn first_conflict_follows_store_order() {
        let existing = vec![
            appointment(3, at(9, 0), AppointmentStatus::Pending),
            appointment(7, at(9, 0), AppointmentStatus::Confirmed),
        ];
        assert_eq!(first_conflict(&existing, at(9, 0), None).map(|a| a.id), Some(3));
    }

    #[test]
    fn grid_stops_at_closing_time() {
        let rules = SchedulingRules {
            opening_time: at(8, 0),
            closing_time: at(10, 0),
            slot_minutes: 45,
            ..SchedulingRules::default()
        };

        assert_eq!(slot_grid(&rules), vec![at(8, 0), at(8, 45)]);
    }

    #[test]
    fn taken_slots_are_removed_from_the_grid() {
        let rules = SchedulingRules {
            opening_time: at(8, 0),
            closing_time: at(10, 0),
            slot_minutes: 30,
            ..SchedulingRules::default()
        };
        let existing = vec![
            appointment(1, at(8, 30), AppointmentStatus::Confirmed),
            appointment(2, at(9, 0), AppointmentStatus::Cancelled),
            appointment(3, at(9, 15), AppointmentStatus::Pending),
        ];

        let (free, taken) = partition_slots(&existing, &rules);
        assert_eq!(free, vec![at(8, 0), at(9, 0), at(9, 30)]);
        assert_eq!(taken, vec![at(8, 30), at(9, 15)]);
    }

    #[tokio::test]
    async fn check_slot_reports_the_conflicting_appointment() {
        let mut store = MockAppointmentStore::new();
        store
            .expect_list_for_dentist_on()
            .with(eq(5), eq(day()))
            .returning(|_, _| Ok(vec![appointment(4, at(14, 0), AppointmentStatus::Confirmed)]));

        let checker = ConflictChecker::new(&store);
        let availability = checker.check_slot(5, day(), at(14, 0), None).await.unwrap();

        assert!(!availability.available);
        assert_eq!(availability.conflicting_appointment_id, Some(4));
        assert_eq!(
            checker.ensure_free(5, day(), at(14, 0), None).await,
            Err(AppointmentError::ValidationError(MessageCode::SlotUnavailable))
        );
    }

    #[tokio::test]
    async fn store_failure_is_unexpected() {
        let mut store = MockAppointmentStore::new();
        store
            .expect_list_for_dentist_on()
            .returning(|_, _| Err(anyhow::anyhow!("connection reset")));

        let checker = ConflictChecker::new(&store);
        let result = checker.check_slot(5, day(), at(14, 0), None).await;

        assert!(matches!(result, Err(AppointmentError::Unexpected(_))));
    }
}
