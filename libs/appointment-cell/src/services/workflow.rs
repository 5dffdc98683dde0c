// libs/appointment-cell/src/services/workflow.rs
use chrono::{Local, NaiveDate};
use futures::future::join_all;
use tracing::{debug, error, info, warn};

use dentist_cell::Dentist;
use notification_cell::{NewNotification, NotificationCategory};
use patient_cell::Patient;
use shared_config::{AppConfig, Locale};
use shared_models::auth::{Caller, Role};

use crate::messages::{appointment_summary, MessageCode};
use crate::models::{
    Appointment, AppointmentChanges, AppointmentError, AppointmentOutcome, AppointmentStatus,
    CreateAppointmentRequest, EditAppointmentRequest, FollowUpAppointmentRequest, FreeSlots,
    NewAppointment, SchedulingRules, SlotAvailability, SlotCheckQuery,
};
use crate::services::conflict::ConflictChecker;
use crate::services::lifecycle::{
    normalize_reason, parse_date, parse_time, validate_booking_date, AppointmentLifecycleService,
};
use crate::services::ports::{
    AppointmentStore, DentistDirectory, DentistLookup, InAppNotifier, Notifier, PatientDirectory,
    PatientLookup,
};
use crate::services::store::SupabaseAppointmentStore;

/// Booking rules and state changes of appointments.
///
/// Each operation takes the caller explicitly, performs at most one write and
/// then notifies the participants. Notification failures are logged and never
/// change the outcome.
///
/// The slot check and the write are separate requests, so two concurrent
/// bookings of the same free slot can both succeed.
pub struct AppointmentWorkflow {
    store: Box<dyn AppointmentStore>,
    patients: Box<dyn PatientLookup>,
    dentists: Box<dyn DentistLookup>,
    notifier: Box<dyn Notifier>,
    lifecycle: AppointmentLifecycleService,
    rules: SchedulingRules,
    locale: Locale,
}

impl AppointmentWorkflow {
    pub fn new(
        store: Box<dyn AppointmentStore>,
        patients: Box<dyn PatientLookup>,
        dentists: Box<dyn DentistLookup>,
        notifier: Box<dyn Notifier>,
        rules: SchedulingRules,
        locale: Locale,
    ) -> Self {
        Self {
            store,
            patients,
            dentists,
            notifier,
            lifecycle: AppointmentLifecycleService::new(),
            rules,
            locale,
        }
    }

    /// Workflow backed by Supabase, acting with the caller's token.
    pub fn for_request(config: &AppConfig, auth_token: &str) -> Self {
        Self::new(
            Box::new(SupabaseAppointmentStore::new(config, auth_token)),
            Box::new(PatientDirectory::new(config, auth_token)),
            Box::new(DentistDirectory::new(config, auth_token)),
            Box::new(InAppNotifier::new(config, auth_token)),
            SchedulingRules::from_config(config),
            config.locale,
        )
    }

    // ==========================================================================
    // COMMANDS
    // ==========================================================================

    pub async fn create(
        &self,
        caller: &Caller,
        request: CreateAppointmentRequest,
    ) -> Result<AppointmentOutcome, AppointmentError> {
        let date = parse_date(&request.date)?;
        let time = parse_time(&request.time)?;
        validate_booking_date(date, today())?;
        let reason = normalize_reason(request.reason, &self.rules)?;

        let status = match caller.role {
            Role::Receptionist => AppointmentStatus::Confirmed,
            Role::Patient if caller.is_patient(request.patient_id) => AppointmentStatus::Pending,
            Role::Patient => {
                warn!("Patient {} tried to book for patient {}", caller.role_id, request.patient_id);
                return Err(AppointmentError::Unauthorized(MessageCode::NotOwner));
            }
            _ => return Err(not_allowed(caller, "create an appointment")),
        };

        let (patient, dentist) = futures::try_join!(
            self.find_patient(request.patient_id),
            self.find_bookable_dentist(request.dentist_id),
        )?;

        ConflictChecker::new(self.store.as_ref())
            .ensure_free(dentist.id, date, time, None)
            .await?;

        let appointment = self.store
            .create(NewAppointment {
                patient_id: patient.id,
                dentist_id: dentist.id,
                date,
                time,
                status,
                reason,
                follow_up_of: None,
            })
            .await
            .map_err(fault("create appointment"))?;

        info!(
            "Appointment {} booked by {} for patient {} with dentist {} ({})",
            appointment.id, caller.role, patient.id, dentist.id, appointment.status
        );

        self.notify(
            vec![patient.user_id, dentist.user_id],
            &appointment,
            MessageCode::AppointmentCreated,
        ).await;

        Ok(AppointmentOutcome {
            appointment,
            message: MessageCode::AppointmentCreated,
        })
    }

    /// Book a confirmed visit that continues an attended one.
    pub async fn create_follow_up(
        &self,
        caller: &Caller,
        request: FollowUpAppointmentRequest,
    ) -> Result<AppointmentOutcome, AppointmentError> {
        let date = parse_date(&request.date)?;
        let time = parse_time(&request.time)?;
        validate_booking_date(date, today())?;
        let reason = normalize_reason(request.reason, &self.rules)?;

        if !matches!(caller.role, Role::Dentist | Role::Receptionist) {
            return Err(not_allowed(caller, "create a follow-up"));
        }

        let previous = self.load(request.previous_appointment_id).await?;

        if caller.is(Role::Dentist) && !caller.is_dentist(previous.dentist_id) {
            warn!("Dentist {} is not assigned to appointment {}", caller.role_id, previous.id);
            return Err(AppointmentError::Unauthorized(MessageCode::NotOwner));
        }

        if previous.status != AppointmentStatus::Attended {
            warn!("Follow-up of appointment {} rejected: status {}", previous.id, previous.status);
            return Err(AppointmentError::InvalidState(MessageCode::PreviousNotAttended));
        }

        let dentist_id = request.dentist_id.unwrap_or(previous.dentist_id);
        let (patient, dentist) = futures::try_join!(
            self.find_patient(previous.patient_id),
            self.find_bookable_dentist(dentist_id),
        )?;

        ConflictChecker::new(self.store.as_ref())
            .ensure_free(dentist.id, date, time, None)
            .await?;

        let reason = reason.or_else(|| Some(self.follow_up_reason(&previous)));

        let appointment = self.store
            .create(NewAppointment {
                patient_id: patient.id,
                dentist_id: dentist.id,
                date,
                time,
                status: AppointmentStatus::Confirmed,
                reason,
                follow_up_of: Some(previous.id),
            })
            .await
            .map_err(fault("create follow-up appointment"))?;

        info!("Follow-up {} created for appointment {}", appointment.id, previous.id);

        self.notify(
            vec![patient.user_id, dentist.user_id],
            &appointment,
            MessageCode::FollowUpCreated,
        ).await;

        Ok(AppointmentOutcome {
            appointment,
            message: MessageCode::FollowUpCreated,
        })
    }

    /// Move a confirmed appointment to another dentist, date or time.
    pub async fn edit(
        &self,
        caller: &Caller,
        appointment_id: i64,
        request: EditAppointmentRequest,
    ) -> Result<AppointmentOutcome, AppointmentError> {
        // Role first: non-receptionists are refused whatever the payload
        if !caller.is(Role::Receptionist) {
            return Err(not_allowed(caller, "edit an appointment"));
        }

        let date = parse_date(&request.date)?;
        let time = parse_time(&request.time)?;
        validate_booking_date(date, today())?;
        let reason = normalize_reason(request.reason, &self.rules)?;

        let current = self.load(appointment_id).await?;
        self.lifecycle.ensure_editable(current.status)?;

        let dentist = self.find_bookable_dentist(request.dentist_id).await?;

        ConflictChecker::new(self.store.as_ref())
            .ensure_free(dentist.id, date, time, Some(current.id))
            .await?;

        let changes = AppointmentChanges {
            dentist_id: Some(dentist.id),
            date: Some(date),
            time: Some(time),
            reason,
            status: None,
        };

        let appointment = self.store
            .update(current.id, changes)
            .await
            .map_err(fault("update appointment"))?;

        info!(
            "Appointment {} moved from {} {} (dentist {}) to {} {} (dentist {})",
            appointment.id, current.date, current.time, current.dentist_id,
            appointment.date, appointment.time, appointment.dentist_id
        );

        let mut recipients = self.patient_user_id(appointment.patient_id).await.into_iter().collect::<Vec<_>>();
        recipients.push(dentist.user_id);
        self.notify(recipients, &appointment, MessageCode::AppointmentUpdated).await;

        Ok(AppointmentOutcome {
            appointment,
            message: MessageCode::AppointmentUpdated,
        })
    }

    pub async fn cancel(
        &self,
        caller: &Caller,
        appointment_id: i64,
    ) -> Result<AppointmentOutcome, AppointmentError> {
        if !matches!(
            caller.role,
            Role::Patient | Role::Receptionist | Role::Owner | Role::Administrator
        ) {
            return Err(not_allowed(caller, "cancel an appointment"));
        }

        let current = self.load(appointment_id).await?;

        if caller.is(Role::Patient) && !caller.is_patient(current.patient_id) {
            warn!("Patient {} tried to cancel appointment {}", caller.role_id, current.id);
            return Err(AppointmentError::Unauthorized(MessageCode::NotOwner));
        }

        let appointment = self.transition(&current, AppointmentStatus::Cancelled).await?;
        info!("Appointment {} cancelled by {} {}", appointment.id, caller.role, caller.role_id);

        let recipients = self.participant_user_ids(&appointment).await;
        self.notify(recipients, &appointment, MessageCode::AppointmentCancelled).await;

        Ok(AppointmentOutcome {
            appointment,
            message: MessageCode::AppointmentCancelled,
        })
    }

    /// Accept a patient's pending request.
    pub async fn confirm(
        &self,
        caller: &Caller,
        appointment_id: i64,
    ) -> Result<AppointmentOutcome, AppointmentError> {
        if !caller.is(Role::Receptionist) {
            return Err(not_allowed(caller, "confirm an appointment"));
        }

        let current = self.load(appointment_id).await?;
        let appointment = self.transition(&current, AppointmentStatus::Confirmed).await?;
        info!("Appointment {} confirmed", appointment.id);

        let recipients = self.patient_user_id(appointment.patient_id).await.into_iter().collect();
        self.notify(recipients, &appointment, MessageCode::AppointmentConfirmed).await;

        Ok(AppointmentOutcome {
            appointment,
            message: MessageCode::AppointmentConfirmed,
        })
    }

    pub async fn mark_attended(
        &self,
        caller: &Caller,
        appointment_id: i64,
    ) -> Result<AppointmentOutcome, AppointmentError> {
        if !matches!(caller.role, Role::Dentist | Role::Receptionist) {
            return Err(not_allowed(caller, "mark an appointment attended"));
        }

        let current = self.load(appointment_id).await?;

        if caller.is(Role::Dentist) && !caller.is_dentist(current.dentist_id) {
            warn!("Dentist {} is not assigned to appointment {}", caller.role_id, current.id);
            return Err(AppointmentError::Unauthorized(MessageCode::NotOwner));
        }

        let appointment = self.transition(&current, AppointmentStatus::Attended).await?;
        info!("Appointment {} attended", appointment.id);

        Ok(AppointmentOutcome {
            appointment,
            message: MessageCode::AppointmentAttended,
        })
    }

    // ==========================================================================
    // QUERIES
    // ==========================================================================

    pub async fn get(&self, caller: &Caller, appointment_id: i64) -> Result<Appointment, AppointmentError> {
        let appointment = self.load(appointment_id).await?;

        let allowed = match caller.role {
            Role::Patient => caller.is_patient(appointment.patient_id),
            Role::Dentist => caller.is_dentist(appointment.dentist_id),
            _ => true,
        };

        if !allowed {
            warn!("{} {} may not view appointment {}", caller.role, caller.role_id, appointment.id);
            return Err(AppointmentError::Unauthorized(MessageCode::NotOwner));
        }

        Ok(appointment)
    }

    pub async fn list_for_patient(
        &self,
        caller: &Caller,
        patient_id: i64,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        if caller.is(Role::Patient) && !caller.is_patient(patient_id) {
            return Err(AppointmentError::Unauthorized(MessageCode::NotOwner));
        }

        self.store
            .list_for_patient(patient_id)
            .await
            .map_err(fault("list patient appointments"))
    }

    /// Non-cancelled appointments of a dentist's day.
    pub async fn list_for_dentist_on(
        &self,
        caller: &Caller,
        dentist_id: i64,
        date: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let date = parse_date(date)?;

        match caller.role {
            Role::Patient => return Err(not_allowed(caller, "view a dentist's schedule")),
            Role::Dentist if !caller.is_dentist(dentist_id) => {
                return Err(AppointmentError::Unauthorized(MessageCode::NotOwner));
            }
            _ => {}
        }

        self.store
            .list_for_dentist_on(dentist_id, date)
            .await
            .map_err(fault("list dentist appointments"))
    }

    pub async fn check_slot(
        &self,
        caller: &Caller,
        query: SlotCheckQuery,
    ) -> Result<SlotAvailability, AppointmentError> {
        let date = parse_date(&query.date)?;
        let time = parse_time(&query.time)?;
        validate_booking_date(date, today())?;

        debug!("{} {} checks slot {} {} of dentist {}", caller.role, caller.role_id, date, time, query.dentist_id);

        let dentist = self.find_bookable_dentist(query.dentist_id).await?;
        ConflictChecker::new(self.store.as_ref())
            .check_slot(dentist.id, date, time, None)
            .await
    }

    pub async fn free_slots(
        &self,
        caller: &Caller,
        dentist_id: i64,
        date: &str,
    ) -> Result<FreeSlots, AppointmentError> {
        let date = parse_date(date)?;
        validate_booking_date(date, today())?;

        debug!("{} {} lists free slots of dentist {} on {}", caller.role, caller.role_id, dentist_id, date);

        let dentist = self.find_bookable_dentist(dentist_id).await?;
        ConflictChecker::new(self.store.as_ref())
            .free_slots(dentist.id, date, &self.rules)
            .await
    }

    // ==========================================================================
    // HELPERS
    // ==========================================================================

    async fn load(&self, appointment_id: i64) -> Result<Appointment, AppointmentError> {
        self.store
            .get(appointment_id)
            .await
            .map_err(fault("load appointment"))?
            .ok_or(AppointmentError::NotFound(MessageCode::AppointmentNotFound))
    }

    async fn transition(
        &self,
        current: &Appointment,
        next: AppointmentStatus,
    ) -> Result<Appointment, AppointmentError> {
        self.lifecycle.validate_status_transition(current.status, next)?;

        self.store
            .update(current.id, AppointmentChanges::status(next))
            .await
            .map_err(fault("update appointment status"))
    }

    async fn find_patient(&self, patient_id: i64) -> Result<Patient, AppointmentError> {
        self.patients
            .find_patient(patient_id)
            .await
            .map_err(fault("look up patient"))?
            .ok_or(AppointmentError::NotFound(MessageCode::PatientNotFound))
    }

    async fn find_bookable_dentist(&self, dentist_id: i64) -> Result<Dentist, AppointmentError> {
        let dentist = self.dentists
            .find_dentist(dentist_id)
            .await
            .map_err(fault("look up dentist"))?
            .ok_or(AppointmentError::NotFound(MessageCode::DentistNotFound))?;

        if !dentist.is_active {
            warn!("Dentist {} is inactive", dentist.id);
            return Err(AppointmentError::ValidationError(MessageCode::DentistInactive));
        }

        Ok(dentist)
    }

    fn follow_up_reason(&self, previous: &Appointment) -> String {
        let reason = match previous.reason.as_deref() {
            Some(prior) => format!("Follow-up: {}", prior),
            None => "Follow-up".to_string(),
        };
        reason.chars().take(self.rules.max_reason_length).collect()
    }

    // Recipient lookups below are part of notification and fail soft.

    async fn patient_user_id(&self, patient_id: i64) -> Option<String> {
        match self.patients.find_patient(patient_id).await {
            Ok(Some(patient)) => Some(patient.user_id),
            Ok(None) => {
                warn!("No patient {} to notify", patient_id);
                None
            }
            Err(e) => {
                warn!("Failed to resolve patient {} for notification: {}", patient_id, e);
                None
            }
        }
    }

    async fn dentist_user_id(&self, dentist_id: i64) -> Option<String> {
        match self.dentists.find_dentist(dentist_id).await {
            Ok(Some(dentist)) => Some(dentist.user_id),
            Ok(None) => {
                warn!("No dentist {} to notify", dentist_id);
                None
            }
            Err(e) => {
                warn!("Failed to resolve dentist {} for notification: {}", dentist_id, e);
                None
            }
        }
    }

    async fn participant_user_ids(&self, appointment: &Appointment) -> Vec<String> {
        let (patient, dentist) = futures::join!(
            self.patient_user_id(appointment.patient_id),
            self.dentist_user_id(appointment.dentist_id),
        );
        patient.into_iter().chain(dentist).collect()
    }

    async fn notify(&self, recipients: Vec<String>, appointment: &Appointment, code: MessageCode) {
        let title = code.text(self.locale).to_string();
        let message = appointment_summary(appointment, self.locale);

        let sends = recipients.into_iter().map(|user_id| {
            let notification = NewNotification {
                user_id,
                title: title.clone(),
                message: message.clone(),
                category: NotificationCategory::Appointment,
                related_object_id: Some(appointment.id),
            };
            async move {
                let recipient = notification.user_id.clone();
                if let Err(e) = self.notifier.send(notification).await {
                    warn!(
                        "Notification for appointment {} to user {} failed: {}",
                        appointment.id, recipient, e
                    );
                }
            }
        });

        join_all(sends).await;
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn not_allowed(caller: &Caller, action: &str) -> AppointmentError {
    warn!("{} {} is not allowed to {}", caller.role, caller.role_id, action);
    AppointmentError::Unauthorized(MessageCode::NotAllowed)
}

fn fault(action: &'static str) -> impl FnOnce(anyhow::Error) -> AppointmentError {
    move |e| {
        error!("Failed to {}: {}", action, e);
        AppointmentError::Unexpected(e.to_string())
    }
}
