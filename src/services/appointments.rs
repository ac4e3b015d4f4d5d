//! Appointment booking and status transitions

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    config::BookingConfig,
    error::{AppError, AppResult},
    models::{
        appointment::{Appointment, AppointmentQuery, BookAppointment, NewAppointment},
        enums::{AppointmentStatus, Role},
        user::User,
    },
    repository::Repository,
};

use super::email::{AppointmentParties, EmailService};

/// Check that `actor` may move `appointment` to `next`.
///
/// Admins and the appointment's counsellor may make any allowed transition;
/// the client may only cancel.
pub fn authorize_transition(
    actor: &User,
    appointment: &Appointment,
    next: AppointmentStatus,
) -> AppResult<()> {
    let is_counsellor = actor.role == Role::Counsellor && actor.id == appointment.counsellor_id;
    let is_client = actor.id == appointment.user_id;

    if !(actor.is_admin() || is_counsellor || is_client) {
        return Err(AppError::Authorization(
            "Not a participant of this appointment".to_string(),
        ));
    }
    if !actor.is_admin() && !is_counsellor && next != AppointmentStatus::Cancelled {
        return Err(AppError::Authorization(
            "Clients may only cancel their appointments".to_string(),
        ));
    }
    if !appointment.status.can_transition_to(next) {
        return Err(AppError::BusinessRule(format!(
            "Cannot change appointment from {} to {}",
            appointment.status, next
        )));
    }
    Ok(())
}

/// Check that `actor` may send a reminder for `appointment`.
///
/// Only the appointment's counsellor or an admin, and only for an upcoming
/// session that is still scheduled or confirmed.
pub fn authorize_reminder(actor: &User, appointment: &Appointment, now: DateTime<Utc>) -> AppResult<()> {
    let is_counsellor = actor.role == Role::Counsellor && actor.id == appointment.counsellor_id;
    if !(actor.is_admin() || is_counsellor) {
        return Err(AppError::Authorization(
            "Only the counsellor or an administrator can send reminders".to_string(),
        ));
    }
    if !matches!(
        appointment.status,
        AppointmentStatus::Scheduled | AppointmentStatus::Confirmed
    ) {
        return Err(AppError::BusinessRule(format!(
            "Cannot send a reminder for a {} appointment",
            appointment.status
        )));
    }
    if appointment.appointment_date <= now {
        return Err(AppError::BusinessRule(
            "Appointment has already started".to_string(),
        ));
    }
    Ok(())
}

/// Resolve and bound-check the requested duration
pub fn resolve_duration(requested: Option<i32>, config: &BookingConfig) -> AppResult<i32> {
    let duration = requested.unwrap_or(config.default_duration_minutes);
    if duration < config.min_duration_minutes || duration > config.max_duration_minutes {
        return Err(AppError::Validation(format!(
            "Duration must be between {} and {} minutes",
            config.min_duration_minutes, config.max_duration_minutes
        )));
    }
    Ok(duration)
}

/// Restrict a listing query to what the actor may see
pub fn scope_query(actor: &User, mut query: AppointmentQuery) -> AppointmentQuery {
    match actor.role {
        Role::Admin => {}
        Role::Counsellor => {
            query.counsellor_id = Some(actor.id.clone());
            query.user_id = None;
        }
        Role::Youth => {
            query.user_id = Some(actor.id.clone());
            query.counsellor_id = None;
        }
    }
    query
}

#[derive(Clone)]
pub struct AppointmentsService {
    repository: Repository,
    email: EmailService,
    config: BookingConfig,
}

impl AppointmentsService {
    pub fn new(repository: Repository, email: EmailService, config: BookingConfig) -> Self {
        Self { repository, email, config }
    }

    /// Book a session for an active youth user
    pub async fn book(&self, client: &User, data: BookAppointment, now: DateTime<Utc>) -> AppResult<Appointment> {
        if client.role != Role::Youth {
            return Err(AppError::Authorization(
                "Only youth users can book appointments".to_string(),
            ));
        }
        if !client.is_active {
            return Err(AppError::Authorization("Account is disabled".to_string()));
        }
        if data.appointment_date <= now {
            return Err(AppError::Validation(
                "Appointment date must be in the future".to_string(),
            ));
        }
        let duration = resolve_duration(data.duration, &self.config)?;

        let counsellor_id = data.counsellor_id.trim();
        let counsellor = self
            .repository
            .counsellors
            .find(counsellor_id)
            .await?
            .filter(|p| p.is_active)
            .ok_or_else(|| {
                AppError::NotFound(format!("Counsellor {} is not available", counsellor_id))
            })?;

        let appointment = self
            .repository
            .appointments
            .create(&NewAppointment {
                counsellor_id: counsellor.id.clone(),
                user_id: client.id.clone(),
                appointment_date: data.appointment_date,
                duration,
                session_type: data.session_type,
                user_notes: data.user_notes.filter(|n| !n.trim().is_empty()),
            })
            .await?;

        tracing::info!(
            appointment_id = %appointment.id,
            counsellor_id = %counsellor.id,
            user_id = %client.id,
            "Appointment booked"
        );

        let email = self.email.clone();
        let booked = appointment.clone();
        let client = client.clone();
        tokio::spawn(async move {
            let parties = AppointmentParties {
                client_name: &client.display_name,
                client_email: &client.email,
                counsellor_name: &counsellor.display_name,
                counsellor_email: &counsellor.email,
            };
            if let Err(e) = email.send_appointment_confirmation(&booked, &parties).await {
                tracing::warn!(appointment_id = %booked.id, "Client confirmation not sent: {}", e);
            }
            if let Err(e) = email.send_new_appointment_notice(&booked, &parties).await
            {
                tracing::warn!(appointment_id = %booked.id, "Counsellor notice not sent: {}", e);
            }
        });

        Ok(appointment)
    }

    pub async fn list(&self, actor: &User, query: AppointmentQuery) -> AppResult<(Vec<Appointment>, i64)> {
        self.repository
            .appointments
            .search(&scope_query(actor, query))
            .await
    }

    pub async fn update_status(
        &self,
        actor: &User,
        id: Uuid,
        next: AppointmentStatus,
    ) -> AppResult<Appointment> {
        let appointment = self.repository.appointments.get(id).await?;
        authorize_transition(actor, &appointment, next)?;

        let updated = self
            .repository
            .appointments
            .update_status(id, appointment.status, next)
            .await?;
        tracing::info!(
            appointment_id = %id,
            from = %appointment.status,
            to = %next,
            actor = %actor.id,
            "Appointment status changed"
        );
        Ok(updated)
    }

    /// Email the client a reminder of an upcoming session
    pub async fn send_reminder(&self, actor: &User, id: Uuid, now: DateTime<Utc>) -> AppResult<()> {
        let appointment = self.repository.appointments.get(id).await?;
        authorize_reminder(actor, &appointment, now)?;

        let client = self.repository.users.get_by_id(&appointment.user_id).await?;
        let counsellor = self.repository.counsellors.get(&appointment.counsellor_id).await?;
        let parties = AppointmentParties {
            client_name: &client.display_name,
            client_email: &client.email,
            counsellor_name: &counsellor.display_name,
            counsellor_email: &counsellor.email,
        };
        self.email
            .send_appointment_reminder(&appointment, &parties)
            .await?;

        tracing::info!(appointment_id = %id, actor = %actor.id, "Appointment reminder sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::SessionType;

    fn user(id: &str, role: Role) -> User {
        let now = Utc::now();
        User {
            id: id.to_string(),
            email: format!("{}@example.com", id),
            display_name: id.to_string(),
            role,
            age: None,
            is_active: true,
            is_professional: false,
            qualifications: None,
            role_assigned_at: None,
            role_assigned_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn appointment(status: AppointmentStatus) -> Appointment {
        let now = Utc::now();
        Appointment {
            id: Uuid::new_v4(),
            counsellor_id: "c1".to_string(),
            user_id: "y1".to_string(),
            appointment_date: now,
            duration: 50,
            session_type: SessionType::Video,
            status,
            user_notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_counsellor_transitions() {
        let counsellor = user("c1", Role::Counsellor);
        let scheduled = appointment(AppointmentStatus::Scheduled);
        assert!(authorize_transition(&counsellor, &scheduled, AppointmentStatus::Confirmed).is_ok());
        assert!(matches!(
            authorize_transition(&counsellor, &scheduled, AppointmentStatus::Completed),
            Err(AppError::BusinessRule(_))
        ));

        let confirmed = appointment(AppointmentStatus::Confirmed);
        assert!(authorize_transition(&counsellor, &confirmed, AppointmentStatus::NoShow).is_ok());
    }

    #[test]
    fn test_client_may_only_cancel() {
        let client = user("y1", Role::Youth);
        let scheduled = appointment(AppointmentStatus::Scheduled);
        assert!(authorize_transition(&client, &scheduled, AppointmentStatus::Cancelled).is_ok());
        assert!(matches!(
            authorize_transition(&client, &scheduled, AppointmentStatus::Confirmed),
            Err(AppError::Authorization(_))
        ));
    }

    #[test]
    fn test_outsiders_rejected() {
        let other = user("c2", Role::Counsellor);
        let scheduled = appointment(AppointmentStatus::Scheduled);
        assert!(matches!(
            authorize_transition(&other, &scheduled, AppointmentStatus::Cancelled),
            Err(AppError::Authorization(_))
        ));

        let admin = user("a1", Role::Admin);
        assert!(authorize_transition(&admin, &scheduled, AppointmentStatus::Cancelled).is_ok());
    }

    #[test]
    fn test_terminal_states_are_final() {
        let admin = user("a1", Role::Admin);
        for status in [
            AppointmentStatus::Completed,
            AppointmentStatus::Cancelled,
            AppointmentStatus::NoShow,
        ] {
            let done = appointment(status);
            assert!(matches!(
                authorize_transition(&admin, &done, AppointmentStatus::Confirmed),
                Err(AppError::BusinessRule(_))
            ));
        }
    }

    #[test]
    fn test_reminder_rules() {
        let now = Utc::now();
        let mut upcoming = appointment(AppointmentStatus::Confirmed);
        upcoming.appointment_date = now + chrono::Duration::hours(20);

        assert!(authorize_reminder(&user("c1", Role::Counsellor), &upcoming, now).is_ok());
        assert!(authorize_reminder(&user("a1", Role::Admin), &upcoming, now).is_ok());
        assert!(matches!(
            authorize_reminder(&user("y1", Role::Youth), &upcoming, now),
            Err(AppError::Authorization(_))
        ));
        assert!(matches!(
            authorize_reminder(&user("c2", Role::Counsellor), &upcoming, now),
            Err(AppError::Authorization(_))
        ));

        let mut cancelled = upcoming.clone();
        cancelled.status = AppointmentStatus::Cancelled;
        assert!(matches!(
            authorize_reminder(&user("c1", Role::Counsellor), &cancelled, now),
            Err(AppError::BusinessRule(_))
        ));

        let past = appointment(AppointmentStatus::Scheduled);
        assert!(matches!(
            authorize_reminder(&user("c1", Role::Counsellor), &past, now + chrono::Duration::minutes(1)),
            Err(AppError::BusinessRule(_))
        ));
    }

    #[test]
    fn test_resolve_duration() {
        let config = BookingConfig::default();
        assert_eq!(resolve_duration(None, &config).unwrap(), 50);
        assert_eq!(resolve_duration(Some(15), &config).unwrap(), 15);
        assert!(resolve_duration(Some(10), &config).is_err());
        assert!(resolve_duration(Some(181), &config).is_err());
    }

    #[test]
    fn test_scope_query() {
        let query = AppointmentQuery {
            counsellor_id: Some("c9".to_string()),
            user_id: Some("y9".to_string()),
            ..Default::default()
        };

        let scoped = scope_query(&user("y1", Role::Youth), query.clone());
        assert_eq!(scoped.user_id.as_deref(), Some("y1"));
        assert!(scoped.counsellor_id.is_none());

        let scoped = scope_query(&user("c1", Role::Counsellor), query.clone());
        assert_eq!(scoped.counsellor_id.as_deref(), Some("c1"));
        assert!(scoped.user_id.is_none());

        let scoped = scope_query(&user("a1", Role::Admin), query);
        assert_eq!(scoped.counsellor_id.as_deref(), Some("c9"));
    }
}
