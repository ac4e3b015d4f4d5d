//! Email service for account and appointment notifications

use chrono::{DateTime, Duration, Utc};
use lettre::{
    message::{header::ContentType, Attachment, Mailbox, Message, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    SmtpTransport, Transport,
};
use std::str::FromStr;

use crate::{
    config::EmailConfig,
    error::{AppError, AppResult},
    models::{
        appointment::Appointment,
        enums::{Role, SessionType},
    },
};

/// People named in an appointment email
pub struct AppointmentParties<'a> {
    pub client_name: &'a str,
    pub client_email: &'a str,
    pub counsellor_name: &'a str,
    pub counsellor_email: &'a str,
}

#[derive(Clone)]
pub struct EmailService {
    config: EmailConfig,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    /// Welcome message after registration
    pub async fn send_welcome(&self, to: &str, name: &str, role: Role) -> AppResult<()> {
        let subject = "Welcome to MindBridge - Your Mental Health Journey Starts Here";
        let body = welcome_body(name, role);
        self.send_email(to, subject, &body, None).await
    }

    /// Confirmation sent to the client who booked, with a calendar invite
    pub async fn send_appointment_confirmation(
        &self,
        appointment: &Appointment,
        parties: &AppointmentParties<'_>,
    ) -> AppResult<()> {
        let subject = "Appointment Confirmation - MindBridge";
        let body = confirmation_body(appointment, parties);
        let invite = calendar_attachment(appointment_ics(appointment, parties, Utc::now()))?;
        self.send_email(parties.client_email, subject, &body, Some(invite))
            .await
    }

    /// Notice sent to the counsellor who was booked
    pub async fn send_new_appointment_notice(
        &self,
        appointment: &Appointment,
        parties: &AppointmentParties<'_>,
    ) -> AppResult<()> {
        let subject = "New Appointment Booked - MindBridge";
        let body = new_appointment_body(appointment, parties);
        self.send_email(parties.counsellor_email, subject, &body, None)
            .await
    }

    /// Reminder sent to the client ahead of a session
    pub async fn send_appointment_reminder(
        &self,
        appointment: &Appointment,
        parties: &AppointmentParties<'_>,
    ) -> AppResult<()> {
        let subject = format!("Reminder: Appointment with {}", parties.counsellor_name);
        let body = reminder_body(appointment, parties);
        self.send_email(parties.client_email, &subject, &body, None)
            .await
    }

    /// Generic email sending function
    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        body: &str,
        attachment: Option<SinglePart>,
    ) -> AppResult<()> {
        if !self.config.enabled {
            tracing::info!(to, subject, "Email delivery disabled, skipping");
            return Ok(());
        }

        let email = self.build_message(to, subject, body, attachment)?;
        let mailer = self.build_transport()?;

        // SmtpTransport is blocking
        tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| AppError::Internal(format!("Email task failed: {}", e)))?
            .map_err(|e| AppError::Internal(format!("Failed to send email: {}", e)))?;

        tracing::info!(to, subject, "Email sent");
        Ok(())
    }

    fn build_message(
        &self,
        to: &str,
        subject: &str,
        body: &str,
        attachment: Option<SinglePart>,
    ) -> AppResult<Message> {
        let from_name = self
            .config
            .smtp_from_name
            .as_deref()
            .unwrap_or("MindBridge");
        let from_mailbox = Mailbox::from_str(&format!("{} <{}>", from_name, self.config.smtp_from))
            .map_err(|e| AppError::Internal(format!("Invalid from address: {}", e)))?;

        let to_mailbox = Mailbox::from_str(to)
            .map_err(|e| AppError::Internal(format!("Invalid to address: {}", e)))?;

        let alternative = MultiPart::alternative()
            .singlepart(
                SinglePart::builder()
                    .header(ContentType::TEXT_PLAIN)
                    .body(body.to_string()),
            )
            .singlepart(
                SinglePart::builder()
                    .header(ContentType::TEXT_HTML)
                    .body(html_body(body)),
            );

        let builder = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(subject);
        match attachment {
            Some(part) => builder.multipart(MultiPart::mixed().multipart(alternative).singlepart(part)),
            None => builder.multipart(alternative),
        }
        .map_err(|e| AppError::Internal(format!("Failed to build email: {}", e)))
    }

    fn build_transport(&self) -> AppResult<SmtpTransport> {
        let mailer_builder = if self.config.smtp_use_tls {
            SmtpTransport::starttls_relay(&self.config.smtp_host)
                .map_err(|e| AppError::Internal(format!("Failed to create SMTP transport: {}", e)))?
        } else {
            SmtpTransport::builder_dangerous(&self.config.smtp_host)
        }
        .port(self.config.smtp_port);

        let mailer_builder = if let (Some(username), Some(password)) = (
            &self.config.smtp_username,
            &self.config.smtp_password,
        ) {
            mailer_builder.credentials(Credentials::new(username.clone(), password.clone()))
        } else {
            mailer_builder
        };

        Ok(mailer_builder.build())
    }
}

/// Escape text for inclusion in HTML
fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// HTML alternative of a plain-text body
pub(crate) fn html_body(body: &str) -> String {
    format!(
        r#"<html><body><pre>{}</pre></body></html>"#,
        escape_html(body).replace('\n', "<br>")
    )
}

fn calendar_attachment(ics: String) -> AppResult<SinglePart> {
    let content_type = ContentType::parse("text/calendar; charset=utf-8; method=REQUEST")
        .map_err(|e| AppError::Internal(format!("Invalid calendar content type: {}", e)))?;
    Ok(Attachment::new("appointment.ics".to_string()).body(ics, content_type))
}

fn session_label(appointment: &Appointment) -> String {
    format!("{} counselling session", appointment.session_type)
}

fn session_location(session_type: SessionType) -> &'static str {
    match session_type {
        SessionType::Video => "Online Video Call",
        SessionType::Audio => "Audio Call",
        SessionType::Chat => "Online Chat",
    }
}

fn ics_time(at: DateTime<Utc>) -> String {
    at.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Escape a TEXT value (RFC 5545 section 3.3.11)
fn ics_text(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace(';', "\\;")
        .replace(',', "\\,")
        .replace('\n', "\\n")
}

fn ics_param(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "'"))
}

/// Single-event iCalendar invite for an appointment
pub(crate) fn appointment_ics(
    appointment: &Appointment,
    parties: &AppointmentParties<'_>,
    stamp: DateTime<Utc>,
) -> String {
    let start = appointment.appointment_date;
    let end = start + Duration::minutes(i64::from(appointment.duration));
    let description = format!(
        "Mental health counselling session with {}\n\nSession Type: {}\n\nMindBridge Platform",
        parties.counsellor_name, appointment.session_type
    );

    let lines = [
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        "PRODID:-//MindBridge//Appointments//EN".to_string(),
        "METHOD:REQUEST".to_string(),
        "BEGIN:VEVENT".to_string(),
        format!("UID:{}@mindbridge", appointment.id),
        format!("DTSTAMP:{}", ics_time(stamp)),
        format!("DTSTART:{}", ics_time(start)),
        format!("DTEND:{}", ics_time(end)),
        format!(
            "SUMMARY:{}",
            ics_text(&format!("Counselling Session with {}", parties.counsellor_name))
        ),
        format!("DESCRIPTION:{}", ics_text(&description)),
        format!("LOCATION:{}", session_location(appointment.session_type)),
        format!(
            "ORGANIZER;CN={}:mailto:{}",
            ics_param(parties.counsellor_name),
            parties.counsellor_email
        ),
        format!(
            "ATTENDEE;CN={};RSVP=TRUE:mailto:{}",
            ics_param(parties.client_name),
            parties.client_email
        ),
        "END:VEVENT".to_string(),
        "END:VCALENDAR".to_string(),
    ];
    let mut ics = lines.join("\r\n");
    ics.push_str("\r\n");
    ics
}

pub(crate) fn welcome_body(name: &str, role: Role) -> String {
    let role_text = match role {
        Role::Youth => "As a youth user, you can book counselling sessions and connect with professional support.",
        Role::Counsellor => "As a counsellor, you can manage your profile, set availability, and help young people on their mental health journey.",
        Role::Admin => "As an admin, you have access to platform management tools and user oversight capabilities.",
    };
    format!(
        r#"
Welcome to MindBridge, {name}!

Thank you for joining our mental health support platform. We're excited to have you as part of our community.

{role_text}

If you have any questions, our support team is here to help.

Best regards,
The MindBridge Team

---
This email was sent to you because you registered for a MindBridge account.
If you didn't create this account, please contact our support team.
"#,
        name = name,
        role_text = role_text,
    )
}

pub(crate) fn confirmation_body(appointment: &Appointment, parties: &AppointmentParties<'_>) -> String {
    format!(
        r#"
Appointment Confirmed!

Dear {client},

Your appointment has been successfully booked:

Counsellor: {counsellor}
Date: {date}
Time: {time} UTC
Type: {kind}
Duration: {duration} minutes

Please save the attached calendar file (.ics) to add this appointment to your calendar.
Please be ready a few minutes early. Contact us 24 hours in advance for changes.

Best regards,
The MindBridge Team
"#,
        client = parties.client_name,
        counsellor = parties.counsellor_name,
        date = appointment.appointment_date.format("%A %d %B %Y"),
        time = appointment.appointment_date.format("%H:%M"),
        kind = session_label(appointment),
        duration = appointment.duration,
    )
}

pub(crate) fn new_appointment_body(appointment: &Appointment, parties: &AppointmentParties<'_>) -> String {
    format!(
        r#"
New Appointment Booked

Dear {counsellor},

A new appointment has been booked with you:

Client: {client}
Date: {date}
Time: {time} UTC
Type: {kind}
Duration: {duration} minutes
Notes: {notes}

Please prepare for the session.

Best regards,
The MindBridge Team
"#,
        counsellor = parties.counsellor_name,
        client = parties.client_name,
        date = appointment.appointment_date.format("%A %d %B %Y"),
        time = appointment.appointment_date.format("%H:%M"),
        kind = session_label(appointment),
        duration = appointment.duration,
        notes = appointment.user_notes.as_deref().unwrap_or("No additional notes"),
    )
}

pub(crate) fn reminder_body(appointment: &Appointment, parties: &AppointmentParties<'_>) -> String {
    format!(
        r#"
Appointment Reminder

Hello {client},

This is a friendly reminder about your upcoming counselling appointment:

Counsellor: {counsellor}
Date: {date}
Time: {time} UTC

Please make sure you're prepared for your session. If you need to reschedule, please contact us as soon as possible.

Best regards,
The MindBridge Team
"#,
        client = parties.client_name,
        counsellor = parties.counsellor_name,
        date = appointment.appointment_date.format("%A %d %B %Y"),
        time = appointment.appointment_date.format("%H:%M"),
    )
}
