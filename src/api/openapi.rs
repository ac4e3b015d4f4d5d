//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{appointments, counsellors, health, ratings, settings, stats, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "MindBridge API",
        version = "1.0.0",
        description = "Counselling booking and practice statistics REST API",
        contact(name = "MindBridge Team", email = "contact@mindbridge.org")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Users
        users::register,
        users::me,
        users::list_users,
        users::update_role,
        users::set_active,
        users::export_users,
        users::delete_user,
        // Counsellors
        counsellors::list_counsellors,
        counsellors::get_counsellor,
        counsellors::update_counsellor,
        counsellors::list_ratings,
        // Settings
        settings::get_settings,
        settings::update_settings,
        // Stats
        stats::get_counsellor_stats,
        // Appointments
        appointments::book_appointment,
        appointments::list_appointments,
        appointments::update_status,
        appointments::send_reminder,
        // Ratings
        ratings::submit_rating,
    ),
    components(
        schemas(
            // Users
            crate::models::user::User,
            crate::models::user::RegisterUser,
            crate::models::user::UserQuery,
            crate::models::user::UpdateRole,
            crate::models::user::UpdateActive,
            crate::models::user::DeleteUserQuery,
            crate::models::enums::Role,
            crate::api::UserPage,
            // Counsellors
            crate::models::counsellor::CounsellorProfile,
            crate::models::counsellor::CounsellorListing,
            crate::models::counsellor::DirectoryQuery,
            crate::models::counsellor::UpdateProfile,
            crate::api::CounsellorPage,
            // Settings
            crate::models::settings::CounsellorSettings,
            crate::models::settings::UpdateWorkingHours,
            crate::models::settings::DaySchedule,
            // Stats
            crate::models::stats::CounsellorStats,
            crate::models::stats::MeasuredCount,
            crate::models::stats::MeasuredValue,
            crate::models::stats::FieldStatus,
            crate::models::stats::SnapshotStatus,
            crate::models::stats::BoardState,
            crate::models::stats::BoardView,
            crate::models::stats::StatsQuery,
            // Appointments
            crate::models::appointment::Appointment,
            crate::models::appointment::BookAppointment,
            crate::models::appointment::UpdateAppointmentStatus,
            crate::models::appointment::AppointmentQuery,
            crate::models::enums::AppointmentStatus,
            crate::models::enums::SessionType,
            crate::api::AppointmentPage,
            // Ratings
            crate::models::rating::Rating,
            crate::models::rating::SubmitRating,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "users", description = "Registration and user management"),
        (name = "counsellors", description = "Counsellor directory"),
        (name = "settings", description = "Counsellor working hours"),
        (name = "stats", description = "Counsellor practice statistics"),
        (name = "appointments", description = "Appointment booking"),
        (name = "ratings", description = "Appointment ratings")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
