//! Business logic services

pub mod appointments;
pub mod counsellors;
pub mod email;
pub mod ratings;
pub mod settings;
pub mod stats;
pub mod stats_board;
pub mod users;

use std::sync::Arc;

use crate::{config::AppConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub repository: Repository,
    pub users: users::UsersService,
    pub counsellors: counsellors::CounsellorsService,
    pub appointments: appointments::AppointmentsService,
    pub ratings: ratings::RatingsService,
    pub settings: settings::SettingsService,
    pub stats: stats::StatsService,
    pub email: email::EmailService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, config: &AppConfig) -> Self {
        let email = email::EmailService::new(config.email.clone());
        Self {
            users: users::UsersService::new(repository.clone(), email.clone()),
            counsellors: counsellors::CounsellorsService::new(repository.clone()),
            appointments: appointments::AppointmentsService::new(
                repository.clone(),
                email.clone(),
                config.booking.clone(),
            ),
            ratings: ratings::RatingsService::new(repository.clone()),
            settings: settings::SettingsService::new(repository.clone()),
            stats: stats::StatsService::new(Arc::new(repository.clone())),
            email,
            repository,
        }
    }
}
