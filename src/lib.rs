pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;

use crate::config::Config;
use crate::repositories::Repositories;
use crate::services::{
    attempt_service::AttemptService, auth_service::AuthService, catalog_service::CatalogService,
    eligibility_service::EligibilityService, enrollment_service::EnrollmentService,
    stats_service::StatsService, student_service::StudentService,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub repos: Repositories,
    pub auth_service: AuthService,
    pub catalog_service: CatalogService,
    pub eligibility_service: EligibilityService,
    pub attempt_service: AttemptService,
    pub enrollment_service: EnrollmentService,
    pub stats_service: StatsService,
    pub student_service: StudentService,
}

impl AppState {
    pub fn new(config: Config, repos: Repositories) -> Self {
        let config = Arc::new(config);
        let eligibility_service =
            EligibilityService::new(repos.clone(), config.guest_device_attempt_cap);

        Self {
            auth_service: AuthService::new(repos.clone(), config.clone()),
            catalog_service: CatalogService::new(repos.clone()),
            attempt_service: AttemptService::new(repos.clone(), eligibility_service.clone()),
            enrollment_service: EnrollmentService::new(repos.clone()),
            stats_service: StatsService::new(repos.clone()),
            student_service: StudentService::new(repos.clone()),
            eligibility_service,
            repos,
            config,
        }
    }
}
