pub mod attempt_service;
pub mod auth_service;
pub mod catalog_service;
pub mod eligibility_service;
pub mod enrollment_service;
pub mod grading_service;
pub mod stats_service;
pub mod student_service;
