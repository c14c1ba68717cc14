use crate::dto::public_dto::{
    CourseRegistrationRequest, RegisteredUser, RegistrationResponse, RegistrationStatusResponse,
};
use crate::error::{Error, Result};
use crate::models::enrollment::{EnrollmentDetail, EnrollmentStatus};
use crate::models::user::{is_guest_email, ContactDetails, NewUser, UserRole};
use crate::repositories::Repositories;
use crate::utils::crypto::hash_password;
use crate::utils::token::generate_password;

const REGISTRATION_SUBMITTED: &str =
    "Registration submitted successfully! Waiting for admin approval.";

#[derive(Clone)]
pub struct EnrollmentService {
    repos: Repositories,
}

impl EnrollmentService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    /// Phone-keyed course registration. A declined enrollment is reopened as pending;
    /// a live one is reported back as a conflict.
    pub async fn register_for_course(
        &self,
        course_id: i64,
        req: CourseRegistrationRequest,
    ) -> Result<RegistrationResponse> {
        self.repos
            .courses
            .find_by_id(course_id)
            .await?
            .ok_or_else(|| Error::NotFound("Course not found".to_string()))?;

        let phone = req.phone_number.trim().to_string();

        if let Some(user) = self.repos.users.find_by_phone(&phone).await? {
            let status = match self.repos.enrollments.find_for(user.id, course_id).await? {
                Some(existing) if existing.status.is_live() => {
                    tracing::info!(user_id = user.id, course_id, status = %existing.status, "duplicate registration");
                    return Err(Error::AlreadyRegistered(existing.status));
                }
                Some(declined) => {
                    self.repos
                        .enrollments
                        .update_status(declined.id, EnrollmentStatus::Pending)
                        .await?
                        .ok_or_else(|| Error::NotFound("Enrollment not found".to_string()))?
                        .status
                }
                None => self.repos.enrollments.create(user.id, course_id).await?.status,
            };

            tracing::info!(user_id = user.id, course_id, "registration reopened for known phone");
            return Ok(RegistrationResponse {
                message: REGISTRATION_SUBMITTED.to_string(),
                status,
                existing_account: true,
                user: Some(RegisteredUser {
                    id: user.id,
                    name: user.name,
                    email: user.email,
                }),
            });
        }

        let email = req.email.trim().to_lowercase();
        if is_guest_email(&email) {
            return Err(Error::BadRequest("This email domain is reserved".to_string()));
        }
        if self.repos.users.find_by_email(&email).await?.is_some() {
            return Err(Error::Conflict("Email already registered".to_string()));
        }

        let password = req
            .password
            .clone()
            .unwrap_or_else(|| generate_password(16));
        let (user, enrollment) = self
            .repos
            .enrollments
            .register_student(
                NewUser {
                    email,
                    password_hash: hash_password(&password)?,
                    name: req.name.trim().to_string(),
                    role: UserRole::Student,
                    contact: ContactDetails {
                        phone_number: Some(phone),
                        address: Some(req.address),
                        city: req.city,
                        postal_code: req.postal_code,
                        facebook_url: req.facebook_url,
                    },
                },
                course_id,
            )
            .await?;

        tracing::info!(user_id = user.id, course_id, "new student registered");

        Ok(RegistrationResponse {
            message: REGISTRATION_SUBMITTED.to_string(),
            status: enrollment.status,
            existing_account: false,
            user: Some(RegisteredUser {
                id: user.id,
                name: user.name,
                email: user.email,
            }),
        })
    }

    pub async fn check_registration_status(
        &self,
        course_id: i64,
        phone_number: &str,
    ) -> Result<RegistrationStatusResponse> {
        let Some(user) = self.repos.users.find_by_phone(phone_number.trim()).await? else {
            return Ok(RegistrationStatusResponse::not_registered(
                "Phone number not registered",
            ));
        };
        let enrollment = match self.repos.enrollments.find_for(user.id, course_id).await? {
            Some(e) if e.status.is_live() => e,
            _ => {
                return Ok(RegistrationStatusResponse::not_registered(
                    "Not registered for this course",
                ))
            }
        };
        let course_name = self
            .repos
            .courses
            .find_by_id(course_id)
            .await?
            .map(|c| c.title);

        Ok(RegistrationStatusResponse {
            registered: true,
            message: None,
            status: Some(enrollment.status),
            name: Some(user.name),
            email: Some(user.email),
            course_name,
            enrolled_at: Some(enrollment.created_at),
        })
    }

    pub async fn list_enrollments(&self, course_id: i64) -> Result<Vec<EnrollmentDetail>> {
        self.repos.enrollments.list_live_by_course(course_id).await
    }

    pub async fn update_enrollment_status(
        &self,
        enrollment_id: i64,
        status: EnrollmentStatus,
    ) -> Result<EnrollmentStatus> {
        let updated = self
            .repos
            .enrollments
            .update_status(enrollment_id, status)
            .await?
            .ok_or_else(|| Error::NotFound("Enrollment not found".to_string()))?;
        tracing::info!(enrollment_id, status = %updated.status, "enrollment status updated");
        Ok(updated.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::course::{Course, CourseDraft};

    async fn course(repos: &Repositories) -> Course {
        repos
            .courses
            .create(CourseDraft {
                title: "Baking".into(),
                description: String::new(),
                student_limit: 50,
                retry_count: 3,
                exam_time: 60,
                is_active: true,
            })
            .await
            .unwrap()
    }

    fn request(phone: &str, email: &str) -> CourseRegistrationRequest {
        CourseRegistrationRequest {
            name: "Sam Ortiz".into(),
            email: email.into(),
            phone_number: phone.into(),
            address: "1 Main St".into(),
            city: None,
            postal_code: None,
            facebook_url: None,
            password: None,
        }
    }

    #[tokio::test]
    async fn new_phone_creates_account_and_pending_enrollment() {
        let repos = Repositories::in_memory();
        let course = course(&repos).await;
        let service = EnrollmentService::new(repos.clone());

        let res = service
            .register_for_course(course.id, request("+1555", "sam@example.com"))
            .await
            .unwrap();
        assert_eq!(res.status, EnrollmentStatus::Pending);
        assert!(!res.existing_account);

        let status = service
            .check_registration_status(course.id, "+1555")
            .await
            .unwrap();
        assert!(status.registered);
        assert_eq!(status.course_name.as_deref(), Some("Baking"));
    }

    #[tokio::test]
    async fn live_enrollment_is_a_conflict() {
        let repos = Repositories::in_memory();
        let course = course(&repos).await;
        let service = EnrollmentService::new(repos);
        service
            .register_for_course(course.id, request("+1555", "sam@example.com"))
            .await
            .unwrap();

        let err = service
            .register_for_course(course.id, request("+1555", "sam@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::AlreadyRegistered(EnrollmentStatus::Pending)
        ));
    }

    #[tokio::test]
    async fn declined_enrollment_is_reopened_in_place() {
        let repos = Repositories::in_memory();
        let course = course(&repos).await;
        let service = EnrollmentService::new(repos.clone());
        service
            .register_for_course(course.id, request("+1555", "sam@example.com"))
            .await
            .unwrap();
        let first = service.list_enrollments(course.id).await.unwrap()[0].id;
        service
            .update_enrollment_status(first, EnrollmentStatus::Declined)
            .await
            .unwrap();

        let declined = service
            .check_registration_status(course.id, "+1555")
            .await
            .unwrap();
        assert!(!declined.registered);

        let res = service
            .register_for_course(course.id, request("+1555", "sam@example.com"))
            .await
            .unwrap();
        assert_eq!(res.status, EnrollmentStatus::Pending);
        assert!(res.existing_account);

        let live = service.list_enrollments(course.id).await.unwrap();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].id, first);
    }

    #[tokio::test]
    async fn email_collision_for_new_phone_is_rejected() {
        let repos = Repositories::in_memory();
        let course = course(&repos).await;
        let service = EnrollmentService::new(repos);
        service
            .register_for_course(course.id, request("+1555", "sam@example.com"))
            .await
            .unwrap();
        let err = service
            .register_for_course(course.id, request("+1777", "SAM@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[tokio::test]
    async fn missing_enrollment_update_is_not_found() {
        let service = EnrollmentService::new(Repositories::in_memory());
        assert!(matches!(
            service
                .update_enrollment_status(404, EnrollmentStatus::Approved)
                .await,
            Err(Error::NotFound(_))
        ));
    }
}
