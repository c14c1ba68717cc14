use crate::dto::catalog_dto::{
    CourseDetail, CourseRequest, CourseWithPackages, PackageWithQuestions, QuestionRequest,
    QuizPackageRequest,
};
use crate::error::{Error, Result};
use crate::models::course::Course;
use crate::models::question::{Question, QuestionType};
use crate::models::quiz_package::QuizPackage;
use crate::repositories::Repositories;

#[derive(Clone)]
pub struct CatalogService {
    repos: Repositories,
}

impl CatalogService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    async fn require_course(&self, id: i64) -> Result<Course> {
        self.repos
            .courses
            .find_by_id(id)
            .await?
            .ok_or_else(|| Error::NotFound("Course not found".to_string()))
    }

    async fn require_package(&self, id: i64) -> Result<QuizPackage> {
        self.repos
            .packages
            .find_by_id(id)
            .await?
            .ok_or_else(|| Error::NotFound("Quiz package not found".to_string()))
    }

    // Courses

    pub async fn list_courses(&self) -> Result<Vec<CourseWithPackages>> {
        let courses = self.repos.courses.list().await?;
        let mut out = Vec::with_capacity(courses.len());
        for course in courses {
            let quiz_packages = self.repos.packages.list_by_course(course.id).await?;
            out.push(CourseWithPackages {
                course,
                quiz_packages,
            });
        }
        Ok(out)
    }

    pub async fn get_course(&self, id: i64) -> Result<CourseDetail> {
        let course = self.require_course(id).await?;
        let packages = self.repos.packages.list_by_course(course.id).await?;
        let mut quiz_packages = Vec::with_capacity(packages.len());
        for package in packages {
            let questions = self.repos.questions.list_active_by_package(package.id).await?;
            quiz_packages.push(PackageWithQuestions { package, questions });
        }
        Ok(CourseDetail {
            course,
            quiz_packages,
        })
    }

    pub async fn create_course(&self, req: CourseRequest) -> Result<Course> {
        let course = self.repos.courses.create(req.into_draft(None)).await?;
        tracing::info!(course_id = course.id, "course created");
        Ok(course)
    }

    pub async fn update_course(&self, id: i64, req: CourseRequest) -> Result<Course> {
        let current = self.require_course(id).await?;
        self.repos
            .courses
            .update(id, req.into_draft(Some(&current)))
            .await?
            .ok_or_else(|| Error::NotFound("Course not found".to_string()))
    }

    pub async fn delete_course(&self, id: i64) -> Result<()> {
        if !self.repos.courses.soft_delete(id).await? {
            return Err(Error::NotFound("Course not found".to_string()));
        }
        tracing::info!(course_id = id, "course deleted");
        Ok(())
    }

    // Quiz packages

    pub async fn list_packages(&self, course_id: i64) -> Result<Vec<QuizPackage>> {
        self.repos.packages.list_by_course(course_id).await
    }

    pub async fn get_package(&self, id: i64) -> Result<PackageWithQuestions> {
        let package = self.require_package(id).await?;
        let questions = self.repos.questions.list_active_by_package(package.id).await?;
        Ok(PackageWithQuestions { package, questions })
    }

    pub async fn create_package(&self, req: QuizPackageRequest) -> Result<QuizPackage> {
        if self.repos.courses.find_by_id(req.course_id).await?.is_none() {
            return Err(Error::BadRequest("Course does not exist".to_string()));
        }
        let package = self.repos.packages.create(req.into_draft(None)).await?;
        tracing::info!(quiz_package_id = package.id, course_id = package.course_id, "quiz package created");
        Ok(package)
    }

    pub async fn update_package(&self, id: i64, req: QuizPackageRequest) -> Result<QuizPackage> {
        let current = self.require_package(id).await?;
        if req.course_id != current.course_id
            && self.repos.courses.find_by_id(req.course_id).await?.is_none()
        {
            return Err(Error::BadRequest("Course does not exist".to_string()));
        }
        self.repos
            .packages
            .update(id, req.into_draft(Some(&current)))
            .await?
            .ok_or_else(|| Error::NotFound("Quiz package not found".to_string()))
    }

    pub async fn delete_package(&self, id: i64) -> Result<()> {
        if !self.repos.packages.soft_delete(id).await? {
            return Err(Error::NotFound("Quiz package not found".to_string()));
        }
        Ok(())
    }

    // Questions

    pub async fn list_questions(&self, quiz_package_id: i64) -> Result<Vec<Question>> {
        self.repos
            .questions
            .list_active_by_package(quiz_package_id)
            .await
    }

    pub async fn get_question(&self, id: i64) -> Result<Question> {
        self.repos
            .questions
            .find_by_id(id)
            .await?
            .ok_or_else(|| Error::NotFound("Question not found".to_string()))
    }

    fn check_question(req: &QuestionRequest) -> Result<()> {
        if req.question_type == QuestionType::MultipleChoice && req.options.is_empty() {
            return Err(Error::BadRequest(
                "multiple_choice questions need options".to_string(),
            ));
        }
        Ok(())
    }

    pub async fn create_question(&self, req: QuestionRequest) -> Result<Question> {
        Self::check_question(&req)?;
        if self.repos.packages.find_by_id(req.quiz_package_id).await?.is_none() {
            return Err(Error::BadRequest("Quiz package does not exist".to_string()));
        }
        self.repos.questions.create(req.into_draft(None)).await
    }

    pub async fn update_question(&self, id: i64, req: QuestionRequest) -> Result<Question> {
        Self::check_question(&req)?;
        let current = self.get_question(id).await?;
        if req.quiz_package_id != current.quiz_package_id
            && self.repos.packages.find_by_id(req.quiz_package_id).await?.is_none()
        {
            return Err(Error::BadRequest("Quiz package does not exist".to_string()));
        }
        self.repos
            .questions
            .update(id, req.into_draft(Some(&current)))
            .await?
            .ok_or_else(|| Error::NotFound("Question not found".to_string()))
    }

    pub async fn delete_question(&self, id: i64) -> Result<()> {
        if !self.repos.questions.soft_delete(id).await? {
            return Err(Error::NotFound("Question not found".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn course_req(title: &str) -> CourseRequest {
        CourseRequest {
            title: title.into(),
            description: None,
            student_limit: None,
            retry_count: None,
            exam_time: None,
            is_active: None,
        }
    }

    fn question_req(package: i64, order: i32, active: bool) -> QuestionRequest {
        QuestionRequest {
            quiz_package_id: package,
            question_text: format!("Q{}", order),
            question_type: QuestionType::TrueFalse,
            image_url: None,
            options: vec![],
            correct_answer: "true".into(),
            points: Some(2),
            order_number: Some(order),
            is_active: Some(active),
        }
    }

    #[tokio::test]
    async fn package_needs_existing_course() {
        let service = CatalogService::new(Repositories::in_memory());
        let err = service
            .create_package(QuizPackageRequest {
                course_id: 9,
                title: "Orphan".into(),
                description: None,
                max_retake_count: None,
                is_active: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
    }

    #[tokio::test]
    async fn course_detail_lists_active_questions_in_order() {
        let service = CatalogService::new(Repositories::in_memory());
        let course = service.create_course(course_req("Logic")).await.unwrap();
        let package = service
            .create_package(QuizPackageRequest {
                course_id: course.id,
                title: "Basics".into(),
                description: None,
                max_retake_count: None,
                is_active: None,
            })
            .await
            .unwrap();
        service.create_question(question_req(package.id, 2, true)).await.unwrap();
        service.create_question(question_req(package.id, 1, true)).await.unwrap();
        service.create_question(question_req(package.id, 3, false)).await.unwrap();

        let detail = service.get_course(course.id).await.unwrap();
        let orders: Vec<i32> = detail.quiz_packages[0]
            .questions
            .iter()
            .map(|q| q.order_number)
            .collect();
        assert_eq!(orders, vec![1, 2]);
    }

    #[tokio::test]
    async fn multiple_choice_without_options_is_rejected() {
        let service = CatalogService::new(Repositories::in_memory());
        let mut req = question_req(1, 1, true);
        req.question_type = QuestionType::MultipleChoice;
        assert!(matches!(
            service.create_question(req).await,
            Err(Error::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn deleted_course_disappears() {
        let service = CatalogService::new(Repositories::in_memory());
        let course = service.create_course(course_req("Temp")).await.unwrap();
        service.delete_course(course.id).await.unwrap();
        assert!(matches!(
            service.get_course(course.id).await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            service.delete_course(course.id).await,
            Err(Error::NotFound(_))
        ));
    }
}
