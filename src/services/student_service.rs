use std::collections::{BTreeMap, HashMap};

use crate::dto::admin_dto::{CourseStudent, StudentSummary};
use crate::error::{Error, Result};
use crate::models::attempt::{percentage, AttemptWithStudent};
use crate::models::user::UserRole;
use crate::repositories::Repositories;

#[derive(Clone)]
pub struct StudentService {
    repos: Repositories,
}

impl StudentService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    pub async fn list_students(&self) -> Result<Vec<StudentSummary>> {
        let students = self.repos.users.list_by_role(UserRole::Student).await?;
        let counts: HashMap<i64, (i64, i64)> = self
            .repos
            .attempts
            .counts_by_student()
            .await?
            .into_iter()
            .map(|c| (c.student_id, (c.total_attempts, c.courses_attempted)))
            .collect();

        Ok(students
            .into_iter()
            .map(|s| {
                let (attempt_count, enrolled_count) = counts.get(&s.id).copied().unwrap_or((0, 0));
                StudentSummary {
                    id: s.id,
                    name: s.name,
                    email: s.email,
                    attempt_count,
                    enrolled_count,
                    created_at: s.created_at,
                }
            })
            .collect())
    }

    /// Everyone who attempted the course, best result first.
    pub async fn students_by_course(&self, course_id: i64) -> Result<Vec<CourseStudent>> {
        let attempts = self
            .repos
            .attempts
            .list_by_course_with_student(course_id)
            .await?;

        let mut grouped: BTreeMap<i64, Vec<AttemptWithStudent>> = BTreeMap::new();
        for attempt in attempts {
            grouped.entry(attempt.student_id).or_default().push(attempt);
        }

        let mut rows = Vec::with_capacity(grouped.len());
        for (student_id, attempts) in grouped {
            let Some(latest) = attempts.iter().max_by_key(|a| (a.start_time, a.id)) else {
                continue;
            };
            let best_score = attempts.iter().map(|a| a.score).max().unwrap_or(0);
            let best_percentage = attempts
                .iter()
                .map(|a| percentage(a.score as i64, a.total_points as i64))
                .fold(0.0, f64::max);
            rows.push(CourseStudent {
                id: student_id,
                name: latest
                    .student_name
                    .clone()
                    .unwrap_or_else(|| "Unknown".to_string()),
                email: latest.student_email.clone().unwrap_or_default(),
                attempts_in_course: attempts.len() as i64,
                best_score,
                best_percentage,
                last_attempt_date: latest.start_time,
                status: latest.status,
                created_at: latest.student_created_at,
            });
        }

        rows.sort_by(|a, b| b.best_percentage.total_cmp(&a.best_percentage));
        Ok(rows)
    }

    /// Soft-deletes a student and their attempts.
    pub async fn delete_student(&self, id: i64) -> Result<()> {
        let is_student = self
            .repos
            .users
            .find_by_id(id)
            .await?
            .is_some_and(|u| u.role == UserRole::Student);
        if !is_student {
            return Err(Error::NotFound("Student not found".to_string()));
        }

        let attempts = self
            .repos
            .users
            .soft_delete_with_attempts(id)
            .await?
            .ok_or_else(|| Error::NotFound("Student not found".to_string()))?;
        tracing::info!(student_id = id, attempts, "student deleted");
        Ok(())
    }
}
