//! Read-only aggregates for the admin dashboard. Percentages here are integer floors.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::models::attempt::{
    percent_floor, Attempt, AttemptStatus, AttemptWithStudent, CourseTakerSummary,
    PASS_MARK_PERCENT,
};
use crate::models::user::UserRole;
use crate::repositories::Repositories;

const RECENT_ATTEMPTS: i64 = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScoreDistribution {
    /// 90% and above.
    pub excellent: i64,
    pub good: i64,
    pub average: i64,
    /// Below the pass mark.
    pub poor: i64,
}

impl ScoreDistribution {
    fn record(&mut self, percent: i64) {
        match percent {
            p if p >= 90 => self.excellent += 1,
            p if p >= 80 => self.good += 1,
            p if p >= PASS_MARK_PERCENT => self.average += 1,
            _ => self.poor += 1,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RecentAttempt {
    pub student_name: String,
    pub score: i32,
    pub total_score: i32,
    pub percentage: i64,
    pub completed_at: Option<DateTime<Utc>>,
    pub status: AttemptStatus,
}

impl From<AttemptWithStudent> for RecentAttempt {
    fn from(a: AttemptWithStudent) -> Self {
        Self {
            student_name: a.student_name.unwrap_or_else(|| "Unknown".to_string()),
            score: a.score,
            total_score: a.total_points,
            percentage: percent_floor(a.score as i64, a.total_points as i64),
            completed_at: a.end_time,
            status: a.status,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PackageStats {
    pub total_attempts: i64,
    pub average_score: i64,
    pub pass_rate: i64,
    pub completion_rate: i64,
    pub score_distribution: ScoreDistribution,
    pub recent_attempts: Vec<RecentAttempt>,
}

/// Aggregates a package's attempts. Only completed attempts feed the score figures.
pub fn summarize(attempts: &[Attempt]) -> PackageStats {
    let total_attempts = attempts.len() as i64;
    let mut completed = 0i64;
    let mut score_sum = 0i64;
    let mut passed = 0i64;
    let mut distribution = ScoreDistribution::default();

    for attempt in attempts.iter().filter(|a| a.status == AttemptStatus::Completed) {
        completed += 1;
        score_sum += attempt.score as i64;
        let percent = attempt.percent();
        if percent >= PASS_MARK_PERCENT {
            passed += 1;
        }
        distribution.record(percent);
    }

    let ratio = |n: i64, d: i64| if d > 0 { n * 100 / d } else { 0 };

    PackageStats {
        total_attempts,
        average_score: if completed > 0 { score_sum / completed } else { 0 },
        pass_rate: ratio(passed, completed),
        completion_rate: ratio(completed, total_attempts),
        score_distribution: distribution,
        recent_attempts: Vec::new(),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseStats {
    pub course_id: i64,
    pub course_title: String,
    pub total_attempts: i64,
    /// Distinct devices, standing in for distinct anonymous takers.
    pub unique_students: i64,
    pub students: Vec<CourseTakerSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseRollup {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub enrolled_count: i64,
    pub attempted_count: i64,
    pub total_attempt_count: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CoursesOverview {
    pub total_students: i64,
    pub courses: Vec<CourseRollup>,
}

#[derive(Clone)]
pub struct StatsService {
    repos: Repositories,
}

impl StatsService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    pub async fn package_stats(&self, quiz_package_id: i64) -> Result<PackageStats> {
        self.repos
            .packages
            .find_by_id(quiz_package_id)
            .await?
            .ok_or_else(|| Error::NotFound("Quiz package not found".to_string()))?;

        let attempts = self.repos.attempts.list_by_package(quiz_package_id).await?;
        let mut stats = summarize(&attempts);
        stats.recent_attempts = self
            .repos
            .attempts
            .recent_by_package(quiz_package_id, RECENT_ATTEMPTS)
            .await?
            .into_iter()
            .map(RecentAttempt::from)
            .collect();
        Ok(stats)
    }

    pub async fn course_stats(&self, course_id: i64) -> Result<CourseStats> {
        let course = self
            .repos
            .courses
            .find_by_id(course_id)
            .await?
            .ok_or_else(|| Error::NotFound("Course not found".to_string()))?;

        let counts = self.repos.attempts.counts_by_course(course_id).await?;
        let students = self.repos.attempts.course_taker_summaries(course_id).await?;

        Ok(CourseStats {
            course_id: course.id,
            course_title: course.title,
            total_attempts: counts.total,
            unique_students: counts.distinct_devices,
            students,
        })
    }

    pub async fn courses_overview(&self) -> Result<CoursesOverview> {
        let total_students = self.repos.users.count_by_role(UserRole::Student).await?;
        let courses = self.repos.courses.list().await?;

        let mut rollups = Vec::with_capacity(courses.len());
        for course in courses {
            let enrolled_count = self.repos.enrollments.count_live_by_course(course.id).await?;
            let counts = self.repos.attempts.counts_by_course(course.id).await?;
            rollups.push(CourseRollup {
                id: course.id,
                title: course.title,
                description: course.description,
                enrolled_count,
                attempted_count: counts.distinct_students,
                total_attempt_count: counts.total,
                is_active: course.is_active,
                created_at: course.created_at,
            });
        }

        Ok(CoursesOverview {
            total_students,
            courses: rollups,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attempt(status: AttemptStatus, score: i32, total: i32) -> Attempt {
        let now = Utc::now();
        Attempt {
            id: 1,
            student_id: 1,
            course_id: 1,
            quiz_package_id: 1,
            status,
            start_time: now,
            end_time: Some(now),
            score,
            total_points: total,
            attempt_count: 1,
            device_id: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[test]
    fn pass_and_completion_rates() {
        let mut attempts: Vec<Attempt> = (0..6)
            .map(|_| attempt(AttemptStatus::Completed, 7, 10))
            .collect();
        attempts.extend((0..4).map(|_| attempt(AttemptStatus::Completed, 3, 10)));

        let stats = summarize(&attempts);
        assert_eq!(stats.total_attempts, 10);
        assert_eq!(stats.pass_rate, 60);
        assert_eq!(stats.completion_rate, 100);
        assert_eq!(stats.average_score, 5);
        assert_eq!(stats.score_distribution.average, 6);
        assert_eq!(stats.score_distribution.poor, 4);
    }

    #[test]
    fn in_progress_attempts_only_lower_completion() {
        let attempts = vec![
            attempt(AttemptStatus::Completed, 9, 10),
            attempt(AttemptStatus::InProgress, 0, 10),
            attempt(AttemptStatus::Abandoned, 0, 10),
            attempt(AttemptStatus::Completed, 8, 10),
        ];
        let stats = summarize(&attempts);
        assert_eq!(stats.completion_rate, 50);
        assert_eq!(stats.pass_rate, 100);
        assert_eq!(
            stats.score_distribution,
            ScoreDistribution {
                excellent: 1,
                good: 1,
                average: 0,
                poor: 0
            }
        );
    }

    #[test]
    fn empty_package_reports_zeros() {
        let stats = summarize(&[]);
        assert_eq!(stats.total_attempts, 0);
        assert_eq!(stats.pass_rate, 0);
        assert_eq!(stats.completion_rate, 0);
        assert_eq!(stats.average_score, 0);
    }

    #[test]
    fn zero_total_points_is_not_a_pass() {
        let stats = summarize(&[attempt(AttemptStatus::Completed, 0, 0)]);
        assert_eq!(stats.pass_rate, 0);
        assert_eq!(stats.score_distribution.poor, 1);
    }

    #[tokio::test]
    async fn unknown_package_is_not_found() {
        let service = StatsService::new(Repositories::in_memory());
        assert!(matches!(
            service.package_stats(99).await,
            Err(Error::NotFound(_))
        ));
    }
}
