//! Weekly digest emails plus the cron registry that fires them.

use std::sync::Arc;

use sqlx::{FromRow, PgPool};
use time::{Duration, OffsetDateTime};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::insights::{repo as insights_repo, service as insights_service};
use crate::notify::NotificationSender;

#[derive(Debug, FromRow)]
struct DigestRecipient {
    id: Uuid,
    email: String,
    display_name: Option<String>,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct DigestReport {
    pub sent: u32,
    pub failed: u32,
}

#[derive(Debug, Default)]
struct WeekCounts {
    symptoms: i64,
    moods: i64,
    medications: i64,
    habits: i64,
}

impl WeekCounts {
    fn total(&self) -> i64 {
        self.symptoms + self.moods + self.medications + self.habits
    }
}

async fn week_counts(db: &PgPool, user_id: Uuid, since: OffsetDateTime) -> anyhow::Result<WeekCounts> {
    let count = |table: &str, column: &str| {
        let sql =
            format!("SELECT COUNT(*) FROM {table} WHERE user_id = $1 AND {column} >= $2");
        async move {
            sqlx::query_scalar::<_, i64>(&sql)
                .bind(user_id)
                .bind(since)
                .fetch_one(db)
                .await
        }
    };
    Ok(WeekCounts {
        symptoms: count("symptom_logs", "logged_at").await?,
        moods: count("mood_logs", "logged_at").await?,
        medications: count("medication_logs", "created_at").await?,
        habits: count("habit_logs", "logged_at").await?,
    })
}

fn digest_body(name: &str, counts: &WeekCounts, streak: u32) -> String {
    let mut body = format!("Hi {name},\n\nYour week at a glance:\n");
    body.push_str(&format!("- Symptom logs: {}\n", counts.symptoms));
    body.push_str(&format!("- Mood logs: {}\n", counts.moods));
    body.push_str(&format!("- Medication logs: {}\n", counts.medications));
    body.push_str(&format!("- Habit logs: {}\n", counts.habits));
    if streak > 0 {
        body.push_str(&format!("\nYou are on a {streak}-day logging streak. Keep it up!\n"));
    } else if counts.total() == 0 {
        body.push_str("\nNo entries this week. A single log gets you back on track.\n");
    }
    body
}

/// One digest pass over every opted-in user. Failures are counted and
/// logged; one bad address never blocks the rest of the run.
pub async fn run_once(
    db: &PgPool,
    sender: &dyn NotificationSender,
) -> anyhow::Result<DigestReport> {
    let recipients = sqlx::query_as::<_, DigestRecipient>(
        "SELECT id, email, display_name FROM users WHERE digest_opt_in = TRUE ORDER BY created_at",
    )
    .fetch_all(db)
    .await?;

    let now = OffsetDateTime::now_utc();
    let since = now - Duration::days(7);
    let streak_since = now - Duration::days(400);
    let mut report = DigestReport::default();

    for user in recipients {
        let result: anyhow::Result<()> = async {
            let counts = week_counts(db, user.id, since).await?;
            let timestamps =
                insights_repo::activity_timestamps(db, user.id, streak_since).await?;
            let active_days = timestamps.into_iter().map(|at| at.date()).collect();
            let streak = insights_service::current_streak(&active_days, now.date());

            let name = user.display_name.as_deref().unwrap_or("there");
            sender
                .send(
                    &user.email,
                    "Your weekly health digest",
                    &digest_body(name, &counts, streak),
                )
                .await
        }
        .await;

        match result {
            Ok(()) => report.sent += 1,
            Err(err) => {
                warn!(user_id = %user.id, "digest delivery failed: {err}");
                report.failed += 1;
            }
        }
    }

    info!(sent = report.sent, failed = report.failed, "digest run finished");
    Ok(report)
}

/// Registers the digest job and runs the scheduler in the background.
pub async fn start_scheduler(
    db: PgPool,
    sender: Arc<dyn NotificationSender>,
    schedule: &str,
) -> anyhow::Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let job = Job::new_async(schedule, move |_uuid, _lock| {
        let db = db.clone();
        let sender = sender.clone();
        Box::pin(async move {
            if let Err(err) = run_once(&db, sender.as_ref()).await {
                error!("digest run failed: {err}");
            }
        })
    })?;
    scheduler.add(job).await?;
    scheduler.start().await?;
    info!(schedule, "digest scheduler started");
    Ok(scheduler)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_body_mentions_streak_when_active() {
        let counts = WeekCounts {
            symptoms: 2,
            moods: 5,
            medications: 7,
            habits: 4,
        };
        let body = digest_body("Ada", &counts, 6);
        assert!(body.contains("Hi Ada"));
        assert!(body.contains("Mood logs: 5"));
        assert!(body.contains("6-day logging streak"));
    }

    #[test]
    fn digest_body_nudges_on_empty_week() {
        let body = digest_body("there", &WeekCounts::default(), 0);
        assert!(body.contains("No entries this week"));
        assert!(!body.contains("streak"));
    }
}
