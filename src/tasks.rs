use crate::models::AppState;
use crate::schema::audit_records;
use chrono::{Duration as ChronoDuration, Utc};
use diesel::prelude::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{debug, error, info};

const DAILY_CLEANUP_INTERVAL: Duration = Duration::from_secs(60 * 60 * 24);

/// Audit records expire after two years.
const AUDIT_RETENTION_DAYS: i64 = 730;

pub fn spawn_background_tasks(state: Arc<AppState>) {
    tokio::spawn(async move {
        info!("Starting daily audit record retention task");
        cleanup_expired_audit_records(state).await;
    });

    info!("Background maintenance tasks spawned");
}

async fn cleanup_expired_audit_records(state: Arc<AppState>) {
    let mut interval = interval(DAILY_CLEANUP_INTERVAL);
    interval.tick().await;

    loop {
        interval.tick().await;

        let Ok(mut conn) = state.db.get() else {
            error!("Audit retention cleanup: DB connection failed");
            continue;
        };

        let cutoff = Utc::now() - ChronoDuration::days(AUDIT_RETENTION_DAYS);
        match diesel::delete(audit_records::table.filter(audit_records::created_at.lt(cutoff)))
            .execute(&mut conn)
        {
            Ok(0) => debug!("No expired audit records"),
            Ok(n) => info!("Removed {} expired audit records", n),
            Err(e) => error!("Audit retention cleanup failed: {}", e),
        }
    }
}
