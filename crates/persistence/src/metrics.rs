//! Query timing and connection pool gauges.

use metrics::{counter, gauge, histogram};
use sqlx::PgPool;
use std::time::Instant;

/// Label for a finished query.
fn outcome<T>(result: &Result<T, sqlx::Error>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(sqlx::Error::RowNotFound) => "not_found",
        Err(_) => "error",
    }
}

/// Records one query's latency under its name and outcome.
pub fn record_query_duration(query: &'static str, outcome: &'static str, duration_secs: f64) {
    histogram!(
        "database_query_duration_seconds",
        "query" => query,
        "outcome" => outcome
    )
    .record(duration_secs);

    if outcome == "error" {
        counter!("database_query_errors_total", "query" => query).increment(1);
    }
}

/// Publishes pool occupancy. Called from the readiness probe.
pub fn record_pool_metrics(pool: &PgPool) {
    let size = pool.size() as usize;
    let idle = pool.num_idle();

    gauge!("database_connections_active").set(size.saturating_sub(idle) as f64);
    gauge!("database_connections_idle").set(idle as f64);
    gauge!("database_connections_total").set(size as f64);
}

/// Times a repository query from construction until [`QueryTimer::finish`].
///
/// ```ignore
/// let timer = QueryTimer::new("find_donation_by_id");
/// let result = sqlx::query_as::<_, DonationEntity>(...).fetch_optional(&pool).await;
/// timer.finish(result)
/// ```
pub struct QueryTimer {
    query: &'static str,
    start: Instant,
}

impl QueryTimer {
    pub fn new(query: &'static str) -> Self {
        Self {
            query,
            start: Instant::now(),
        }
    }

    /// Records the elapsed time and hands the query result back unchanged.
    pub fn finish<T>(self, result: Result<T, sqlx::Error>) -> Result<T, sqlx::Error> {
        record_query_duration(
            self.query,
            outcome(&result),
            self.start.elapsed().as_secs_f64(),
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_labels() {
        assert_eq!(outcome(&Ok::<_, sqlx::Error>(1)), "ok");
        assert_eq!(outcome::<()>(&Err(sqlx::Error::RowNotFound)), "not_found");
        assert_eq!(outcome::<()>(&Err(sqlx::Error::PoolTimedOut)), "error");
    }

    #[test]
    fn test_finish_passes_result_through() {
        let timer = QueryTimer::new("transition_donation");
        assert_eq!(timer.query, "transition_donation");
        assert_eq!(timer.finish(Ok::<_, sqlx::Error>(7)).unwrap(), 7);

        let err = QueryTimer::new("insert_donation")
            .finish::<()>(Err(sqlx::Error::PoolClosed))
            .unwrap_err();
        assert!(matches!(err, sqlx::Error::PoolClosed));
    }
}
