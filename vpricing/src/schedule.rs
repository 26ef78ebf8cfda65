//! Scheduler for running unattended ingestion cycles.
//!
//! The scheduler is configured with an anchor time and an interval; it
//! aligns ticks to the anchor, so a cycle configured for the first of
//! the month at 06:00 keeps firing at 06:00 regardless of when the
//! process started. Intervals that elapsed before startup are skipped,
//! never replayed. Each tick derives the pricing-cycle tag from its own
//! timestamp and hands it to the scheduled job.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::{Instrument as _, Level, event, span};
use vp_core::models::CycleTag;

/// Configuration for periodic ingestion cycles.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Scheduler {
    /// An RFC3339 timestamp to anchor the schedule to (if omitted, defaults to now)
    #[serde(with = "time::serde::rfc3339::option", default)]
    pub from: Option<time::OffsetDateTime>,
    /// How often to run a cycle; scheduling is disabled when omitted
    #[serde(with = "humantime_serde::option", default)]
    pub every: Option<Duration>,
}

impl Scheduler {
    /// Run `f` on every tick of the configured schedule, forever.
    ///
    /// Each tick passes `f` the [`CycleTag`] derived from the tick's
    /// timestamp, so an unattended deployment ingests under the
    /// year-month of the moment the cycle fires.
    ///
    /// # Returns
    ///
    /// * `Ok(())` if scheduling is disabled (no interval configured)
    /// * `Err(E)` if the scheduled function returns an error
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::time::Duration;
    /// use time::OffsetDateTime;
    /// use vpricing::Scheduler;
    ///
    /// # fn main() -> Result<(), String> {
    /// let scheduler = Scheduler {
    ///     from: Some(OffsetDateTime::now_utc()),
    ///     every: Some(Duration::from_secs(24 * 3600)), // Every day
    /// };
    ///
    /// # tokio_test::block_on(async {
    /// scheduler.schedule(|cycle| async move {
    ///     println!("Running cycle {cycle}");
    ///     Ok::<(), String>(())
    /// }).await?;
    /// # Ok(())
    /// # })
    /// # }
    /// ```
    pub async fn schedule<T, E>(
        &self,
        f: impl AsyncFn(CycleTag) -> Result<T, E>,
    ) -> Result<(), E> {
        // a missing or zero interval both mean "don't schedule"
        let Some(every) = self.every.filter(|every| !every.is_zero()) else {
            return Ok(());
        };

        let mut tick = self.first_tick(OffsetDateTime::now_utc(), every);

        loop {
            // sleep against the wall clock each time around, so a slow
            // cycle delays its successor instead of stacking up behind it
            let now = OffsetDateTime::now_utc();
            if tick > now {
                tokio::time::sleep((tick - now).unsigned_abs()).await;
            }

            let cycle = CycleTag::from_datetime(tick);
            let span = span!(Level::INFO, "scheduled cycle", %cycle);
            async {
                event!(
                    Level::INFO,
                    tick = tick.format(&Rfc3339).unwrap_or_default(),
                );
                f(cycle).await
            }
            .instrument(span)
            .await?;

            tick += every;
        }
    }

    /// The first tick at or after `now`: the anchor, advanced past any
    /// intervals that elapsed before the process came up.
    fn first_tick(&self, now: OffsetDateTime, every: Duration) -> OffsetDateTime {
        let mut tick = self.from.unwrap_or(now);
        if tick < now {
            let missed = ((now - tick) / every).ceil() as u32;
            tick += every * missed;
        }
        tick
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    const DAY: Duration = Duration::from_secs(24 * 3600);

    #[test]
    fn first_tick_honors_a_future_anchor() {
        let scheduler = Scheduler {
            from: Some(datetime!(2025-08-01 06:00 UTC)),
            every: Some(DAY),
        };
        assert_eq!(
            scheduler.first_tick(datetime!(2025-07-28 12:00 UTC), DAY),
            datetime!(2025-08-01 06:00 UTC)
        );
    }

    #[test]
    fn first_tick_skips_elapsed_intervals() {
        let scheduler = Scheduler {
            from: Some(datetime!(2025-07-01 06:00 UTC)),
            every: Some(DAY),
        };
        // the 06:00 ticks on the 1st through the 3rd already passed
        assert_eq!(
            scheduler.first_tick(datetime!(2025-07-03 07:30 UTC), DAY),
            datetime!(2025-07-04 06:00 UTC)
        );
    }

    #[test]
    fn first_tick_defaults_to_now() {
        let scheduler = Scheduler::default();
        let now = datetime!(2025-07-03 07:30 UTC);
        assert_eq!(scheduler.first_tick(now, DAY), now);
    }
}
