//! Monte Carlo: random fills, keep the best.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::clock::ClockValue;
use crate::models::Schedule;
use crate::scheduler::SchedulingContext;
use crate::{log_assignments, log_debug};

use super::{Strategy, StrategyError};

#[derive(Clone, Debug)]
pub struct MonteCarlo {
    pub earliest_start: ClockValue,
    pub trials: usize,
    /// Consecutive non-improving trials before giving up.
    pub max_repeated: usize,
    pub seed: Option<u64>,
    pub verbosity: u8,
}

impl Default for MonteCarlo {
    fn default() -> Self {
        Self {
            earliest_start: ClockValue::MIDNIGHT,
            trials: 100,
            max_repeated: 25,
            seed: None,
            verbosity: 0,
        }
    }
}

impl MonteCarlo {
    fn rng(&self) -> StdRng {
        StdRng::seed_from_u64(self.seed.unwrap_or_else(rand::random))
    }

    /// One random fill: each interpreter draws from its candidates until none
    /// are left, keeping every draw that fits.
    pub fn single_trial<R: Rng>(
        &self,
        base: &SchedulingContext,
        rng: &mut R,
    ) -> Result<Schedule, StrategyError> {
        let mut ctx = base.reset();
        for key in ctx.ledger().interpreter_keys() {
            let mut pool = ctx.ledger().candidates_for(&key, self.earliest_start)?;
            while !pool.is_empty() {
                let pick = pool.swap_remove(rng.random_range(0..pool.len()));
                if ctx.ledger().can_insert(&key, pick)? {
                    ctx.ledger_mut().assign(&key, pick)?;
                    log_debug!(self.verbosity, "    {} draws appointment {}", key, pick);
                }
            }
        }
        Ok(ctx.into_schedule())
    }
}

impl MonteCarlo {
    /// Best schedule over the trials and the number of trials actually run.
    pub fn search(&self, base: &SchedulingContext) -> Result<(Schedule, usize), StrategyError> {
        let mut rng = self.rng();
        let patience = self.max_repeated.max(1);
        let mut best: Option<Schedule> = None;
        let mut stale = 0;
        let mut ran = 0;

        for trial in 0..self.trials {
            let schedule = self.single_trial(base, &mut rng)?;
            ran += 1;
            if best.as_ref().map_or(true, |b| schedule.impact > b.impact) {
                log_assignments!(self.verbosity, "  trial {}: best impact {}", trial, schedule.impact);
                best = Some(schedule);
                stale = 0;
            } else {
                stale += 1;
                if stale >= patience {
                    log_debug!(self.verbosity, "  no improvement in {} trials, stopping", stale);
                    break;
                }
            }
        }
        let best = best.unwrap_or_else(|| base.reset().into_schedule());
        Ok((best, ran))
    }
}

impl Strategy for MonteCarlo {
    fn name(&self) -> &str {
        "monte_carlo"
    }

    fn run(&self, base: &SchedulingContext) -> Result<Schedule, StrategyError> {
        self.search(base).map(|(schedule, _)| schedule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{appt, busy_morning, context, jose, t};
    use crate::models::AppointmentId;

    fn covered(schedule: &Schedule) -> Vec<AppointmentId> {
        schedule
            .appointments
            .iter()
            .filter(|a| a.is_assigned())
            .map(|a| a.id)
            .collect()
    }

    #[test]
    fn test_seeded_runs_repeat() {
        let base = context(busy_morning());
        let strategy = MonteCarlo {
            seed: Some(3),
            trials: 10,
            ..MonteCarlo::default()
        };
        let first = strategy.run(&base).unwrap();
        let second = strategy.run(&base).unwrap();
        assert_eq!(covered(&first), covered(&second));
    }

    #[test]
    fn test_single_trial_never_double_books() {
        let base = context(busy_morning());
        let strategy = MonteCarlo::default();
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..20 {
            let schedule = strategy.single_trial(&base, &mut rng).unwrap();
            let mut taken: Vec<_> = schedule.appointments.iter().filter(|a| a.is_assigned()).collect();
            taken.sort_by_key(|a| a.start);
            for pair in taken.windows(2) {
                assert!(pair[0].finish <= pair[1].start);
            }
            assert_eq!(schedule.impact, schedule.calc_impact());
        }
    }

    #[test]
    fn test_never_beats_the_optimum() {
        let base = context(busy_morning());
        let strategy = MonteCarlo {
            seed: Some(5),
            ..MonteCarlo::default()
        };
        assert!(strategy.run(&base).unwrap().calc_impact() <= 11.0);
    }

    #[test]
    fn test_zero_trials_returns_clean_schedule() {
        let base = context(busy_morning());
        let strategy = MonteCarlo {
            trials: 0,
            ..MonteCarlo::default()
        };
        let schedule = strategy.run(&base).unwrap();
        assert_eq!(schedule.calc_impact(), 0.0);
    }

    #[test]
    fn test_time_floor_applies() {
        let base = context(busy_morning());
        let strategy = MonteCarlo {
            earliest_start: t("9:30"),
            seed: Some(1),
            trials: 5,
            ..MonteCarlo::default()
        };
        assert_eq!(covered(&strategy.run(&base).unwrap()), vec![5]);
    }

    #[test]
    fn test_stops_after_max_repeated_flat_trials() {
        // one appointment, one interpreter: every trial scores the same
        let schedule = Schedule::try_new(vec![appt(1, "9:00", 30, 4.0)], vec![jose()]).unwrap();
        let base = context(schedule);
        let strategy = MonteCarlo {
            trials: 1000,
            max_repeated: 3,
            seed: Some(8),
            ..MonteCarlo::default()
        };
        let (best, ran) = strategy.search(&base).unwrap();
        assert_eq!(ran, 4);
        assert_eq!(best.calc_impact(), 4.0);

        let patient = MonteCarlo {
            trials: 10,
            max_repeated: 50,
            ..strategy
        };
        assert_eq!(patient.search(&base).unwrap().1, 10);
    }
}
