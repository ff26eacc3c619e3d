use rand::{Rng, RngCore};

use crate::{Behavior, Context, Status};

/// Stays `Running` for a (possibly jittered) number of seconds, then succeeds.
#[derive(Debug, Clone)]
pub struct Wait {
    /// Seconds to wait before deviation is applied.
    pub duration: f32,
    /// Half-width of the uniform jitter added to `duration`.
    pub random_deviation: f32,
    /// Blackboard float that overrides `duration` when present.
    pub duration_key: Option<String>,
    started_at: Option<f32>,
    sampled: f32,
}

impl Wait {
    pub fn new(duration: f32) -> Self {
        Self {
            duration,
            random_deviation: 0.0,
            duration_key: None,
            started_at: None,
            sampled: 0.0,
        }
    }

    pub fn with_deviation(mut self, deviation: f32) -> Self {
        self.random_deviation = deviation;
        self
    }

    pub fn with_duration_key(mut self, key: impl Into<String>) -> Self {
        self.duration_key = Some(key.into());
        self
    }

    /// Draws `max(0, base + U[-d, d])`.
    ///
    /// A non-finite deviation disables jitter; a huge one is capped so the
    /// sampled range stays representable.
    pub fn sample_duration(base: f32, deviation: f32, rng: &mut dyn RngCore) -> f32 {
        let jitter = if deviation.is_finite() && deviation > 0.0 {
            let deviation = deviation.min(f32::MAX / 4.0);
            rng.gen_range(-deviation..=deviation)
        } else {
            0.0
        };
        (base + jitter).max(0.0)
    }

    /// Duration drawn for the current wait, once started.
    pub fn sampled_duration(&self) -> Option<f32> {
        self.started_at.map(|_| self.sampled)
    }

    pub fn is_waiting(&self) -> bool {
        self.started_at.is_some()
    }
}

impl Default for Wait {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Behavior for Wait {
    fn execute(&mut self, ctx: &mut Context<'_>) -> Status {
        let start = match self.started_at {
            Some(start) => start,
            None => {
                let base = match &self.duration_key {
                    Some(key) => ctx.blackboard.get_float(key, self.duration),
                    None => self.duration,
                };
                self.sampled = Self::sample_duration(base, self.random_deviation, &mut *ctx.rng);
                self.started_at = Some(ctx.now);
                ctx.now
            }
        };

        if ctx.now - start >= self.sampled {
            self.started_at = None;
            Status::Success
        } else {
            Status::Running
        }
    }

    fn initialize(&mut self, _ctx: &mut Context<'_>) {
        self.started_at = None;
    }

    fn abort(&mut self, _ctx: &mut Context<'_>) {
        self.started_at = None;
    }

    fn name(&self) -> &str {
        "Wait"
    }
}
