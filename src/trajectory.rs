//! Trajectory sampling: waypoint list -> replayable setpoint buffer
//!
//! `TrajectorySampler` wraps an external `TrajectoryGenerator` (the
//! polynomial generator lives out of process; `LinearTrajectoryGenerator` is
//! the built-in constant-speed implementation used by the demo and tests).
//! `set_waypoints` replaces sampler state wholesale: the generator is run
//! over the path and the whole trajectory is pre-sampled at fixed dt into a
//! `TrajectoryCommand`. `evaluate(t)` returns a lookahead window of
//! setpoints, never a single point.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SwarmError};
use crate::geometry::{Pose, Vec3};
use crate::mission::Waypoint;

/// One sampled trajectory point
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Setpoint {
    pub position: Vec3,
    pub velocity: Vec3,
    pub acceleration: Vec3,
}

/// Ordered setpoint buffer for one accepted goal.
///
/// Replaced wholesale on every new accepted goal; immutable in between.
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryCommand {
    setpoints: Vec<Setpoint>,
    sample_dt: f64,
    generation: u64,
}

impl TrajectoryCommand {
    pub fn setpoints(&self) -> &[Setpoint] {
        &self.setpoints
    }

    pub fn sample_dt(&self) -> f64 {
        self.sample_dt
    }

    /// Monotonic counter distinguishing buffers across goal replacements
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn duration(&self) -> f64 {
        self.setpoints.len().saturating_sub(1) as f64 * self.sample_dt
    }
}

/// Seam to the external trajectory generator.
///
/// The generator's internal mathematics are out of scope; the engine only
/// needs a path-in, time-indexed-samples-out contract.
pub trait TrajectoryGenerator: Send + Sync {
    /// Replace the generator's path. Implementations must drop all state
    /// from any previous path.
    fn set_path(&mut self, start: &Pose, waypoints: &[Waypoint], max_speed: f64) -> Result<()>;

    /// Total trajectory duration in seconds for the current path
    fn duration(&self) -> f64;

    /// Sample the trajectory at time t; None when the generator cannot
    /// produce the requested point.
    fn sample(&self, t: f64) -> Option<Setpoint>;
}

/// Built-in constant-speed linear interpolant between waypoints
#[derive(Debug, Default)]
pub struct LinearTrajectoryGenerator {
    points: Vec<Vec3>,
    /// Cumulative arrival time at each point
    times: Vec<f64>,
    speed: f64,
}

impl LinearTrajectoryGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TrajectoryGenerator for LinearTrajectoryGenerator {
    fn set_path(&mut self, start: &Pose, waypoints: &[Waypoint], max_speed: f64) -> Result<()> {
        let mut points = vec![start.position];
        points.extend(waypoints.iter().map(|wp| wp.pose.position));

        let total_distance: f64 = points.windows(2).map(|w| w[0].distance(&w[1])).sum();
        if total_distance > 0.0 && max_speed <= 0.0 {
            return Err(SwarmError::Generation(format!(
                "cannot traverse {total_distance:.2}m at speed {max_speed}"
            )));
        }

        let mut times = Vec::with_capacity(points.len());
        let mut t = 0.0;
        times.push(0.0);
        for w in points.windows(2) {
            let d = w[0].distance(&w[1]);
            if d > 0.0 {
                t += d / max_speed;
            }
            times.push(t);
        }

        self.points = points;
        self.times = times;
        self.speed = max_speed;
        Ok(())
    }

    fn duration(&self) -> f64 {
        self.times.last().copied().unwrap_or(0.0)
    }

    fn sample(&self, t: f64) -> Option<Setpoint> {
        if self.points.is_empty() || t < 0.0 {
            return None;
        }
        if t >= self.duration() {
            return Some(Setpoint {
                position: *self.points.last()?,
                velocity: Vec3::ZERO,
                acceleration: Vec3::ZERO,
            });
        }
        let seg = self.times.windows(2).position(|w| t >= w[0] && t < w[1])?;
        let (t0, t1) = (self.times[seg], self.times[seg + 1]);
        let (p0, p1) = (self.points[seg], self.points[seg + 1]);
        let span = t1 - t0;
        let alpha = if span > 0.0 { (t - t0) / span } else { 0.0 };
        let direction = p1.sub(&p0).scale(1.0 / p0.distance(&p1).max(f64::EPSILON));
        Some(Setpoint {
            position: p0.add(&p1.sub(&p0).scale(alpha)),
            velocity: direction.scale(self.speed),
            acceleration: Vec3::ZERO,
        })
    }
}

/// Samples the generator into a replayable, time-indexed setpoint source
pub struct TrajectorySampler {
    generator: Box<dyn TrajectoryGenerator>,
    command: Option<TrajectoryCommand>,
    sample_dt: f64,
    lookahead_len: usize,
    generation: u64,
}

impl TrajectorySampler {
    pub fn new(generator: Box<dyn TrajectoryGenerator>, sample_dt: f64, lookahead_len: usize) -> Self {
        Self {
            generator,
            command: None,
            sample_dt,
            lookahead_len: lookahead_len.max(1),
            generation: 0,
        }
    }

    /// Fully replace trajectory state from a new waypoint list.
    ///
    /// Runs the generator over the path and pre-samples it at `sample_dt`.
    /// A generator that fails, or yields fewer points than the duration
    /// requires, is a generation failure (goal rejection). No setpoint from
    /// a previous path survives a successful or failed replacement attempt.
    pub fn set_waypoints(
        &mut self,
        start: &Pose,
        waypoints: &[Waypoint],
        max_speed: f64,
    ) -> Result<&TrajectoryCommand> {
        // Drop the previous buffer before generating; a failed generation
        // must not leave stale setpoints behind.
        self.command = None;

        self.generator.set_path(start, waypoints, max_speed)?;
        let duration = self.generator.duration();
        let requested = (duration / self.sample_dt).ceil() as usize + 1;

        let mut setpoints = Vec::with_capacity(requested);
        for i in 0..requested {
            let t = (i as f64 * self.sample_dt).min(duration);
            match self.generator.sample(t) {
                Some(sp) => setpoints.push(sp),
                None => {
                    return Err(SwarmError::Generation(format!(
                        "generator yielded {} of {} requested points",
                        setpoints.len(),
                        requested
                    )));
                }
            }
        }
        self.generation += 1;
        debug!(
            generation = self.generation,
            points = setpoints.len(),
            duration_secs = duration,
            "trajectory command replaced"
        );
        Ok(self.command.insert(TrajectoryCommand {
            setpoints,
            sample_dt: self.sample_dt,
            generation: self.generation,
        }))
    }

    /// Lookahead window of setpoints starting at the sample index for t.
    ///
    /// The window is clamped at the buffer tail; empty only when no
    /// trajectory has been loaded.
    pub fn evaluate(&self, t: f64) -> &[Setpoint] {
        let Some(command) = &self.command else {
            return &[];
        };
        let buf = command.setpoints();
        if buf.is_empty() {
            return &[];
        }
        let index = ((t.max(0.0) / self.sample_dt) as usize).min(buf.len() - 1);
        let end = (index + self.lookahead_len).min(buf.len());
        &buf[index..end]
    }

    pub fn command(&self) -> Option<&TrajectoryCommand> {
        self.command.as_ref()
    }

    pub fn duration(&self) -> f64 {
        self.command.as_ref().map(|c| c.duration()).unwrap_or(0.0)
    }
}
