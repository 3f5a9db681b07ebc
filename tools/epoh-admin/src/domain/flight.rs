//! Simulated UAV flight.
//!
//! The UAV lifts off from the origin and patrols a square at 10 m altitude
//! (NED, so `z` is negative while airborne), cycling through the waypoints
//! at constant speed until the flight time is used up. The last sample is
//! always a landing marker.

use std::time::Duration;

use shared_types::TelemetrySample;

/// Status carried by the final sample of a flight.
pub const LANDING_STATUS: &str = "LANDING_FINAL";

/// Cruise speed of the patrol in m/s.
pub const DEFAULT_SPEED: f64 = 5.0;

/// A patrol corner in NED metres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waypoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Waypoint {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Route and timing of one flight.
#[derive(Debug, Clone)]
pub struct FlightPlan {
    pub waypoints: Vec<Waypoint>,
    pub speed: f64,
    pub duration: Duration,
    pub interval: Duration,
}

impl FlightPlan {
    /// 10 m square at 10 m altitude, flown for `duration` with a sample
    /// every `interval`.
    pub fn square_patrol(duration: Duration, interval: Duration) -> Self {
        Self {
            waypoints: vec![
                Waypoint::new(10.0, 0.0, -10.0),
                Waypoint::new(10.0, 10.0, -10.0),
                Waypoint::new(0.0, 10.0, -10.0),
                Waypoint::new(0.0, 0.0, -10.0),
            ],
            speed: DEFAULT_SPEED,
            duration,
            interval,
        }
    }

    /// In-flight samples before the landing marker (at least one).
    pub fn sample_count(&self) -> usize {
        if self.interval.is_zero() {
            return 1;
        }
        let count = self.duration.as_secs_f64() / self.interval.as_secs_f64();
        (count.floor() as usize).max(1)
    }
}

impl Default for FlightPlan {
    fn default() -> Self {
        Self::square_patrol(Duration::from_secs(60), Duration::from_secs(2))
    }
}

/// Kinematic state of the simulated UAV.
#[derive(Debug, Clone)]
pub struct SimulatedFlight {
    plan: FlightPlan,
    position: [f64; 3],
    next_waypoint: usize,
}

impl SimulatedFlight {
    /// Start on the ground at the origin.
    pub fn new(plan: FlightPlan) -> Self {
        Self {
            plan,
            position: [0.0; 3],
            next_waypoint: 0,
        }
    }

    pub fn plan(&self) -> &FlightPlan {
        &self.plan
    }

    /// Advance by `dt` seconds and report the resulting state.
    pub fn step(&mut self, dt: f64) -> TelemetrySample {
        let mut budget = (self.plan.speed * dt).max(0.0);
        let mut travelled = 0.0;

        // One full lap at most per step.
        for _ in 0..=self.plan.waypoints.len() {
            let Some(target) = self.plan.waypoints.get(self.next_waypoint).copied() else {
                break;
            };
            if budget <= 0.0 {
                break;
            }
            let delta = [
                target.x - self.position[0],
                target.y - self.position[1],
                target.z - self.position[2],
            ];
            let distance = delta.iter().map(|d| d * d).sum::<f64>().sqrt();

            if distance <= budget {
                self.position = [target.x, target.y, target.z];
                budget -= distance;
                travelled += distance;
                self.next_waypoint = (self.next_waypoint + 1) % self.plan.waypoints.len();
            } else {
                let scale = budget / distance;
                for (axis, d) in self.position.iter_mut().zip(delta) {
                    *axis += d * scale;
                }
                travelled += budget;
                budget = 0.0;
            }
        }

        let vel_mag = if dt > 0.0 { travelled / dt } else { 0.0 };
        self.sample(vel_mag, None)
    }

    /// Touch down where the UAV is and report the landing marker.
    pub fn land(&mut self) -> TelemetrySample {
        self.position[2] = 0.0;
        self.sample(0.0, Some(LANDING_STATUS.to_string()))
    }

    fn sample(&self, vel_mag: f64, status: Option<String>) -> TelemetrySample {
        TelemetrySample {
            x_pos: round3(self.position[0]),
            y_pos: round3(self.position[1]),
            z_alt: round3(self.position[2]),
            vel_mag: round3(vel_mag),
            status,
        }
    }
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}
