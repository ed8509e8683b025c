//! Aircraft performance: glide polar, wind and MacCready settings.

use crate::error::{Result, RouteError};
use serde::{Deserialize, Serialize};

/// Parabolic sink polar `sink(v) = a·v² + b·v + c` (m/s, sink positive).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlidePolar {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    /// Minimum cruise speed (m/s).
    pub v_min: f64,
    /// Maximum cruise speed (m/s).
    pub v_max: f64,
}

impl GlidePolar {
    /// Fit the parabola through three `(speed, sink)` samples.
    pub fn from_points(points: [(f64, f64); 3], v_min: f64, v_max: f64) -> Result<Self> {
        let [(v1, s1), (v2, s2), (v3, s3)] = points;
        if points.iter().any(|(v, s)| !v.is_finite() || !s.is_finite()) {
            return Err(RouteError::InvalidPolar("non-finite sample".to_string()));
        }
        if (v2 - v1).abs() < 1e-6 || (v3 - v2).abs() < 1e-6 || (v3 - v1).abs() < 1e-6 {
            return Err(RouteError::InvalidPolar("duplicate sample speeds".to_string()));
        }

        // Divided differences.
        let d1 = (s2 - s1) / (v2 - v1);
        let d2 = (s3 - s2) / (v3 - v2);
        let a = (d2 - d1) / (v3 - v1);
        let b = d1 - a * (v1 + v2);
        let c = s1 - a * v1 * v1 - b * v1;

        let polar = Self {
            a,
            b,
            c,
            v_min,
            v_max,
        };
        polar.validate()?;
        Ok(polar)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.a > 0.0 && self.a.is_finite()) {
            return Err(RouteError::InvalidPolar(format!(
                "curvature must be positive, got {}",
                self.a
            )));
        }
        if !(self.c > 0.0 && self.c.is_finite()) || !self.b.is_finite() {
            return Err(RouteError::InvalidPolar(format!(
                "sink at zero speed must be positive, got {}",
                self.c
            )));
        }
        if !(self.v_min > 0.0 && self.v_min < self.v_max && self.v_max.is_finite()) {
            return Err(RouteError::InvalidPolar(format!(
                "speed range {}..{} is empty",
                self.v_min, self.v_max
            )));
        }
        Ok(())
    }

    pub fn sink_rate(&self, v: f64) -> f64 {
        self.a * v * v + self.b * v + self.c
    }

    /// Speed of best lift-to-drag ratio in still air.
    pub fn speed_best_ld(&self) -> f64 {
        (self.c / self.a).sqrt().clamp(self.v_min, self.v_max)
    }

    pub fn best_ld(&self) -> f64 {
        let v = self.speed_best_ld();
        v / self.sink_rate(v)
    }

    /// MacCready speed to fly for the expected climb rate `mc`.
    pub fn speed_to_fly(&self, mc: f64) -> f64 {
        ((self.c + mc.max(0.0)) / self.a)
            .sqrt()
            .clamp(self.v_min, self.v_max)
    }
}

impl Default for GlidePolar {
    /// A standard-class sailplane, best L/D about 38 at 100 km/h.
    fn default() -> Self {
        Self {
            a: 0.002_227_945_566_833_912,
            b: -0.096_759_675_967_596_83,
            c: 1.7,
            v_min: 20.0,
            v_max: 70.0,
        }
    }
}

/// Wind as reported by the flight instruments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    pub speed_mps: f64,
    /// Direction the wind blows from, degrees true.
    pub from_deg: f64,
}

impl Wind {
    pub fn calm() -> Self {
        Self::default()
    }

    /// Airmass motion as (east, north) m/s.
    pub fn vector(&self) -> (f64, f64) {
        let to = (self.from_deg + 180.0).to_radians();
        (self.speed_mps * to.sin(), self.speed_mps * to.cos())
    }
}

/// Pilot settings that feed the performance model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlideSettings {
    /// Task MacCready (expected climb rate, m/s).
    pub mc: f64,
    /// MacCready used for safety (final glide) calculations.
    pub safety_mc: f64,
    /// Achieved fraction of the ideal cruise speed.
    pub cruise_efficiency: f64,
    pub wind: Wind,
}

impl Default for GlideSettings {
    fn default() -> Self {
        Self {
            mc: 1.0,
            safety_mc: 0.5,
            cruise_efficiency: 1.0,
            wind: Wind::calm(),
        }
    }
}

impl GlideSettings {
    /// Seconds spent climbing per meter gained, `None` without lift.
    pub fn inv_mc(mc: f64) -> Option<f64> {
        if mc > 0.0 && mc.is_finite() {
            Some(1.0 / mc)
        } else {
            None
        }
    }
}
