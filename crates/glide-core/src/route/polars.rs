//! Performance adapter: time and height cost of a link.
//!
//! The glide polar, wind and MacCready setting are folded into a table of
//! ground-track directions. Each entry holds the slowness (s/m of ground
//! covered) and the gradient (m of height lost per m of ground covered).

use crate::config::RoutePlannerConfig;
use crate::polar::{GlidePolar, GlideSettings};
use crate::projection::FlatGeoPoint;
use crate::route::link::RouteLink;

/// Number of direction bins around the compass.
pub const ROUTEPOLAR_POINTS: usize = 72;

const BIN_DEG: f64 = 360.0 / ROUTEPOLAR_POINTS as f64;

/// Tracks with less ground speed than this are treated as unflyable.
const MIN_GROUND_SPEED_MPS: f64 = 1.0;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct RoutePolarPoint {
    slowness: f64,
    gradient: f64,
    valid: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoutePolars {
    points: [RoutePolarPoint; ROUTEPOLAR_POINTS],
    min_slowness: f64,
    inv_mc: Option<f64>,
    allow_climb: bool,
    climb_penalty: f64,
    safety_height: i32,
    climb_ceiling: i32,
    ceiling: Option<i32>,
}

impl RoutePolars {
    /// Build the direction table for cruising at MacCready `mc`.
    pub fn new(polar: &GlidePolar, settings: &GlideSettings, mc: f64) -> Self {
        let airspeed = polar.speed_to_fly(mc);
        let sink = polar.sink_rate(airspeed);
        let efficiency = if settings.cruise_efficiency > 0.0 {
            settings.cruise_efficiency
        } else {
            1.0
        };
        let (wind_e, wind_n) = settings.wind.vector();

        let mut points = [RoutePolarPoint::default(); ROUTEPOLAR_POINTS];
        for (i, point) in points.iter_mut().enumerate() {
            let theta = (i as f64 * BIN_DEG).to_radians();
            let (sin, cos) = theta.sin_cos();
            let along = wind_e * sin + wind_n * cos;
            let cross = wind_e * cos - wind_n * sin;
            let discriminant = airspeed * airspeed - cross * cross;
            if discriminant <= 0.0 {
                continue;
            }
            let ground_speed = along + discriminant.sqrt();
            if ground_speed < MIN_GROUND_SPEED_MPS {
                continue;
            }
            *point = RoutePolarPoint {
                slowness: 1.0 / (ground_speed * efficiency),
                gradient: sink / ground_speed,
                valid: true,
            };
        }

        let min_slowness = points
            .iter()
            .filter(|p| p.valid)
            .map(|p| p.slowness)
            .fold(f64::INFINITY, f64::min);

        Self {
            points,
            min_slowness: if min_slowness.is_finite() { min_slowness } else { 0.0 },
            inv_mc: GlideSettings::inv_mc(mc),
            allow_climb: true,
            climb_penalty: 1.0,
            safety_height: 0,
            climb_ceiling: i32::MAX,
            ceiling: None,
        }
    }

    /// Apply the solve configuration and endpoint altitudes.
    ///
    /// Climbs above the higher endpoint are charged at the climb penalty. The
    /// ceiling, when enabled, is a hard limit but never below either endpoint.
    pub fn set_config(
        &mut self,
        config: &RoutePlannerConfig,
        origin_alt: i32,
        destination_alt: i32,
        ceiling: Option<i32>,
    ) {
        self.allow_climb = config.allow_climb;
        self.climb_penalty = config.tuning.climb_penalty.max(1.0);
        self.safety_height = config.safety_height_terrain.max(0);
        self.climb_ceiling = origin_alt.max(destination_alt);
        self.ceiling = if config.use_ceiling {
            ceiling.map(|c| c.max(self.climb_ceiling))
        } else {
            None
        };
    }

    /// Direction bin for a flight vector (x east, y north).
    pub fn index(&self, dx: f64, dy: f64) -> usize {
        self.index_for_bearing(dx.atan2(dy).to_degrees())
    }

    pub fn index_for_bearing(&self, bearing_deg: f64) -> usize {
        ((bearing_deg.rem_euclid(360.0) / BIN_DEG).round() as usize) % ROUTEPOLAR_POINTS
    }

    pub fn bearing_for_index(index: usize) -> f64 {
        (index % ROUTEPOLAR_POINTS) as f64 * BIN_DEG
    }

    /// Height lost per meter of ground in this direction.
    pub fn gradient(&self, index: usize) -> Option<f64> {
        let point = self.points[index % ROUTEPOLAR_POINTS];
        point.valid.then_some(point.gradient)
    }

    /// Fastest ground slowness over all directions, used by the heuristic.
    pub fn min_slowness(&self) -> f64 {
        self.min_slowness
    }

    pub fn safety_height(&self) -> i32 {
        self.safety_height
    }

    pub fn ceiling(&self) -> Option<i32> {
        self.ceiling
    }

    pub fn allow_climb(&self) -> bool {
        self.allow_climb
    }

    pub fn glide_loss(&self, link: &RouteLink) -> Option<i32> {
        let gradient = self.gradient(link.polar_index())?;
        Some((link.distance() * gradient).ceil() as i32)
    }

    /// Height lost flying from `from` to `to`.
    pub fn glide_loss_between(&self, from: FlatGeoPoint, to: FlatGeoPoint) -> Option<i32> {
        let vector = to - from;
        let gradient = self.gradient(self.index(vector.x as f64, vector.y as f64))?;
        Some((vector.magnitude() * gradient).ceil() as i32)
    }

    /// Altitudes at the start and end of the flight along `link`.
    ///
    /// The flight starts at the origin-side altitude or higher if it needs
    /// to climb first to arrive at the destination-side altitude.
    pub fn link_profile(&self, link: &RouteLink) -> Option<(i32, i32)> {
        let loss = self.glide_loss(link)?;
        let start = link.second().altitude.max(link.first().altitude.saturating_add(loss));
        Some((start, start - loss))
    }

    /// Seconds needed to fly `link`, `None` if it cannot be flown.
    pub fn calc_time(&self, link: &RouteLink) -> Option<f64> {
        let point = self.points[link.polar_index()];
        if !point.valid {
            return None;
        }
        let loss = (link.distance() * point.gradient).ceil() as i32;
        let needed = link.first().altitude.saturating_add(loss);
        if self.ceiling.is_some_and(|c| needed > c) {
            return None;
        }

        let mut time = link.distance() * point.slowness;
        let start = link.second().altitude;
        let climb = needed - start;
        if climb > 0 {
            if !self.allow_climb {
                return None;
            }
            let inv_mc = self.inv_mc?;
            let above = (needed - start.max(self.climb_ceiling)).clamp(0, climb);
            let below = climb - above;
            time += inv_mc * (below as f64 + above as f64 * self.climb_penalty);
        }
        Some(time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RoutePlannerConfig;
    use crate::polar::Wind;
    use crate::route::link::RoutePoint;

    fn rp(x: i32, y: i32, alt: i32) -> RoutePoint {
        RoutePoint::new(FlatGeoPoint::new(x, y), alt)
    }

    fn polars(settings: GlideSettings) -> RoutePolars {
        let mut polars = RoutePolars::new(&GlidePolar::default(), &settings, settings.mc);
        polars.set_config(&RoutePlannerConfig::default(), 1_000, 500, None);
        polars
    }

    #[test]
    fn index_follows_compass() {
        let p = polars(GlideSettings::default());
        assert_eq!(p.index(0.0, 100.0), 0);
        assert_eq!(p.index(100.0, 0.0), 18);
        assert_eq!(p.index(0.0, -100.0), 36);
        assert_eq!(p.index(-100.0, 0.0), 54);
        assert_eq!(p.index_for_bearing(359.0), 0);
    }

    #[test]
    fn headwind_costs_more_than_tailwind() {
        let settings = GlideSettings {
            wind: Wind {
                speed_mps: 10.0,
                from_deg: 0.0,
            },
            ..GlideSettings::default()
        };
        let p = polars(settings);
        let north = RouteLink::new(rp(0, 10_000, 0), rp(0, 0, 5_000), &p);
        let south = RouteLink::new(rp(0, -10_000, 0), rp(0, 0, 5_000), &p);
        let t_north = p.calc_time(&north).expect("flyable");
        let t_south = p.calc_time(&south).expect("flyable");
        assert!(t_north > t_south);
        assert!(p.glide_loss(&north) > p.glide_loss(&south));
    }

    #[test]
    fn climb_above_endpoints_is_penalized() {
        let p = polars(GlideSettings::default());
        let low = RouteLink::new(rp(10_000, 0, 1_000), rp(0, 0, 800), &p);
        let high = RouteLink::new(rp(10_000, 0, 1_500), rp(0, 0, 1_300), &p);
        let loss = p.glide_loss(&low).expect("valid") as f64;
        // Same climb amount, but the second link climbs above the 1000 m ceiling.
        let t_low = p.calc_time(&low).expect("flyable");
        let t_high = p.calc_time(&high).expect("flyable");
        assert!(t_high > t_low, "{} vs {}", t_high, t_low);
        assert!(loss > 0.0);
    }

    #[test]
    fn climb_rejected_when_disabled() {
        let mut p = RoutePolars::new(&GlidePolar::default(), &GlideSettings::default(), 1.0);
        let config = RoutePlannerConfig {
            allow_climb: false,
            ..RoutePlannerConfig::default()
        };
        p.set_config(&config, 1_000, 500, None);
        let needs_climb = RouteLink::new(rp(10_000, 0, 1_000), rp(0, 0, 900), &p);
        assert_eq!(p.calc_time(&needs_climb), None);
        let glide = RouteLink::new(rp(10_000, 0, 500), rp(0, 0, 1_000), &p);
        assert!(p.calc_time(&glide).is_some());
    }

    #[test]
    fn ceiling_caps_required_height() {
        let mut p = RoutePolars::new(&GlidePolar::default(), &GlideSettings::default(), 1.0);
        let config = RoutePlannerConfig {
            use_ceiling: true,
            ..RoutePlannerConfig::default()
        };
        p.set_config(&config, 1_000, 500, Some(1_200));
        let over = RouteLink::new(rp(20_000, 0, 1_150), rp(0, 0, 1_000), &p);
        assert_eq!(p.calc_time(&over), None);
        assert_eq!(p.ceiling(), Some(1_200));
    }

    #[test]
    fn link_profile_climbs_only_when_needed() {
        let p = polars(GlideSettings::default());
        let link = RouteLink::new(rp(10_000, 0, 500), rp(0, 0, 2_000), &p);
        let (start, end) = p.link_profile(&link).expect("valid");
        assert_eq!(start, 2_000);
        assert!(end > 500 && end < 2_000);

        let climb = RouteLink::new(rp(10_000, 0, 1_500), rp(0, 0, 1_000), &p);
        let (start, end) = p.link_profile(&climb).expect("valid");
        assert!(start > 1_500);
        assert_eq!(end, 1_500);
    }
}
