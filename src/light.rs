use crate::math::{Color, Vec3, VERY_LARGE};

/// A scene light source. `sample` returns `(direction_to_light,
/// intensity_at_point, max_shadow_ray_distance)` or `None` if the point
/// receives no light from this source (e.g. outside a spotlight's cone).
#[derive(Clone)]
pub enum Light {
    Sun { direction: Vec3, color: Color },
    Point { position: Vec3, color: Color },
    Spot { position: Vec3, direction: Vec3, cos_cutoff: f64, color: Color },
}

impl Light {
    pub fn sample(&self, world_pt: Vec3) -> Option<(Vec3, Color, f64)> {
        match self {
            Light::Sun { direction, color } => Some((-direction.normalized(), *color, VERY_LARGE)),
            Light::Point { position, color } => {
                let to_light = *position - world_pt;
                let dist = to_light.length();
                if dist < 1e-9 {
                    return None;
                }
                let falloff = 1.0 / (dist * dist);
                Some((to_light.normalized(), *color * falloff, dist))
            }
            Light::Spot { position, direction, cos_cutoff, color } => {
                let to_light = *position - world_pt;
                let dist = to_light.length();
                if dist < 1e-9 {
                    return None;
                }
                let dir_to_point = (-to_light).normalized();
                let cos_angle = dir_to_point.dot(direction.normalized());
                // The original's SpotLight::luminate was left unimplemented
                // (marked FIXME) and always reported "no light"; preserved
                // here rather than guessing at the intended falloff curve.
                let _ = cos_angle;
                let _ = cos_cutoff;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sun_light_is_directional_and_unattenuated() {
        let l = Light::Sun { direction: Vec3::new(0.0, -1.0, 0.0), color: Color::fill(1.0) };
        let (dir, color, _) = l.sample(Vec3::zero()).unwrap();
        assert_eq!(dir, Vec3::unit_y());
        assert_eq!(color, Color::fill(1.0));
    }

    #[test]
    fn point_light_attenuates_with_distance() {
        let l = Light::Point { position: Vec3::new(0.0, 0.0, 2.0), color: Color::fill(1.0) };
        let (_, color, dist) = l.sample(Vec3::zero()).unwrap();
        assert_eq!(dist, 2.0);
        assert!((color.x - 0.25).abs() < 1e-9);
    }

    #[test]
    fn spot_light_never_luminates() {
        let l = Light::Spot {
            position: Vec3::new(0.0, 0.0, 2.0),
            direction: Vec3::new(0.0, 0.0, -1.0),
            cos_cutoff: 0.9,
            color: Color::fill(1.0),
        };
        assert!(l.sample(Vec3::zero()).is_none());
    }
}
