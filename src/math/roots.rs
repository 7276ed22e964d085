//! Polynomial root solvers for quadric, cubic, and quartic surfaces,
//! after the Graphics Gems I algorithms (Jochen Schwarze).

use super::vector::VERY_SMALL;

fn cbrt(x: f64) -> f64 {
    if x < 0.0 {
        -(-x).powf(1.0 / 3.0)
    } else {
        x.powf(1.0 / 3.0)
    }
}

/// Solves `x^2 + p*x + q = 0`, returning roots in ascending order.
pub fn solve_quadric(p: f64, q: f64) -> Vec<f64> {
    let discriminant = p * p * 0.25 - q;
    if discriminant < 0.0 {
        Vec::new()
    } else if discriminant.abs() < VERY_SMALL {
        vec![-0.5 * p]
    } else {
        let sd = discriminant.sqrt();
        vec![-0.5 * p - sd, -0.5 * p + sd]
    }
}

/// Solves `x^3 + a*x^2 + b*x + c = 0`, returning all real roots in
/// ascending order.
pub fn solve_cubic(a: f64, b: f64, c: f64) -> Vec<f64> {
    let a2 = a * a;
    let q = (a2 - 3.0 * b) / 9.0;
    let r = (a * (2.0 * a2 - 9.0 * b) + 27.0 * c) / 54.0;
    let q3 = q * q * q;
    let r2 = r * r;

    if r2 < q3 {
        let t = (r / q3.sqrt()).clamp(-1.0, 1.0).acos();
        let sq = -2.0 * q.sqrt();
        let mut roots = vec![
            sq * (t / 3.0).cos() - a / 3.0,
            sq * ((t + 2.0 * std::f64::consts::PI) / 3.0).cos() - a / 3.0,
            sq * ((t - 2.0 * std::f64::consts::PI) / 3.0).cos() - a / 3.0,
        ];
        roots.sort_by(|x, y| x.partial_cmp(y).unwrap());
        roots
    } else {
        let sgn = if r < 0.0 { -1.0 } else { 1.0 };
        let aa = -sgn * cbrt(r.abs() + (r2 - q3).sqrt());
        let bb = if aa.abs() < VERY_SMALL { 0.0 } else { q / aa };
        vec![(aa + bb) - a / 3.0]
    }
}

/// Solves `x^4 + a*x^3 + b*x^2 + c*x + d = 0` via the resolvent cubic,
/// returning all real roots in ascending order.
pub fn solve_quartic(a: f64, b: f64, c: f64, d: f64) -> Vec<f64> {
    // Depress the quartic: substitute x = y - a/4.
    let a2 = a * a;
    let p = -0.375 * a2 + b;
    let q = 0.125 * a2 * a - 0.5 * a * b + c;
    let r = -(3.0 / 256.0) * a2 * a2 + a2 * b / 16.0 - a * c / 4.0 + d;

    let mut roots = Vec::new();
    if r.abs() < VERY_SMALL {
        // No absolute term: y*(y^3 + p*y + q) = 0.
        roots.push(0.0);
        roots.extend(solve_cubic(0.0, p, q));
    } else {
        let resolvent_roots = solve_cubic(-0.5 * p, -r, 0.5 * r * p - 0.125 * q * q);
        let z = *resolvent_roots.last().unwrap();

        let mut u = z * z - r;
        let mut v = 2.0 * z - p;
        if u.abs() < VERY_SMALL {
            u = 0.0;
        } else if u > 0.0 {
            u = u.sqrt();
        } else {
            return Vec::new();
        }
        if v.abs() < VERY_SMALL {
            v = 0.0;
        } else if v > 0.0 {
            v = v.sqrt();
        } else {
            return Vec::new();
        }

        let sign = if q.is_sign_negative() { -1.0 } else { 1.0 };
        v *= sign;

        roots.extend(solve_quadric(v, z - u));
        roots.extend(solve_quadric(-v, z + u));
    }

    let sub = a / 4.0;
    let mut out: Vec<f64> = roots.into_iter().map(|y| y - sub).collect();
    out.sort_by(|x, y| x.partial_cmp(y).unwrap());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::vector::is_zero;

    fn check_cubic_root(a: f64, b: f64, c: f64, roots: &[f64]) {
        for &x in roots {
            let val = x * x * x + a * x * x + b * x + c;
            assert!(is_zero(val), "cubic residual {val} for root {x}");
        }
    }

    #[test]
    fn quadric_two_roots() {
        // x^2 - 3x + 2 = (x-1)(x-2)
        let r = solve_quadric(-3.0, 2.0);
        assert_eq!(r.len(), 2);
        assert!((r[0] - 1.0).abs() < 1e-9);
        assert!((r[1] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn quadric_no_real_roots() {
        assert!(solve_quadric(0.0, 1.0).is_empty());
    }

    #[test]
    fn cubic_known_roots() {
        // (x-1)(x-2)(x-3) = x^3 - 6x^2 + 11x - 6
        let roots = solve_cubic(-6.0, 11.0, -6.0);
        check_cubic_root(-6.0, 11.0, -6.0, &roots);
    }

    #[test]
    fn quartic_known_roots() {
        // (x-1)(x+1)(x-2)(x+2) = x^4 - 5x^2 + 4
        let roots = solve_quartic(0.0, -5.0, 0.0, 4.0);
        for &x in &roots {
            let val = x.powi(4) - 5.0 * x * x + 4.0;
            assert!(val.abs() < 1e-6, "quartic residual {val} for root {x}");
        }
    }
}
