//! Interpolation helpers:
//! - lerp over scalars, fixed vectors and raw float slices
//! - quaternion SLERP with shortest-arc correction (NLERP fallback for tiny angles)
//! - cubic-bezier timing curves used by the easing interpolators

/// Below this angle cosine the quaternions are far enough apart for SLERP.
const SLERP_DOT_THRESHOLD: f32 = 0.9995;

/// Linear interpolation of scalars.
#[inline]
pub fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[inline]
pub fn lerp_vec3(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    [
        lerp_f32(a[0], b[0], t),
        lerp_f32(a[1], b[1], t),
        lerp_f32(a[2], b[2], t),
    ]
}

/// Component-wise lerp of two equally sized slices into `out`.
#[inline]
pub fn lerp_slice(a: &[f32], b: &[f32], t: f32, out: &mut [f32]) {
    for ((o, va), vb) in out.iter_mut().zip(a).zip(b) {
        *o = lerp_f32(*va, *vb, t);
    }
}

#[inline]
pub fn dot4(a: [f32; 4], b: [f32; 4]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2] + a[3] * b[3]
}

#[inline]
pub fn normalize4(mut q: [f32; 4]) -> [f32; 4] {
    let len2 = dot4(q, q);
    if len2 > 0.0 {
        let inv_len = len2.sqrt().recip();
        q[0] *= inv_len;
        q[1] *= inv_len;
        q[2] *= inv_len;
        q[3] *= inv_len;
    }
    q
}

/// Quaternion NLERP with shortest-arc correction.
/// If dot < 0, negate the second quaternion to ensure the shortest path.
/// Returns a normalized quaternion (x,y,z,w).
#[inline]
pub fn nlerp_quat(a: [f32; 4], mut b: [f32; 4], t: f32) -> [f32; 4] {
    if dot4(a, b) < 0.0 {
        b = [-b[0], -b[1], -b[2], -b[3]];
    }
    normalize4([
        lerp_f32(a[0], b[0], t),
        lerp_f32(a[1], b[1], t),
        lerp_f32(a[2], b[2], t),
        lerp_f32(a[3], b[3], t),
    ])
}

/// Quaternion SLERP along the shortest arc, constant angular velocity in `t`.
///
/// Inputs need not be normalized; the result is only as normalized as the inputs.
/// Nearly parallel inputs fall back to NLERP to avoid dividing by `sin(~0)`.
#[inline]
pub fn slerp_quat(a: [f32; 4], mut b: [f32; 4], t: f32) -> [f32; 4] {
    let mut cos_theta = dot4(a, b);
    if cos_theta < 0.0 {
        b = [-b[0], -b[1], -b[2], -b[3]];
        cos_theta = -cos_theta;
    }
    if cos_theta > SLERP_DOT_THRESHOLD {
        return nlerp_quat(a, b, t);
    }
    let theta = cos_theta.min(1.0).acos();
    let sin_theta = theta.sin();
    let wa = ((1.0 - t) * theta).sin() / sin_theta;
    let wb = (t * theta).sin() / sin_theta;
    [
        a[0] * wa + b[0] * wb,
        a[1] * wa + b[1] * wb,
        a[2] * wa + b[2] * wb,
        a[3] * wa + b[3] * wb,
    ]
}

/// Cubic Bezier basis function
#[inline]
fn cubic_bezier(p0: f32, p1: f32, p2: f32, p3: f32, t: f32) -> f32 {
    let u = 1.0 - t;
    u * u * u * p0 + 3.0 * u * u * t * p1 + 3.0 * u * t * t * p2 + t * t * t * p3
}

/// Given control points (x1, y1, x2, y2) and an input t in [0,1],
/// compute the eased y by inverting the x bezier via binary search.
#[inline]
pub fn bezier_ease(t: f32, x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    // Bezier(0,0,1,1) is exactly linear
    if x1 == 0.0 && y1 == 0.0 && x2 == 1.0 && y2 == 1.0 {
        return t;
    }
    // Monotonic X in [0,1] assumed for x1/x2 in [0,1]
    let mut lo = 0.0f32;
    let mut hi = 1.0f32;
    let mut mid = t;
    for _ in 0..24 {
        let x = cubic_bezier(0.0, x1, x2, 1.0, mid);
        if (x - t).abs() < 1e-6 {
            break;
        }
        if x < t {
            lo = mid;
        } else {
            hi = mid;
        }
        mid = 0.5 * (lo + hi);
    }
    cubic_bezier(0.0, y1, y2, 1.0, mid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32, eps: f32) {
        assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
    }

    // 90 degrees about Z
    const Z90: [f32; 4] = [0.0, 0.0, std::f32::consts::FRAC_1_SQRT_2, std::f32::consts::FRAC_1_SQRT_2];
    const IDENT: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

    #[test]
    fn slerp_endpoints_and_midpoint() {
        let q0 = slerp_quat(IDENT, Z90, 0.0);
        let q1 = slerp_quat(IDENT, Z90, 1.0);
        for i in 0..4 {
            approx(q0[i], IDENT[i], 1e-6);
            approx(q1[i], Z90[i], 1e-6);
        }
        // halfway is 45 degrees about Z
        let mid = slerp_quat(IDENT, Z90, 0.5);
        let half = std::f32::consts::FRAC_PI_8;
        approx(mid[2], half.sin(), 1e-5);
        approx(mid[3], half.cos(), 1e-5);
    }

    #[test]
    fn slerp_has_constant_angular_velocity() {
        // quarter step of a 90 degree turn must be 22.5 degrees, nlerp would not be
        let q = slerp_quat(IDENT, Z90, 0.25);
        let angle = 2.0 * q[3].acos();
        approx(angle, std::f32::consts::FRAC_PI_8, 1e-5);
    }

    #[test]
    fn slerp_takes_shortest_arc() {
        let neg = [-Z90[0], -Z90[1], -Z90[2], -Z90[3]];
        let a = slerp_quat(IDENT, Z90, 0.5);
        let b = slerp_quat(IDENT, neg, 0.5);
        for i in 0..4 {
            approx(a[i], b[i], 1e-6);
        }
    }

    #[test]
    fn nlerp_is_normalized() {
        let q = nlerp_quat(IDENT, Z90, 0.3);
        approx(dot4(q, q), 1.0, 1e-6);
    }

    #[test]
    fn lerp_slice_componentwise() {
        let mut out = [0.0; 3];
        lerp_slice(&[0.0, 10.0, -2.0], &[10.0, 20.0, 2.0], 0.25, &mut out);
        assert_eq!(out, [2.5, 12.5, -1.0]);
    }

    #[test]
    fn bezier_linear_fast_path_and_ends() {
        approx(bezier_ease(0.37, 0.0, 0.0, 1.0, 1.0), 0.37, 0.0);
        approx(bezier_ease(0.0, 0.42, 0.0, 0.58, 1.0), 0.0, 1e-4);
        approx(bezier_ease(1.0, 0.42, 0.0, 0.58, 1.0), 1.0, 1e-4);
        // symmetric ease-in-out passes through the middle
        approx(bezier_ease(0.5, 0.42, 0.0, 0.58, 1.0), 0.5, 1e-3);
    }
}
