//! Hash noise and curl field used to animate particles.
//!
//! The same functions exist twice: as Rust for CPU evaluation and tests,
//! and as WGSL in [`NOISE_WGSL`], which is prepended to the particle shader.
//! Both follow the same arithmetic in `f32`, but bit-exact agreement between
//! CPU and GPU is not expected (`sin` precision differs across drivers).
//!
//! # Available WGSL Functions
//!
//! - `hash3(p: vec3<f32>) -> f32` - scalar hash in [0, 1)
//! - `gradient_noise3(p: vec3<f32>) -> vec3<f32>` - three decorrelated hashes
//! - `curl3(p: vec3<f32>, eps: f32) -> vec3<f32>` - unit curl direction

use glam::Vec3;

/// Default central-difference step for [`curl3`].
pub const CURL_EPSILON: f32 = 0.1;

const HASH_COEFFS: Vec3 = Vec3::new(27.16898, 38.90563, 17.96873);
const HASH_SCALE: f32 = 43758.5453;

const NOISE_OFFSETS: [Vec3; 3] = [
    Vec3::new(1.32, 0.57, 9.2),
    Vec3::new(8.1, 2.7, 0.7),
    Vec3::new(4.8, 1.3, 5.9),
];

/// Hash a 3D point to a pseudo-random scalar in [0, 1).
///
/// Deterministic for a given input, aperiodic at the scales particles sample it.
#[inline]
pub fn hash3(p: Vec3) -> f32 {
    let x = p.dot(HASH_COEFFS).sin() * HASH_SCALE;
    let f = x - x.floor();
    // x - floor(x) rounds up to 1.0 for tiny negative x
    if f >= 1.0 {
        0.0
    } else {
        f
    }
}

/// Vector-valued noise: [`hash3`] sampled at three fixed offsets.
#[inline]
pub fn gradient_noise3(p: Vec3) -> Vec3 {
    Vec3::new(
        hash3(p + NOISE_OFFSETS[0]),
        hash3(p + NOISE_OFFSETS[1]),
        hash3(p + NOISE_OFFSETS[2]),
    )
}

/// Normalized curl of [`gradient_noise3`] estimated with central differences.
///
/// Falls back to `+Y` when the differences cancel out, so the result is
/// always a unit vector.
pub fn curl3(p: Vec3, eps: f32) -> Vec3 {
    let ex = Vec3::new(eps, 0.0, 0.0);
    let ey = Vec3::new(0.0, eps, 0.0);
    let ez = Vec3::new(0.0, 0.0, eps);

    let dx = gradient_noise3(p + ex) - gradient_noise3(p - ex);
    let dy = gradient_noise3(p + ey) - gradient_noise3(p - ey);
    let dz = gradient_noise3(p + ez) - gradient_noise3(p - ez);

    let curl = Vec3::new(dy.z - dz.y, dz.x - dx.z, dx.y - dy.x);
    curl.normalize_or(Vec3::Y)
}

/// WGSL code for the hash/curl noise field.
pub const NOISE_WGSL: &str = r#"
// Hash noise + curl field
fn hash3(p: vec3<f32>) -> f32 {
    let f = fract(sin(dot(p, vec3<f32>(27.16898, 38.90563, 17.96873))) * 43758.5453);
    return select(f, 0.0, f >= 1.0);
}

fn gradient_noise3(p: vec3<f32>) -> vec3<f32> {
    return vec3<f32>(
        hash3(p + vec3<f32>(1.32, 0.57, 9.2)),
        hash3(p + vec3<f32>(8.1, 2.7, 0.7)),
        hash3(p + vec3<f32>(4.8, 1.3, 5.9))
    );
}

fn curl3(p: vec3<f32>, eps: f32) -> vec3<f32> {
    let ex = vec3<f32>(eps, 0.0, 0.0);
    let ey = vec3<f32>(0.0, eps, 0.0);
    let ez = vec3<f32>(0.0, 0.0, eps);

    let dx = gradient_noise3(p + ex) - gradient_noise3(p - ex);
    let dy = gradient_noise3(p + ey) - gradient_noise3(p - ey);
    let dz = gradient_noise3(p + ez) - gradient_noise3(p - ez);

    let curl = vec3<f32>(dy.z - dz.y, dz.x - dx.z, dx.y - dy.x);
    let len = length(curl);
    return select(vec3<f32>(0.0, 1.0, 0.0), curl / max(len, 1e-8), len > 1e-8);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_points(count: usize, seed: u64) -> Vec<Vec3> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..count)
            .map(|_| {
                Vec3::new(
                    rng.gen_range(-20.0..20.0),
                    rng.gen_range(-20.0..20.0),
                    rng.gen_range(-20.0..20.0),
                )
            })
            .collect()
    }

    #[test]
    fn test_hash3_range() {
        for p in random_points(2000, 1) {
            let h = hash3(p);
            assert!((0.0..1.0).contains(&h), "hash3({p}) = {h}");
        }
    }

    #[test]
    fn test_hash3_deterministic() {
        let p = Vec3::new(0.25, 1.5, -3.0);
        assert_eq!(hash3(p), hash3(p));
        assert_eq!(gradient_noise3(p), gradient_noise3(p));
    }

    #[test]
    fn test_hash3_varies_spatially() {
        let a = hash3(Vec3::new(0.1, 0.2, 0.3));
        let b = hash3(Vec3::new(0.1, 0.2, 0.31));
        let c = hash3(Vec3::new(4.0, -2.0, 0.5));
        assert!(a != b || a != c);
    }

    #[test]
    fn test_gradient_noise_channels_differ() {
        let n = gradient_noise3(Vec3::new(0.5, 0.5, 0.5));
        assert!(n.x != n.y || n.y != n.z);
    }

    #[test]
    fn test_curl3_unit_length() {
        for p in random_points(1000, 7) {
            let c = curl3(p, CURL_EPSILON);
            assert!((c.length() - 1.0).abs() < 1e-4, "|curl3({p})| = {}", c.length());
        }
    }

    #[test]
    fn test_curl3_unit_length_other_epsilon() {
        for p in random_points(200, 11) {
            let c = curl3(p, 0.37);
            assert!((c.length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_noise_wgsl_declares_functions() {
        assert!(NOISE_WGSL.contains("fn hash3"));
        assert!(NOISE_WGSL.contains("fn gradient_noise3"));
        assert!(NOISE_WGSL.contains("fn curl3"));
        assert!(NOISE_WGSL.contains("43758.5453"));
    }
}
