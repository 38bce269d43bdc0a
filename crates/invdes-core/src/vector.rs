//! Small helpers for `[f64; 3]` vectors.

pub fn dot(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

pub fn cross(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

pub fn norm(v: &[f64; 3]) -> f64 {
    dot(v, v).sqrt()
}

pub fn sub(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

pub fn scale(v: &[f64; 3], s: f64) -> [f64; 3] {
    [v[0] * s, v[1] * s, v[2] * s]
}

/// Unit vector along `v`, or `None` for a (near-)zero vector.
pub fn normalise(v: &[f64; 3]) -> Option<[f64; 3]> {
    let len = norm(v);
    if len < 1e-300 || !len.is_finite() {
        return None;
    }
    Some([v[0] / len, v[1] / len, v[2] / len])
}

/// Two unit tangents `(t1, t2)` completing a right-handed frame with `normal`,
/// i.e. `t1 × t2 = n`.
///
/// Returns `None` if `normal` has zero length.
pub fn orthonormal_frame(normal: &[f64; 3]) -> Option<([f64; 3], [f64; 3])> {
    let n = normalise(normal)?;

    // Choose a seed vector not parallel to n
    let seed = if n[0].abs() < 0.9 {
        [1.0, 0.0, 0.0]
    } else {
        [0.0, 1.0, 0.0]
    };

    // t1 = normalise(seed - (seed . n) n)
    let d = dot(&seed, &n);
    let t1 = normalise(&[seed[0] - d * n[0], seed[1] - d * n[1], seed[2] - d * n[2]])?;
    let t2 = cross(&n, &t1);
    Some((t1, t2))
}
