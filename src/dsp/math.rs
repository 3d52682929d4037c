/// Floored modulo: maps any finite `value` into `[0, modulus)`.
///
/// Unlike `%`, negative inputs wrap to the top of the range, so a cursor
/// moving backwards past zero lands on `modulus - step`.
#[inline]
pub fn wrap(value: f64, modulus: f64) -> f64 {
    let r = value.rem_euclid(modulus);
    // rem_euclid rounds tiny negative inputs up to exactly `modulus`
    if r >= modulus {
        0.0
    } else {
        r
    }
}

/// Linear interpolation between `a` and `b` by `t` in `[0, 1)`.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + t * (b - a)
}
