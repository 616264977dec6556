/// Largest drive magnitude accepted by the PWM output stage.
pub const DRIVE_LIMIT: i32 = 255;

/// Limit `value` to `limit` in magnitude, keeping its sign.
pub fn clamp_magnitude(value: f64, limit: f64) -> f64 {
    if value.abs() > limit {
        rescale_magnitude(value, limit)
    } else {
        value
    }
}

/// Scale `value` so its magnitude is exactly `magnitude`, keeping its sign.
///
/// Zero has no direction and stays zero.
pub fn rescale_magnitude(value: f64, magnitude: f64) -> f64 {
    if value == 0.0 {
        return 0.0;
    }
    magnitude.copysign(value)
}

/// Clamp a signed drive value to `[-DRIVE_LIMIT, DRIVE_LIMIT]`.
pub fn clamp_drive(value: i32) -> i32 {
    value.clamp(-DRIVE_LIMIT, DRIVE_LIMIT)
}
