//! Deterministic cell keys.
//!
//! Coordinates are rounded to `precision` decimals by their exact binary
//! value, with exact ties going away from zero, and printed with exactly
//! `precision` decimals. `21.0281, 105.8542` becomes `SEG_21.028_105.854`
//! at the default precision of 3 (cells roughly 100m on a side).

use accident_risk_accident_models::Coordinate;

/// Decimal digits kept when bucketing coordinates into cells.
pub const DEFAULT_CELL_PRECISION: u32 = 3;

/// Rounds `value` to `precision` decimal digits, half away from zero.
///
/// When the scaled product lands exactly on a half, the product's rounding
/// error decides the direction, so `21.0285` (stored as
/// `21.028500000000001...`) rounds up and a value stored just below a
/// half rounds down. Negative zero is normalised to zero so `-0.0001` and
/// `0.0001` share a key.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn round_to(value: f64, precision: u32) -> f64 {
    let scale = 10_f64.powi(i32::try_from(precision).unwrap_or(i32::MAX));
    let scaled = value * scale;
    // exact residual of the multiplication
    let residual = value.mul_add(scale, -scaled);

    let integral = if scaled.fract().abs() == 0.5 && residual < 0.0 {
        scaled.floor()
    } else if scaled.fract().abs() == 0.5 && residual > 0.0 {
        scaled.ceil()
    } else {
        scaled.round()
    };

    let rounded = integral / scale;
    if rounded == 0.0 { 0.0 } else { rounded }
}

/// The key of the cell containing `location`.
#[must_use]
pub fn cell_key(location: Coordinate, precision: u32) -> String {
    let lat = round_to(location.latitude, precision);
    let lon = round_to(location.longitude, precision);
    let prec = precision as usize;
    format!("SEG_{lat:.prec$}_{lon:.prec$}")
}

/// The rounded corner that defines the cell containing `location`.
#[must_use]
pub fn cell_origin(location: Coordinate, precision: u32) -> Coordinate {
    Coordinate::new(
        round_to(location.latitude, precision),
        round_to(location.longitude, precision),
    )
}
