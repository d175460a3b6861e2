use std::f64::consts::FRAC_PI_6;

/// Isometric projection of a logical coordinate. Linear, so callers apply
/// the viewport scale before projecting and translate afterwards.
pub fn to_iso(x: f64, y: f64) -> (f64, f64) {
	((x - y) * FRAC_PI_6.cos(), (x + y) * FRAC_PI_6.sin())
}
