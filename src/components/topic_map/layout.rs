use super::projection::to_iso;

/// Design size the logical node coordinates were authored against.
pub const REFERENCE_WIDTH: f64 = 800.0;
pub const REFERENCE_HEIGHT: f64 = 500.0;

pub const HEIGHT_RATIO: f64 = 0.6;
pub const MIN_HEIGHT: f64 = 450.0;
pub const MAX_HEIGHT: f64 = 600.0;

/// Lower bound on the fit scale; a zero-width host still yields a drawable graph.
pub const MIN_SCALE: f64 = 0.05;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
	pub width: f64,
	pub height: f64,
	pub scale: f64,
}

impl Default for Viewport {
	fn default() -> Self {
		Self {
			width: REFERENCE_WIDTH,
			height: REFERENCE_HEIGHT,
			scale: 1.0,
		}
	}
}

/// Shrink-to-fit scale for a render surface, never above 1.
pub fn fit_scale(width: f64, height: f64) -> f64 {
	let scale = (width / REFERENCE_WIDTH)
		.min(height / REFERENCE_HEIGHT)
		.min(1.0);
	// only a collapsed or NaN fit falls back to the floor
	if scale.is_nan() || scale <= 0.0 {
		return MIN_SCALE;
	}
	scale
}

impl Viewport {
	/// Viewport for a host surface of the given width.
	pub fn for_host_width(host_width: f64) -> Self {
		let width = if host_width.is_finite() {
			host_width.max(0.0)
		} else {
			0.0
		};
		let height = (width * HEIGHT_RATIO).clamp(MIN_HEIGHT, MAX_HEIGHT);
		Self {
			width,
			height,
			scale: fit_scale(width, height),
		}
	}

	pub fn center(&self) -> (f64, f64) {
		(self.width / 2.0, self.height / 2.0)
	}

	/// Logical coordinate to screen coordinate: scale, project, then
	/// translate to the viewport center.
	pub fn to_screen(&self, x: f64, y: f64) -> (f64, f64) {
		let (ix, iy) = to_iso(x * self.scale, y * self.scale);
		let (cx, cy) = self.center();
		(cx + ix, cy + iy)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn reference_size_is_native_scale() {
		assert_eq!(fit_scale(800.0, 500.0), 1.0);
		assert_eq!(fit_scale(1600.0, 1000.0), 1.0);
	}

	#[test]
	fn narrow_host_shrinks_to_fit() {
		let vp = Viewport::for_host_width(400.0);
		assert_eq!(vp.width, 400.0);
		assert_eq!(vp.height, 450.0);
		assert_eq!(vp.scale, 0.5);
	}

	#[test]
	fn height_follows_width_within_clamp() {
		assert_eq!(Viewport::for_host_width(800.0).height, 480.0);
		assert_eq!(Viewport::for_host_width(800.0).scale, 0.96);
		assert_eq!(Viewport::for_host_width(2000.0).height, 600.0);
		assert_eq!(Viewport::for_host_width(2000.0).scale, 1.0);
	}

	#[test]
	fn degenerate_hosts_keep_scale_in_range() {
		for w in [0.0, -10.0, f64::NAN, f64::INFINITY, 1.0] {
			let vp = Viewport::for_host_width(w);
			assert!(vp.scale > 0.0 && vp.scale <= 1.0, "width {w} gave {vp:?}");
			assert!(vp.height >= MIN_HEIGHT);
		}
	}

	#[test]
	fn tiny_hosts_follow_the_fit_formula() {
		assert_eq!(fit_scale(30.0, 450.0), 0.0375);
		assert_eq!(Viewport::for_host_width(30.0).scale, 0.0375);
		assert_eq!(fit_scale(0.0, 450.0), MIN_SCALE);
	}

	#[test]
	fn origin_lands_on_viewport_center() {
		let vp = Viewport::for_host_width(1000.0);
		assert_eq!(vp.to_screen(0.0, 0.0), vp.center());
	}
}
