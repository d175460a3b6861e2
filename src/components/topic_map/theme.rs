use web_sys::Element;

pub const DEFAULT_ACCENT: &str = "#ef4444";
pub const DEFAULT_SURFACE: &str = "#d4d4d4";
/// Label color for nodes that are neither active nor the center.
pub const MUTED_LABEL: &str = "#525252";

pub const ACCENT_TOKEN: &str = "--color-accent-500";
pub const SURFACE_TOKEN: &str = "--color-surface-300";

/// The two color tokens the topic map draws with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ThemeColors {
	pub accent: String,
	pub surface: String,
}

impl Default for ThemeColors {
	fn default() -> Self {
		Self {
			accent: DEFAULT_ACCENT.into(),
			surface: DEFAULT_SURFACE.into(),
		}
	}
}

fn token_or(value: Option<&str>, fallback: &str) -> String {
	match value.map(str::trim) {
		Some(v) if !v.is_empty() => v.to_string(),
		_ => fallback.to_string(),
	}
}

impl ThemeColors {
	/// Build from raw token values, substituting defaults for missing or blank ones.
	pub fn resolve(accent: Option<&str>, surface: Option<&str>) -> Self {
		Self {
			accent: token_or(accent, DEFAULT_ACCENT),
			surface: token_or(surface, DEFAULT_SURFACE),
		}
	}

	/// Read the tokens from the computed style of `el`, so custom properties
	/// scoped to the widget's own container win over the document root.
	pub fn from_element(el: &Element) -> Self {
		let style = web_sys::window().and_then(|w| w.get_computed_style(el).ok().flatten());
		let Some(style) = style else {
			log::debug!("no computed style for topic map container, using default colors");
			return Self::default();
		};
		let accent = style.get_property_value(ACCENT_TOKEN).ok();
		let surface = style.get_property_value(SURFACE_TOKEN).ok();
		Self::resolve(accent.as_deref(), surface.as_deref())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn blank_tokens_fall_back() {
		assert_eq!(ThemeColors::resolve(None, None), ThemeColors::default());
		assert_eq!(ThemeColors::resolve(Some(""), Some("   ")), ThemeColors::default());
	}

	#[test]
	fn present_tokens_are_trimmed() {
		let theme = ThemeColors::resolve(Some(" #22c55e "), None);
		assert_eq!(theme.accent, "#22c55e");
		assert_eq!(theme.surface, DEFAULT_SURFACE);
	}
}
