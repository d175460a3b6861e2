use std::rc::Rc;

use log::debug;

use super::audio::{SoundHandle, TickOutcome};
use super::state::{DeactivationTicket, HoverOutcome, InteractionState};
use super::types::TopicNode;

/// Tunables for one topic map instance.
#[derive(Clone, Debug, PartialEq)]
pub struct TopicMapConfig {
	/// How long a node stays active after the pointer leaves it.
	pub deactivation_linger_ms: u32,
	pub sound_enabled: bool,
}

impl Default for TopicMapConfig {
	fn default() -> Self {
		Self {
			deactivation_linger_ms: 100,
			sound_enabled: true,
		}
	}
}

pub type Navigate = Rc<dyn Fn(&str)>;

/// A pending click navigation. Run it once no borrow of the controller is
/// held, since the host callback may tear the map down.
pub struct Activation {
	navigate: Navigate,
	slug: String,
}

impl Activation {
	pub fn run(self) {
		debug!("navigating to `{}`", self.slug);
		(self.navigate)(&self.slug);
	}
}

/// Routes pointer events through the interaction state and fires the
/// sound and navigation side effects.
pub struct TopicMapController {
	state: InteractionState,
	sound: Option<SoundHandle>,
	navigate: Navigate,
}

impl TopicMapController {
	pub fn new(sound: Option<SoundHandle>, navigate: Navigate) -> Self {
		Self {
			state: InteractionState::default(),
			sound,
			navigate,
		}
	}

	pub fn active(&self) -> Option<&str> {
		self.state.active()
	}

	/// Returns the tick outcome when the activation asked for a sound.
	/// Only a tick that actually played makes the node the session's last
	/// sounded one; throttled and muted ticks leave it untouched.
	pub fn pointer_enter(&mut self, id: &str, now_ms: f64) -> Option<TickOutcome> {
		let HoverOutcome::Activated { id, sound } = self.state.enter(id) else {
			return None;
		};
		debug!("topic `{id}` active");
		if !sound {
			return None;
		}
		let outcome = self.sound.as_ref()?.tick(now_ms);
		if outcome == TickOutcome::Played {
			self.state.mark_sounded(&id);
		}
		Some(outcome)
	}

	pub fn pointer_leave(&mut self) -> Option<DeactivationTicket> {
		self.state.leave()
	}

	/// Linger timer callback. True if the map went idle.
	pub fn deactivation_elapsed(&mut self, ticket: DeactivationTicket) -> bool {
		let idle = self.state.expire(ticket);
		if idle {
			debug!("topic map idle");
		}
		idle
	}

	/// Navigation to the node's page. Independent of hover state.
	pub fn activate(&self, node: &TopicNode) -> Activation {
		Activation {
			navigate: self.navigate.clone(),
			slug: node.slug.clone(),
		}
	}

	pub fn teardown(&mut self) {
		self.state.reset();
	}
}
