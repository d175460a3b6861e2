/// Handle for a scheduled deactivation. Only the most recently issued
/// ticket can expire the active node; older ones are stale.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeactivationTicket(u64);

/// Result of the pointer entering a node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HoverOutcome {
	/// The node was already active (re-entry inside the linger window).
	Unchanged,
	Activated {
		id: String,
		/// First activation of this node in the current hover session.
		sound: bool,
	},
}

/// Which node is hovered, with a debounced hand-off back to idle.
#[derive(Clone, Debug, Default)]
pub struct InteractionState {
	active: Option<String>,
	pending: Option<DeactivationTicket>,
	generation: u64,
	last_sounded: Option<String>,
}

impl InteractionState {
	pub fn active(&self) -> Option<&str> {
		self.active.as_deref()
	}

	pub fn is_active(&self, id: &str) -> bool {
		self.active.as_deref() == Some(id)
	}

	/// Activation is immediate and cancels any pending deactivation.
	pub fn enter(&mut self, id: &str) -> HoverOutcome {
		self.pending = None;
		if self.is_active(id) {
			return HoverOutcome::Unchanged;
		}
		self.active = Some(id.to_string());

		HoverOutcome::Activated {
			id: id.to_string(),
			sound: self.last_sounded.as_deref() != Some(id),
		}
	}

	/// Record that `id` actually produced a tick in this hover session.
	pub fn mark_sounded(&mut self, id: &str) {
		self.last_sounded = Some(id.to_string());
	}

	/// Leaving does not deactivate; it issues a ticket the caller should
	/// redeem with [`Self::expire`] after the linger delay.
	pub fn leave(&mut self) -> Option<DeactivationTicket> {
		self.active.as_ref()?;
		self.generation += 1;
		let ticket = DeactivationTicket(self.generation);
		self.pending = Some(ticket);
		Some(ticket)
	}

	/// Returns true if the ticket was current and the state went idle.
	pub fn expire(&mut self, ticket: DeactivationTicket) -> bool {
		if self.pending != Some(ticket) {
			return false;
		}
		self.pending = None;
		self.active = None;
		self.last_sounded = None;
		true
	}

	/// Back to the freshly mounted state. Outstanding tickets become stale.
	pub fn reset(&mut self) {
		self.active = None;
		self.pending = None;
		self.last_sounded = None;
		self.generation += 1;
	}
}
