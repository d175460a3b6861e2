/// Top-level knowledge-base sections.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Domain {
	Mathematics,
	ComputerScience,
}

impl Domain {
	/// Domain of a topic path such as `computer-science/algorithms`.
	/// Anything outside computer science is filed under mathematics.
	pub fn from_topic_id(topic_id: &str) -> Self {
		match topic_id.split('/').next() {
			Some("computer-science") => Domain::ComputerScience,
			_ => Domain::Mathematics,
		}
	}

	pub fn label(&self) -> &'static str {
		match self {
			Domain::Mathematics => "Mathematics",
			Domain::ComputerScience => "Computer Science",
		}
	}
}
