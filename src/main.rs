use leptos::prelude::*;
use topic_map::{App, init_logging};

fn main() {
	init_logging();
	mount_to_body(App);
}
