use leptos::prelude::*;
use log::{error, info};

use crate::components::topic_map::{GraphData, GraphDataError, TopicMap};
use crate::domain::Domain;

const MATHEMATICS: &str = include_str!("../../assets/topics/mathematics.json");

/// Load the bundled mathematics map.
fn load_topics() -> Result<GraphData, GraphDataError> {
	let data = GraphData::from_json(MATHEMATICS);
	match &data {
		Ok(g) => info!("loaded {} topics, {} links", g.nodes.len(), g.edges.len()),
		Err(e) => error!("topic map data rejected: {e}"),
	}
	data
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let topics = load_topics();

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>
			{topics
				.map(|data| {
					let domain = data
						.center()
						.map(|c| Domain::from_topic_id(&c.slug))
						.unwrap_or(Domain::Mathematics);
					view! {
						<section class="topic-map-page">
							<h1>{domain.label()}</h1>
							<p class="subtitle">
								"Hover a branch to trace its prerequisites. Click to open it."
							</p>
							<TopicMap data=data />
						</section>
					}
				})}
		</ErrorBoundary>
	}
}
