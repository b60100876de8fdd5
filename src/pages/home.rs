use std::rc::Rc;

use leptos::callback::UnsyncCallback;
use leptos::prelude::*;
use leptos::task::spawn_local;
use log::error;

use crate::components::metrics_modal::MetricsModal;
use crate::components::plant_graph::PlantGraphCanvas;
use crate::config::DashboardConfig;
use crate::metrics::MetricRecord;
use crate::session::BrowserSession;

/// Dashboard for the line named in the `lineId` query parameter.
#[component]
pub fn Home() -> impl IntoView {
	let config = match DashboardConfig::from_location() {
		Ok(config) => config,
		Err(err) => {
			error!("{err}");
			return view! {
				<div class="dashboard-error">
					<h1>"No production line selected"</h1>
					<p>{err.to_string()}</p>
				</div>
			}
			.into_any();
		}
	};
	let title = format!("Line {}", config.line_id);

	let session: Rc<BrowserSession> = BrowserSession::for_browser(config);
	let session = StoredValue::new_local(session);
	let (loaded, set_loaded) = signal(false);
	let (status, set_status) = signal(None::<String>);
	let (modal, set_modal) = signal(None::<MetricRecord>);

	spawn_local(async move {
		let session = session.get_value();
		match session.load_topology().await {
			Ok(()) => {
				set_loaded.set(true);
				if let Err(err) = session.start_polling() {
					error!("Could not start metrics polling: {err}");
				}
			}
			Err(err) => {
				error!("Error fetching data: {err}");
				set_status.set(Some(format!("Could not load line: {err}")));
			}
		}
	});

	let on_save = move |_| {
		let session = session.get_value();
		spawn_local(async move {
			let message = match session.save_positions().await {
				Ok(result) if result.success => "Positions updated successfully!".to_owned(),
				Ok(_) => "Error updating positions. Please try again.".to_owned(),
				Err(err) => {
					error!("Error sending positions: {err}");
					"Error updating positions. Please try again.".to_owned()
				}
			};
			set_status.set(Some(message));
		});
	};
	let on_log = move |_| session.with_value(|s| s.log_positions());
	let on_log_graph = move |_| session.with_value(|s| s.log_graph());

	let graph_view = move || {
		loaded.get().then(|| {
			let on_node_tap = UnsyncCallback::new(move |node_id: String| {
				let session = session.get_value();
				spawn_local(async move {
					if let Some(record) = session.node_metrics(&node_id).await {
						set_modal.set(Some(record));
					}
				});
			});
			let graph = session.with_value(|s| s.graph().clone());
			view! { <PlantGraphCanvas graph=graph on_node_tap=on_node_tap fullscreen=true /> }
		})
	};

	view! {
		<div class="fullscreen-graph">
			{graph_view}
			<div class="graph-overlay">
				<h1>{title}</h1>
				<div class="graph-actions">
					<button on:click=on_save>"Save positions"</button>
					<button on:click=on_log>"Log positions"</button>
					<button on:click=on_log_graph>"Log graph"</button>
				</div>
				{move || status.get().map(|s| view! { <p class="subtitle">{s}</p> })}
			</div>
			<MetricsModal record=modal set_record=set_modal />
		</div>
	}
	.into_any()
}
