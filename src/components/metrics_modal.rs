use leptos::prelude::*;

use crate::metrics::MetricRecord;

fn or_na<T: ToString>(value: Option<T>) -> String {
	value.map(|v| v.to_string()).unwrap_or_else(|| "N/A".into())
}

/// Popup with the full metric detail of a clicked node. Hidden while `record`
/// is `None`; Close clears it.
#[component]
pub fn MetricsModal(
	record: ReadSignal<Option<MetricRecord>>,
	set_record: WriteSignal<Option<MetricRecord>>,
) -> impl IntoView {
	move || {
		record.get().map(|metric| {
			view! {
				<div id="metricsModal" class="metrics-modal">
					<h3>"Metrics"</h3>
					<p><strong>"Name: "</strong>{or_na(metric.name)}</p>
					<p><strong>"State: "</strong>{or_na(metric.state)}</p>
					<p><strong>"OEE: "</strong>{or_na(metric.oee)}</p>
					<p><strong>"Availability (A): "</strong>{or_na(metric.a)}</p>
					<p><strong>"Quality (Q): "</strong>{or_na(metric.q)}</p>
					<p><strong>"Performance (P): "</strong>{or_na(metric.p)}</p>
					<button on:click=move |_| set_record.set(None)>"Close"</button>
				</div>
			}
		})
	}
}
