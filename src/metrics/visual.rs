use super::types::MetricRecord;

/// Extension appended to state icon names.
pub const ICON_EXTENSION: &str = "svg";

/// Node label for a metric: display name (or the node's original label) over
/// the OEE line.
pub fn metric_label(record: &MetricRecord, original_label: &str, oee: f64) -> String {
	let name = record
		.name
		.as_deref()
		.filter(|n| !n.is_empty())
		.unwrap_or(original_label);
	format!("{name}\n\nOEE: {oee}%")
}

/// Asset path for a server-supplied icon reference. Only the last path
/// segment of the reference is kept.
pub fn icon_asset_path(asset_base: &str, state_icon: &str) -> String {
	let name = state_icon.rsplit('/').next().unwrap_or(state_icon);
	format!(
		"{}/{name}.{ICON_EXTENSION}",
		asset_base.trim_end_matches('/')
	)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn label_prefers_metric_name() {
		let record = MetricRecord {
			name: Some("Pump".into()),
			..MetricRecord::default()
		};
		assert_eq!(metric_label(&record, "Filler", 87.0), "Pump\n\nOEE: 87%");
	}

	#[test]
	fn label_falls_back_to_original() {
		let unnamed = MetricRecord::default();
		assert_eq!(metric_label(&unnamed, "Filler", 64.25), "Filler\n\nOEE: 64.25%");

		let blank = MetricRecord {
			name: Some(String::new()),
			..MetricRecord::default()
		};
		assert_eq!(metric_label(&blank, "Filler", 0.0), "Filler\n\nOEE: 0%");
	}

	#[test]
	fn icon_keeps_last_segment() {
		assert_eq!(icon_asset_path("/assets", "foo/bar/baz-icon"), "/assets/baz-icon.svg");
		assert_eq!(icon_asset_path("/assets/", "running"), "/assets/running.svg");
		assert!(icon_asset_path("/a", "foo/bar/baz-icon").ends_with("baz-icon.svg"));
	}
}
