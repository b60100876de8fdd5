use leptos::prelude::*;
use plant_floor_graph::{App, init_logging};

fn main() {
	init_logging();
	mount_to_body(App)
}
