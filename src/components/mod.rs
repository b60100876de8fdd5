pub mod metrics_modal;
pub mod plant_graph;
