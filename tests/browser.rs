#![cfg(target_arch = "wasm32")]
use plant_floor_graph::error::DashboardError;
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

#[wasm_bindgen_test]
fn rejected_fetch_keeps_error_message() {
	let err = js_sys::TypeError::new("Failed to fetch");
	let DashboardError::Js(message) = DashboardError::from_js(JsValue::from(err)) else {
		panic!("expected a Js error");
	};
	assert_eq!(message, "Failed to fetch");
}

#[wasm_bindgen_test]
fn thrown_string_is_kept_as_is() {
	let DashboardError::Js(message) = DashboardError::from_js(JsValue::from_str("boom")) else {
		panic!("expected a Js error");
	};
	assert_eq!(message, "boom");
}

#[wasm_bindgen_test]
fn plain_object_is_stringified() {
	let value = js_sys::JSON::parse(r#"{"code":7}"#).unwrap();
	let DashboardError::Js(message) = DashboardError::from_js(value) else {
		panic!("expected a Js error");
	};
	assert_eq!(message, r#"{"code":7}"#);
}
