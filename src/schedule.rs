//! Browser timers driving the metrics cycle.

use std::time::Duration;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use crate::error::DashboardError;

fn millis(duration: Duration) -> i32 {
	duration.as_millis().min(i32::MAX as u128) as i32
}

/// A one-shot tick after `initial_delay`, then one every `interval`.
///
/// Both timers are cleared when the schedule is dropped.
pub struct PollSchedule {
	timeout_handle: i32,
	interval_handle: i32,
	_first: Closure<dyn FnMut()>,
	_every: Closure<dyn FnMut()>,
}

impl PollSchedule {
	pub fn start<F>(initial_delay: Duration, interval: Duration, tick: F) -> Result<Self, DashboardError>
	where
		F: Fn() + Clone + 'static,
	{
		let window = web_sys::window().ok_or(DashboardError::NoWindow)?;
		let first_tick = tick.clone();
		let first = Closure::<dyn FnMut()>::new(move || first_tick());
		let every = Closure::<dyn FnMut()>::new(move || tick());

		let timeout_handle = window
			.set_timeout_with_callback_and_timeout_and_arguments_0(
				first.as_ref().unchecked_ref(),
				millis(initial_delay),
			)
			.map_err(DashboardError::from_js)?;
		let interval_handle = match window.set_interval_with_callback_and_timeout_and_arguments_0(
			every.as_ref().unchecked_ref(),
			millis(interval),
		) {
			Ok(handle) => handle,
			Err(err) => {
				window.clear_timeout_with_handle(timeout_handle);
				return Err(DashboardError::from_js(err));
			}
		};

		Ok(Self {
			timeout_handle,
			interval_handle,
			_first: first,
			_every: every,
		})
	}
}

impl Drop for PollSchedule {
	fn drop(&mut self) {
		if let Some(window) = web_sys::window() {
			window.clear_timeout_with_handle(self.timeout_handle);
			window.clear_interval_with_handle(self.interval_handle);
		}
	}
}
