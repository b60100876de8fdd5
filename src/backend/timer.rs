use std::future::Future;
use std::pin::pin;
use std::time::Duration;

use futures_util::future::{Either, select};
use wasm_bindgen_futures::JsFuture;

use crate::error::DashboardError;

/// Source of delays for request timeouts.
pub trait Timer {
	fn sleep(&self, duration: Duration) -> impl Future<Output = ()>;
}

/// `setTimeout`-backed timer.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserTimer;

impl Timer for BrowserTimer {
	fn sleep(&self, duration: Duration) -> impl Future<Output = ()> {
		let millis = duration.as_millis().min(i32::MAX as u128) as i32;
		let promise = js_sys::Promise::new(&mut |resolve, _reject| {
			// Without a window the promise never settles and the request runs unbounded.
			if let Some(window) = web_sys::window() {
				let _ = window
					.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, millis);
			}
		});
		async move {
			let _ = JsFuture::from(promise).await;
		}
	}
}

/// Run `fut`, giving up with [`DashboardError::Timeout`] once `sleep` finishes first.
pub async fn with_timeout<T, F, S>(fut: F, sleep: S, limit: Duration) -> Result<T, DashboardError>
where
	F: Future<Output = Result<T, DashboardError>>,
	S: Future<Output = ()>,
{
	let fut = pin!(fut);
	let sleep = pin!(sleep);
	match select(fut, sleep).await {
		Either::Left((result, _)) => result,
		Either::Right(((), _)) => Err(DashboardError::Timeout(limit)),
	}
}

#[cfg(test)]
mod tests {
	use futures_util::future::{pending, ready};

	use super::*;

	#[test]
	fn finished_request_wins() {
		let result = pollster::block_on(with_timeout(
			ready(Ok::<_, DashboardError>(7)),
			pending(),
			Duration::from_secs(1),
		));
		assert_eq!(result.unwrap(), 7);
	}

	#[test]
	fn hung_request_times_out() {
		let result = pollster::block_on(with_timeout(
			pending::<Result<u8, DashboardError>>(),
			ready(()),
			Duration::from_secs(3),
		));
		assert!(matches!(result, Err(DashboardError::Timeout(d)) if d == Duration::from_secs(3)));
	}
}
