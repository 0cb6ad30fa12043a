use std::time::{Duration, Instant};

pub fn with_timing<T>(cb: impl FnOnce() -> T) -> (T, Duration) {
	let start = Instant::now();
	let result = cb();

	(result, start.elapsed())
}
