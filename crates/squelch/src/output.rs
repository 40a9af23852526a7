use std::collections::VecDeque;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::Mutex;

pub const DEFAULT_CAPACITY: usize = 200;

/// Most recent lines of child output, oldest first.
///
/// Clones share the same buffer. Writers never block on readers beyond the
/// lock itself: once full, every push evicts the oldest line.
#[derive(Clone)]
pub struct LogRing {
	lines: Arc<Mutex<VecDeque<String>>>,
	capacity: usize,
}

impl LogRing {
	pub fn new(capacity: usize) -> Self {
		let capacity = capacity.max(1);
		Self {
			lines: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
			capacity,
		}
	}

	pub fn capacity(&self) -> usize {
		self.capacity
	}

	pub async fn push(&self, line: String) {
		let mut lines = self.lines.lock().await;
		if lines.len() >= self.capacity {
			lines.pop_front();
		}
		lines.push_back(line);
	}

	pub async fn snapshot(&self) -> Vec<String> {
		let lines = self.lines.lock().await;
		lines.iter().cloned().collect()
	}

	pub async fn len(&self) -> usize {
		self.lines.lock().await.len()
	}
}

impl Default for LogRing {
	fn default() -> Self {
		Self::new(DEFAULT_CAPACITY)
	}
}

/// Drain `reader` line by line into `ring` until end of stream.
///
/// Trailing whitespace (including the newline) is stripped and invalid UTF-8
/// is replaced. Returns the number of lines read.
pub async fn tail_lines<R: AsyncRead + Unpin>(reader: R, ring: LogRing) -> usize {
	let mut reader = BufReader::new(reader);
	let mut buf = Vec::new();
	let mut count = 0;

	loop {
		buf.clear();
		match reader.read_until(b'\n', &mut buf).await {
			Ok(0) => break,
			Ok(_) => {
				let line = String::from_utf8_lossy(&buf);
				ring.push(line.trim_end().to_string()).await;
				count += 1;
			}
			Err(e) => {
				tracing::debug!("output stream error: {}", e);
				break;
			}
		}
	}

	count
}
