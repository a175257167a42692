//! Next-window selection from checkpoint, tip and window policy.
//!
//! The calculator is a pure value: it never queries the chain itself and
//! never caches a tip across iterations, so a transient lower tip reading
//! can only ever produce an empty range, not an invalid one.

use crate::models::BlockRange;

/// Computes the next inclusive height window for a polling job.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockRangeCalculator {
	/// Explicit height to start from when no checkpoint exists.
	start_height: Option<u64>,
	/// Bounded backfills stop once this height has been covered.
	end_height: Option<u64>,
	/// Caps the number of blocks one iteration may cover.
	max_blocks_per_iteration: Option<u64>,
}

impl BlockRangeCalculator {
	pub fn new(
		start_height: Option<u64>,
		end_height: Option<u64>,
		max_blocks_per_iteration: Option<u64>,
	) -> Self {
		BlockRangeCalculator {
			start_height,
			end_height,
			max_blocks_per_iteration,
		}
	}

	/// Selects the next window given the last processed height and the tip
	/// read this iteration.
	///
	/// - No checkpoint and no configured start: `[tip, tip]`. New jobs watch
	///   from the current tip, they never backfill from genesis.
	/// - Checkpoint present: `[last + 1, tip]`, clipped to the tip; when
	///   `last + 1 > tip` there is nothing to fetch and `None` is returned.
	/// - The optional window cap paces large backlogs across iterations.
	pub fn next_range(&self, last_processed: Option<u64>, tip: u64) -> Option<BlockRange> {
		let from = match last_processed {
			Some(last) => last.checked_add(1)?,
			None => self.start_height.unwrap_or(tip),
		};

		let mut to = tip;
		if let Some(end) = self.end_height {
			to = to.min(end);
		}
		if let Some(max) = self.max_blocks_per_iteration {
			// from + max - 1 keeps the window inclusive of `from`
			to = to.min(from.saturating_add(max.saturating_sub(1)));
		}

		BlockRange::new(from, to)
	}

	/// True when a bounded backfill has covered its configured end height.
	pub fn is_exhausted(&self, last_processed: Option<u64>) -> bool {
		match (self.end_height, last_processed) {
			(Some(end), Some(last)) => last >= end,
			_ => false,
		}
	}
}
