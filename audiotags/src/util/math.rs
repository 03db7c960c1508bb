//! Integer arithmetic for deriving audio properties

/// Division rounding to the nearest integer, halves round up
///
/// Dividing by zero yields `None`.
pub(crate) trait RoundedDivision<Rhs = Self>: Sized {
	fn div_round(self, rhs: Rhs) -> Option<Self>;
}

impl RoundedDivision for u64 {
	fn div_round(self, rhs: Self) -> Option<Self> {
		if rhs == 0 {
			return None;
		}

		let quotient = self / rhs;
		let remainder = self % rhs;
		Some(if remainder >= rhs - rhs / 2 { quotient + 1 } else { quotient })
	}
}

/// The milliseconds spanned by `samples` at `sample_rate`
pub(crate) fn samples_to_millis(samples: u64, sample_rate: u32) -> Option<u64> {
	samples
		.checked_mul(1000)?
		.div_round(u64::from(sample_rate))
}

/// The kilobits per second needed to play `bytes` in `millis`
///
/// Bits per millisecond are kilobits per second.
pub(crate) fn kbps(bytes: u64, millis: u64) -> u32 {
	match bytes.saturating_mul(8).checked_div(millis) {
		Some(rate) => u32::try_from(rate).unwrap_or(u32::MAX),
		None => 0,
	}
}

#[cfg(test)]
mod tests {
	use super::{RoundedDivision, kbps, samples_to_millis};

	#[test_log::test]
	fn div_round() {
		let cases: [(u64, u64, Option<u64>); 7] = [
			(1, 1, Some(1)),
			(1, 2, Some(1)),
			(3, 2, Some(2)),
			(5, 3, Some(2)),
			(4, 3, Some(1)),
			(0, 4000, Some(0)),
			(1, 0, None),
		];

		for (lhs, rhs, expected) in cases {
			assert_eq!(lhs.div_round(rhs), expected, "{lhs}.div_round({rhs})");
		}
	}

	#[test_log::test]
	fn durations_and_rates() {
		assert_eq!(samples_to_millis(88200, 44100), Some(2000));
		assert_eq!(samples_to_millis(1152, 44100), Some(26));
		assert_eq!(samples_to_millis(1, 0), None);

		// 16 kB in one second
		assert_eq!(kbps(16_000, 1000), 128);
		assert_eq!(kbps(16_000, 0), 0);
	}
}
