use std::{fmt, str::FromStr};

use crate::{Error, Result};

/// A minimum-should-match specification in the engine's standard grammar.
///
/// Supported forms are `3`, `-2`, `75%`, `-25%`, and conditional chains such as
/// `2<75% 9<-3`. For a chain, an optional clause count at or below the first bound requires
/// every clause; past a bound, that bound's spec applies until a later bound takes over.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MinimumShouldMatch {
	raw: String,
	conditions: Vec<(u32, Simple)>,
	simple: Option<Simple>,
}
impl MinimumShouldMatch {
	pub fn as_str(&self) -> &str {
		&self.raw
	}

	/// Number of optional clauses that must match, clamped to `0..=optional_clauses`.
	pub fn resolve(&self, optional_clauses: usize) -> u32 {
		let count = i64::try_from(optional_clauses).unwrap_or(i64::MAX);
		let resolved = match self.simple {
			Some(simple) => simple.resolve(count),
			None => {
				let mut result = count;

				for (bound, spec) in &self.conditions {
					if count <= i64::from(*bound) {
						break;
					}

					result = spec.resolve(count);
				}

				result
			},
		};

		u32::try_from(resolved.clamp(0, count)).unwrap_or(u32::MAX)
	}
}
impl FromStr for MinimumShouldMatch {
	type Err = Error;

	fn from_str(spec: &str) -> Result<Self> {
		let raw = spec.trim();

		if raw.is_empty() {
			return Err(invalid(spec, "spec must be non-empty."));
		}
		if !raw.contains('<') {
			let simple =
				Simple::parse(raw).ok_or_else(|| invalid(spec, "expected N, -N, P% or -P%."))?;

			return Ok(Self { raw: raw.to_string(), conditions: Vec::new(), simple: Some(simple) });
		}

		let normalized = normalize_conditions(raw);
		let mut conditions = Vec::new();

		for part in normalized.split_whitespace() {
			let Some((bound, rest)) = part.split_once('<') else {
				return Err(invalid(spec, "every condition must have the form N<spec."));
			};
			let bound = bound
				.parse::<u32>()
				.map_err(|_| invalid(spec, "condition bounds must be non-negative integers."))?;
			let simple = Simple::parse(rest)
				.ok_or_else(|| invalid(spec, "condition specs must be N, -N, P% or -P%."))?;

			if let Some((previous, _)) = conditions.last()
				&& *previous >= bound
			{
				return Err(invalid(spec, "condition bounds must be strictly increasing."));
			}

			conditions.push((bound, simple));
		}

		Ok(Self { raw: raw.to_string(), conditions, simple: None })
	}
}
impl fmt::Display for MinimumShouldMatch {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.raw)
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Simple {
	Count(i64),
	Percent(i64),
}
impl Simple {
	fn parse(raw: &str) -> Option<Self> {
		match raw.strip_suffix('%') {
			Some(percent) => percent.parse::<i64>().ok().map(Self::Percent),
			None => raw.parse::<i64>().ok().map(Self::Count),
		}
	}

	fn resolve(self, count: i64) -> i64 {
		let (negative, calc) = match self {
			Self::Count(n) => (n < 0, n),
			// Truncates toward zero, like the engine's float-to-int cast.
			Self::Percent(p) => (p < 0, count.saturating_mul(p) / 100),
		};
		let result = if negative { count + calc } else { calc };

		result.max(0)
	}
}

fn normalize_conditions(raw: &str) -> String {
	let mut out = String::with_capacity(raw.len());
	let mut chars = raw.chars().peekable();

	while let Some(ch) = chars.next() {
		if ch == '<' {
			while out.ends_with(char::is_whitespace) {
				out.pop();
			}

			out.push('<');

			while chars.peek().is_some_and(|next| next.is_whitespace()) {
				chars.next();
			}
		} else {
			out.push(ch);
		}
	}

	out
}

fn invalid(spec: &str, message: &str) -> Error {
	Error::InvalidMinimumShouldMatch { spec: spec.to_string(), message: message.to_string() }
}
