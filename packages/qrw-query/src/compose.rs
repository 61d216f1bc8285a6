use serde::{Deserialize, Serialize};

use crate::{BooleanQuery, Error, MinimumShouldMatch, Occur, Query, Result};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoostQuery {
	pub query: Query,
	pub weight: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
	Include,
	Exclude,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilterQuery {
	pub query: Query,
	pub polarity: Polarity,
}

/// Rewriting output before it is merged into a single engine query.
#[derive(Clone, Debug, PartialEq)]
pub struct ComposedQuery {
	pub main: Query,
	pub boosts: Vec<BoostQuery>,
	pub filters: Vec<FilterQuery>,
}
impl ComposedQuery {
	pub fn new(main: Query) -> Self {
		Self { main, boosts: Vec::new(), filters: Vec::new() }
	}

	/// Merges main, boost and filter queries into one query.
	///
	/// `minimum_should_match` resolves against the `Should` clauses of the main query as it stands
	/// after rewriting. Boost clauses never take part in matching.
	pub fn compose(self, minimum_should_match: Option<&MinimumShouldMatch>) -> Result<Query> {
		let Self { mut main, boosts, filters } = self;

		for boost in &boosts {
			if !boost.weight.is_finite() || boost.weight <= 0.0 {
				return Err(Error::InvalidBoost { weight: boost.weight });
			}
		}

		if let Some(spec) = minimum_should_match
			&& let Query::Boolean(bq) = &mut main
		{
			bq.minimum_should_match = spec.resolve(bq.count(Occur::Should));
		}

		if boosts.is_empty() && filters.is_empty() {
			return Ok(collapse(main));
		}

		let mut outer = BooleanQuery::new().with(Occur::Must, main);

		for boost in boosts {
			let query = if boost.weight == 1.0 {
				boost.query
			} else {
				Query::boosted(boost.query, boost.weight)
			};

			outer.push(Occur::Should, query);
		}
		for filter in filters {
			append_filter(&mut outer, filter);
		}

		Ok(Query::Boolean(outer))
	}
}

fn collapse(main: Query) -> Query {
	match main {
		Query::Boolean(mut bq) if bq.len() == 1 && bq.clauses[0].occur.is_scoring() =>
			bq.clauses.remove(0).query,
		other => other,
	}
}

fn append_filter(outer: &mut BooleanQuery, filter: FilterQuery) {
	match (filter.polarity, filter.query) {
		(Polarity::Exclude, query) => outer.push(Occur::MustNot, query),
		(Polarity::Include, Query::Boolean(bq)) if should_flatten(&bq) =>
			for clause in bq.clauses {
				let occur =
					if clause.occur == Occur::MustNot { Occur::MustNot } else { Occur::Filter };

				outer.push(occur, clause.query);
			},
		(Polarity::Include, query) => outer.push(Occur::Filter, query),
	}
}

fn should_flatten(bq: &BooleanQuery) -> bool {
	bq.is_exclusion_only() || bq.len() < 2 || bq.minimum_should_match as usize >= bq.len()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn term(value: &str) -> Query {
		Query::term("f", value)
	}

	#[test]
	fn non_boolean_main_is_returned_as_is() {
		let composed = ComposedQuery::new(term("a")).compose(None).expect("compose failed");

		assert_eq!(composed, term("a"));
	}

	#[test]
	fn single_filter_or_exclusion_clause_is_not_collapsed() {
		let main = Query::Boolean(BooleanQuery::new().with(Occur::MustNot, term("a")));
		let composed = ComposedQuery::new(main.clone()).compose(None).expect("compose failed");

		assert_eq!(composed, main);
	}

	#[test]
	fn unit_weight_boosts_are_not_wrapped() {
		let mut composed = ComposedQuery::new(term("a"));

		composed.boosts.push(BoostQuery { query: term("b"), weight: 1.0 });
		composed.boosts.push(BoostQuery { query: term("c"), weight: 3.0 });

		let query = composed.compose(None).expect("compose failed");
		let expected = BooleanQuery::new()
			.with(Occur::Must, term("a"))
			.with(Occur::Should, term("b"))
			.with(Occur::Should, Query::boosted(term("c"), 3.0));

		assert_eq!(query, Query::Boolean(expected));
	}

	#[test]
	fn rejects_non_positive_boosts() {
		for weight in [0.0, -1.0, f32::NAN, f32::INFINITY] {
			let mut composed = ComposedQuery::new(term("a"));

			composed.boosts.push(BoostQuery { query: term("b"), weight });

			assert!(composed.compose(None).is_err(), "Weight {weight} should be rejected.");
		}
	}

	#[test]
	fn flatten_rules() {
		let disjunction =
			BooleanQuery::new().with(Occur::Should, term("a")).with(Occur::Should, term("b"));
		let mut conjunction = disjunction.clone();

		conjunction.minimum_should_match = 2;

		assert!(!should_flatten(&disjunction));
		assert!(should_flatten(&conjunction));
		assert!(should_flatten(&BooleanQuery::new().with(Occur::Should, term("a"))));
		assert!(should_flatten(&BooleanQuery::new()));
	}
}
