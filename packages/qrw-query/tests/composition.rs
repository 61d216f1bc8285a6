use qrw_query::{
	BooleanQuery, BoostQuery, ComposedQuery, FilterQuery, MinimumShouldMatch, Occur, Polarity,
	Query,
};

fn term(value: &str) -> Query {
	Query::term("title", value)
}

#[test]
fn single_required_clause_collapses_without_rewrites() {
	let main = Query::Boolean(BooleanQuery::new().with(Occur::Must, term("laptop")));
	let composed = ComposedQuery::new(main).compose(None).expect("compose failed");

	assert_eq!(composed, term("laptop"));
}

#[test]
fn single_optional_clause_collapses_without_rewrites() {
	let main = Query::Boolean(BooleanQuery::new().with(Occur::Should, term("laptop")));
	let composed = ComposedQuery::new(main).compose(None).expect("compose failed");

	assert_eq!(composed, term("laptop"));
}

#[test]
fn multi_clause_main_is_kept_without_rewrites() {
	let main = Query::Boolean(
		BooleanQuery::new().with(Occur::Should, term("a")).with(Occur::Should, term("b")),
	);
	let composed = ComposedQuery::new(main.clone()).compose(None).expect("compose failed");

	assert_eq!(composed, main);
}

#[test]
fn main_is_required_and_boosts_are_optional() {
	let mut composed = ComposedQuery::new(term("laptop"));

	composed.boosts.push(BoostQuery { query: Query::term("brand", "acme"), weight: 2.5 });

	let query = composed.compose(None).expect("compose failed");
	let Query::Boolean(bq) = query else {
		panic!("Expected a boolean query.");
	};

	assert_eq!(bq.clauses.len(), 2);
	assert_eq!(bq.clauses[0].occur, Occur::Must);
	assert_eq!(bq.clauses[0].query, term("laptop"));
	assert_eq!(bq.clauses[1].occur, Occur::Should);
	assert_eq!(bq.clauses[1].query, Query::boosted(Query::term("brand", "acme"), 2.5));
	assert_eq!(bq.minimum_should_match, 0);
}

#[test]
fn exclusion_only_filter_is_flattened_to_top_level_exclusions() {
	let filter = BooleanQuery::new()
		.with(Occur::MustNot, Query::term("color", "red"))
		.with(Occur::MustNot, Query::term("color", "blue"));
	let mut composed = ComposedQuery::new(term("shirt"));

	composed
		.filters
		.push(FilterQuery { query: Query::Boolean(filter), polarity: Polarity::Include });

	let query = composed.compose(None).expect("compose failed");
	let expected = BooleanQuery::new()
		.with(Occur::Must, term("shirt"))
		.with(Occur::MustNot, Query::term("color", "red"))
		.with(Occur::MustNot, Query::term("color", "blue"));

	assert_eq!(query, Query::Boolean(expected));
}

#[test]
fn conjunctive_filter_is_flattened_into_filter_clauses() {
	let mut filter = BooleanQuery::new()
		.with(Occur::Should, Query::term("size", "m"))
		.with(Occur::MustNot, Query::term("color", "red"));

	filter.minimum_should_match = 2;

	let mut composed = ComposedQuery::new(term("shirt"));

	composed
		.filters
		.push(FilterQuery { query: Query::Boolean(filter), polarity: Polarity::Include });

	let query = composed.compose(None).expect("compose failed");
	let expected = BooleanQuery::new()
		.with(Occur::Must, term("shirt"))
		.with(Occur::Filter, Query::term("size", "m"))
		.with(Occur::MustNot, Query::term("color", "red"));

	assert_eq!(query, Query::Boolean(expected));
}

#[test]
fn real_disjunction_filter_is_added_whole() {
	let filter = BooleanQuery::new()
		.with(Occur::Should, Query::term("size", "m"))
		.with(Occur::Should, Query::term("size", "l"));
	let mut composed = ComposedQuery::new(term("shirt"));

	composed
		.filters
		.push(FilterQuery { query: Query::Boolean(filter.clone()), polarity: Polarity::Include });

	let query = composed.compose(None).expect("compose failed");
	let expected = BooleanQuery::new()
		.with(Occur::Must, term("shirt"))
		.with(Occur::Filter, Query::Boolean(filter));

	assert_eq!(query, Query::Boolean(expected));
}

#[test]
fn excluded_filters_become_exclusion_clauses() {
	let mut composed = ComposedQuery::new(term("shirt"));

	composed
		.filters
		.push(FilterQuery { query: Query::term("brand", "knockoff"), polarity: Polarity::Exclude });
	composed
		.filters
		.push(FilterQuery { query: Query::term("in_stock", "true"), polarity: Polarity::Include });

	let query = composed.compose(None).expect("compose failed");
	let expected = BooleanQuery::new()
		.with(Occur::Must, term("shirt"))
		.with(Occur::MustNot, Query::term("brand", "knockoff"))
		.with(Occur::Filter, Query::term("in_stock", "true"));

	assert_eq!(query, Query::Boolean(expected));
}

#[test]
fn minimum_should_match_counts_rewritten_main_clauses_only() {
	let main = BooleanQuery::new()
		.with(Occur::Should, term("a"))
		.with(Occur::Should, term("b"))
		.with(Occur::Should, term("c"))
		.with(Occur::Should, term("d"));
	let spec: MinimumShouldMatch = "75%".parse().expect("Failed to parse spec.");
	let mut composed = ComposedQuery::new(Query::Boolean(main));

	composed.boosts.push(BoostQuery { query: term("x"), weight: 1.0 });
	composed.boosts.push(BoostQuery { query: term("y"), weight: 1.0 });

	let query = composed.compose(Some(&spec)).expect("compose failed");
	let Query::Boolean(outer) = query else {
		panic!("Expected a boolean query.");
	};
	let Some(Query::Boolean(inner)) = outer.clauses.first().map(|clause| clause.query.clone())
	else {
		panic!("Expected the main query as first clause.");
	};

	assert_eq!(outer.minimum_should_match, 0);
	assert_eq!(inner.minimum_should_match, 3);
}
