use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Occur {
	/// Required and scoring.
	Must,
	/// Optional and scoring.
	Should,
	/// Required and non-scoring.
	Filter,
	/// Exclusion.
	MustNot,
}
impl Occur {
	pub fn is_scoring(self) -> bool {
		matches!(self, Self::Must | Self::Should)
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Query {
	MatchAll,
	Term { field: String, value: String },
	Boosted { query: Box<Query>, boost: f32 },
	Boolean(BooleanQuery),
}
impl Query {
	pub fn term(field: impl Into<String>, value: impl Into<String>) -> Self {
		Self::Term { field: field.into(), value: value.into() }
	}

	pub fn boosted(query: Query, boost: f32) -> Self {
		Self::Boosted { query: Box::new(query), boost }
	}

	pub fn as_boolean(&self) -> Option<&BooleanQuery> {
		match self {
			Self::Boolean(bq) => Some(bq),
			_ => None,
		}
	}

	/// Visits every term in the query tree, depth first, in clause order.
	pub fn for_each_term(&self, f: &mut impl FnMut(&str, &str)) {
		match self {
			Self::MatchAll => {},
			Self::Term { field, value } => f(field, value),
			Self::Boosted { query, .. } => query.for_each_term(f),
			Self::Boolean(bq) =>
				for clause in &bq.clauses {
					clause.query.for_each_term(f);
				},
		}
	}

	pub fn for_each_term_mut(&mut self, f: &mut impl FnMut(&str, &mut String)) {
		match self {
			Self::MatchAll => {},
			Self::Term { field, value } => f(field, value),
			Self::Boosted { query, .. } => query.for_each_term_mut(f),
			Self::Boolean(bq) =>
				for clause in &mut bq.clauses {
					clause.query.for_each_term_mut(f);
				},
		}
	}

	pub fn term_values(&self) -> Vec<String> {
		let mut out = Vec::new();

		self.for_each_term(&mut |_, value| out.push(value.to_string()));

		out
	}
}
impl From<BooleanQuery> for Query {
	fn from(bq: BooleanQuery) -> Self {
		Self::Boolean(bq)
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Clause {
	pub occur: Occur,
	pub query: Query,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BooleanQuery {
	#[serde(default)]
	pub clauses: Vec<Clause>,
	/// Number of `Should` clauses that must match; zero leaves the engine default.
	#[serde(default, skip_serializing_if = "is_zero")]
	pub minimum_should_match: u32,
}
impl BooleanQuery {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with(mut self, occur: Occur, query: Query) -> Self {
		self.push(occur, query);

		self
	}

	pub fn push(&mut self, occur: Occur, query: Query) {
		self.clauses.push(Clause { occur, query });
	}

	pub fn len(&self) -> usize {
		self.clauses.len()
	}

	pub fn is_empty(&self) -> bool {
		self.clauses.is_empty()
	}

	pub fn count(&self, occur: Occur) -> usize {
		self.clauses.iter().filter(|clause| clause.occur == occur).count()
	}

	pub fn is_exclusion_only(&self) -> bool {
		!self.clauses.is_empty() && self.clauses.iter().all(|clause| clause.occur == Occur::MustNot)
	}
}

fn is_zero(value: &u32) -> bool {
	*value == 0
}
