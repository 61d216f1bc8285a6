pub const SCHEMA_SQL: &str = include_str!("../sql/rewriter_definitions.sql");

pub fn statements() -> impl Iterator<Item = &'static str> {
	SCHEMA_SQL.split(';').map(str::trim).filter(|statement| !statement.is_empty())
}
