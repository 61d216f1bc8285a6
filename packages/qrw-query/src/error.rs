pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum Error {
	#[error("Invalid minimum_should_match {spec:?}: {message}")]
	InvalidMinimumShouldMatch { spec: String, message: String },
	#[error("Boost weight must be a finite number greater than zero, got {weight}.")]
	InvalidBoost { weight: f32 },
}
