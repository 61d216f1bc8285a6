mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Cache, Cluster, Config, Node, Peer, Postgres, Search, Service, Storage};

use std::{collections::HashSet, fs, path::Path};

use qrw_query::MinimumShouldMatch;

pub const STORAGE_BACKENDS: [&str; 2] = ["memory", "postgres"];

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	parse(&raw).map_err(|err| match err {
		Error::ParseConfig { source, .. } =>
			Error::ParseConfig { path: path.to_path_buf(), source },
		other => other,
	})
}

pub fn parse(raw: &str) -> Result<Config> {
	let mut cfg: Config = toml::from_str(raw)
		.map_err(|err| Error::ParseConfig { path: Default::default(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.node.node_id.trim().is_empty() {
		return Err(Error::Validation { message: "node.node_id must be non-empty.".to_string() });
	}
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.service.admin_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.admin_bind must be non-empty.".to_string(),
		});
	}
	if !STORAGE_BACKENDS.contains(&cfg.storage.backend.as_str()) {
		return Err(Error::Validation {
			message: "storage.backend must be one of memory or postgres.".to_string(),
		});
	}
	if cfg.storage.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "storage.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.storage.backend == "postgres" {
		let Some(postgres) = cfg.storage.postgres.as_ref() else {
			return Err(Error::Validation {
				message: "storage.postgres is required when storage.backend is postgres."
					.to_string(),
			});
		};

		if postgres.dsn.trim().is_empty() {
			return Err(Error::Validation {
				message: "storage.postgres.dsn must be non-empty.".to_string(),
			});
		}
		if postgres.pool_max_conns == 0 {
			return Err(Error::Validation {
				message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
			});
		}
	}

	if let Some(max) = cfg.cache.max_bytes
		&& max == 0
	{
		return Err(Error::Validation {
			message: "cache.max_bytes must be greater than zero.".to_string(),
		});
	}

	if cfg.cache.max_partitions == Some(0) {
		return Err(Error::Validation {
			message: "cache.max_partitions must be greater than zero.".to_string(),
		});
	}

	if cfg.cluster.request_timeout_ms == 0 {
		return Err(Error::Validation {
			message: "cluster.request_timeout_ms must be greater than zero.".to_string(),
		});
	}

	let mut seen = HashSet::new();

	for peer in &cfg.cluster.peers {
		if peer.node_id.trim().is_empty() {
			return Err(Error::Validation {
				message: "cluster.peers.node_id must be non-empty.".to_string(),
			});
		}
		if peer.node_id == cfg.node.node_id {
			return Err(Error::Validation {
				message: format!(
					"cluster.peers must not list the local node {:?}.",
					cfg.node.node_id
				),
			});
		}
		if !seen.insert(peer.node_id.as_str()) {
			return Err(Error::Validation {
				message: format!("cluster.peers contains duplicate node_id {:?}.", peer.node_id),
			});
		}
		if !(peer.base_url.starts_with("http://") || peer.base_url.starts_with("https://")) {
			return Err(Error::Validation {
				message: format!(
					"cluster.peers.base_url for {:?} must start with http:// or https://.",
					peer.node_id
				),
			});
		}
	}

	let namespace = cfg.search.param_namespace.as_str();

	if namespace.trim().is_empty() || namespace.contains('.') {
		return Err(Error::Validation {
			message: "search.param_namespace must be non-empty and must not contain '.'."
				.to_string(),
		});
	}

	if let Some(spec) = cfg.search.default_minimum_should_match.as_deref()
		&& let Err(err) = spec.parse::<MinimumShouldMatch>()
	{
		return Err(Error::Validation {
			message: format!("search.default_minimum_should_match is invalid: {err}"),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.storage.backend = cfg.storage.backend.trim().to_ascii_lowercase();

	if cfg.cache.expire_after_write_secs == Some(0) {
		cfg.cache.expire_after_write_secs = None;
	}
	if cfg.cache.expire_after_access_secs == Some(0) {
		cfg.cache.expire_after_access_secs = None;
	}
	if cfg
		.search
		.default_minimum_should_match
		.as_deref()
		.map(|spec| spec.trim().is_empty())
		.unwrap_or(false)
	{
		cfg.search.default_minimum_should_match = None;
	}

	for peer in &mut cfg.cluster.peers {
		let trimmed = peer.base_url.trim().trim_end_matches('/').to_string();

		peer.base_url = trimmed;
	}
}
