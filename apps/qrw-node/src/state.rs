use std::sync::Arc;

use qrw_service::RewriteService;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<RewriteService>,
}
impl AppState {
	pub async fn new(config: &qrw_config::Config) -> color_eyre::Result<Self> {
		let service = RewriteService::from_config(config).await?;

		Ok(Self::from_service(service))
	}

	pub fn from_service(service: RewriteService) -> Self {
		Self { service: Arc::new(service) }
	}
}
