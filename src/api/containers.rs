//! Container listing endpoint (feeds the log viewer dropdown).

use std::sync::Arc;

use axum::extract::Query;
use axum::response::Json;
use axum::Extension;
use serde::Deserialize;

use corelink_docker::{ContainerInfo, DockerService};

use crate::server::AppConfig;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    /// Name substring filter. Omitted means the configured node pattern;
    /// explicitly empty means all containers.
    pub filter: Option<String>,
}

/// List Docker containers, filtered by name substring.
pub async fn list_containers(
    Extension(config): Extension<Arc<AppConfig>>,
    Extension(docker): Extension<Arc<DockerService>>,
    Query(params): Query<ListParams>,
) -> Json<Vec<ContainerInfo>> {
    let filter = effective_filter(params.filter, &config.docker.container_pattern);
    Json(docker.list_containers(&filter).await)
}

fn effective_filter(param: Option<String>, pattern: &str) -> String {
    param.unwrap_or_else(|| pattern.to_string())
}
