//! REST API id resolution for the stage gate service

use std::collections::HashSet;

use log::{debug, info, warn};

use crate::error::{StageGateError, StageGateResult};
use crate::types::ApiDescriptor;

impl super::service::StageGateService {
    /// Resolve a REST API name to its id by walking the registry listing.
    ///
    /// Stops at the first match, when the cursor runs out, or after
    /// `registry_max_pages` pages. No match is an error.
    pub(crate) async fn resolve_api_id(&self, api_name: &str) -> StageGateResult<String> {
        let page_size = self.config.registry_page_size;
        let mut position: Option<String> = None;
        let mut seen_positions = HashSet::new();

        for page_number in 1..=self.config.registry_max_pages {
            let page = self
                .backends
                .registry
                .list_apis(page_size, position.clone())
                .await
                .map_err(|e| StageGateError::upstream("list REST APIs", e))?;

            debug!(
                "Registry page {page_number}: {} REST APIs, more: {}",
                page.items.len(),
                page.position.is_some()
            );

            if let Some(id) = find_api_id(&page.items, api_name) {
                info!("Resolved REST API '{api_name}' to id {id}");
                return Ok(id.to_string());
            }

            match page.position {
                Some(next) if seen_positions.insert(next.clone()) => position = Some(next),
                Some(next) => {
                    warn!("Registry returned position {next} twice; stopping scan");
                    break;
                }
                None => break,
            }
        }

        Err(StageGateError::data_shape(format!(
            "No REST API named '{api_name}' was found"
        )))
    }
}

/// First descriptor in listing order whose name equals `name`.
///
/// Descriptors missing a name or an id never match.
pub fn find_api_id<'a>(items: &'a [ApiDescriptor], name: &str) -> Option<&'a str> {
    items.iter().find_map(|api| match (&api.name, &api.id) {
        (Some(api_name), Some(id)) if api_name == name && !id.is_empty() => Some(id.as_str()),
        _ => None,
    })
}
