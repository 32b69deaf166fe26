//! Processed template inspection (pure Rust)

use serde_json::Value;

use crate::error::{StageGateError, StageGateResult};

/// Extract the declared name of a REST API resource from a template body.
///
/// Reads `Resources.<resource>.Properties.Name`, which must be a non-empty
/// literal string. Intrinsic functions (`Fn::Sub`, `Ref`, ...) are rejected;
/// the processed template stage leaves those unresolved.
pub fn extract_api_name(template_body: &str, resource: &str) -> StageGateResult<String> {
    let template: Value = serde_json::from_str(template_body).map_err(|e| {
        StageGateError::data_shape(format!("Processed template is not valid JSON: {e}"))
    })?;

    let path = format!("Resources.{resource}.Properties.Name");
    let name = template
        .get("Resources")
        .and_then(|resources| resources.get(resource))
        .and_then(|res| res.get("Properties"))
        .and_then(|props| props.get("Name"))
        .ok_or_else(|| StageGateError::data_shape(format!("Template has no {path}")))?;

    match name.as_str().map(str::trim) {
        Some(name) if !name.is_empty() => Ok(name.to_string()),
        Some(_) => Err(StageGateError::data_shape(format!("Template {path} is empty"))),
        None => Err(StageGateError::data_shape(format!(
            "Template {path} is not a literal string: {name}"
        ))),
    }
}
