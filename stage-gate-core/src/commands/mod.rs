//! Commands module - service layer for the stage gate

mod resolve;
mod run;
pub(crate) mod service;

pub use resolve::find_api_id;
pub use service::StageGateService;
