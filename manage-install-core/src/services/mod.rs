//! 业务逻辑服务层

mod activity_result_bridge;
mod flow_coordinator;
mod install_service;
mod result_channel;
mod store_service;

pub use activity_result_bridge::ActivityResultBridge;
pub use flow_coordinator::FlowCoordinator;
pub use install_service::{InstallService, InstallServiceOptions};
pub use result_channel::ResultChannel;
pub use store_service::StoreService;
