mod deployment_list;
mod log_viewer;

pub use deployment_list::DeploymentListScreen;
pub use log_viewer::LogViewerScreen;
