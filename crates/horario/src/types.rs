use crate::config::AppConfig;
use crate::schedule::{FeedClient, ScheduleService};

/// State shared by every request handler.
pub struct AppState {
    /// Course data and user state
    pub service: ScheduleService<FeedClient>,
    pub config: AppConfig,
}
