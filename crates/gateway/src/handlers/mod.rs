//! HTTP handlers, one module per resource.

pub mod admin_handler;
pub mod announcement_handler;
pub mod class_handler;
pub mod comment_handler;
pub mod feedback_handler;
pub mod health_handler;
pub mod me_handler;
pub mod results_handler;
pub mod roster_handler;
pub mod survey_handler;
pub mod template_handler;

pub use admin_handler::admin_routes;
pub use announcement_handler::announcement_routes;
pub use class_handler::class_routes;
pub use comment_handler::comment_routes;
pub use feedback_handler::feedback_routes;
pub use health_handler::health_routes;
pub use me_handler::me_routes;
pub use results_handler::results_routes;
pub use roster_handler::roster_routes;
pub use survey_handler::survey_routes;
pub use template_handler::template_routes;
