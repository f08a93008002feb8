pub mod create;
pub mod farmers;
pub mod health;
pub mod pest_report;

pub use create::{create_alert_handler, create_report_handler, create_scheme_handler};
pub use farmers::{get_farmer_handler, list_farmers_handler};
pub use health::health_handler;
pub use pest_report::pest_report_handler;
