//! Page components for the application.
//!
//! Each page is a Leptos component rendering one route. Protected pages are
//! only mounted once the route guard admits the user, which happens in the
//! browser; they read and write through the auth context's data service.

pub mod dashboard;
pub mod invoices;
pub mod login;
pub mod project_manager;
pub mod public;
pub mod records;

pub use dashboard::DashboardPage;
pub use invoices::InvoicesPage;
pub use login::LoginPage;
pub use project_manager::ProjectManagerPage;
pub use public::{ForgotPasswordPage, SignUpPage, UnauthorizedPage};
pub use records::RecordsPage;

#[cfg(test)]
pub(crate) mod test_support;
