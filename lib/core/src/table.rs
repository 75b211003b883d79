//! Names of the hosted tables and remote procedures the application uses.

/// Profile rows, one per auth user, carrying the stored role.
pub const USERS: &str = "users";
pub const CONTACTS: &str = "contacts";
pub const JOBS: &str = "jobs";
pub const INVOICES: &str = "invoices";
pub const TASKS: &str = "tasks";
pub const LEADS: &str = "leads";
pub const INSPECTIONS: &str = "inspections";
pub const INSTALLATIONS: &str = "installations";
pub const SUPPLEMENTS: &str = "supplements";
pub const INSURANCE_MORTGAGE: &str = "insurance_mortgage";

/// Aggregated project status per pipeline stage.
pub const RPC_PROJECT_STATUS: &str = "get_project_status";
