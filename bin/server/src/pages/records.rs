//! List pages for the operational tables.
//!
//! Each page reads one table through the data service, caches the rows under
//! the signed-in user's scope, and filters them client-side.

use crate::auth::use_auth;
use crate::error::RecordError;
use leptos::prelude::*;
use roofclaim_core::table;
use roofclaim_platform_access::{DataService, Direction, Filter, QueryCache, QueryKey, Row};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// A displayed column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub key: &'static str,
    pub label: &'static str,
}

const fn column(key: &'static str, label: &'static str) -> Column {
    Column { key, label }
}

/// What a record page lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordView {
    pub title: &'static str,
    pub table: &'static str,
    pub columns: &'static [Column],
    /// Newest first by this column, when set.
    pub newest_first: Option<&'static str>,
}

impl RecordView {
    fn filter(&self) -> Filter {
        let filter = Filter::new();
        match self.newest_first {
            Some(column) => filter.order_by(column, Direction::Descending),
            None => filter,
        }
    }
}

pub const INSPECTION_SCHEDULING: RecordView = RecordView {
    title: "Inspection Scheduling",
    table: table::INSPECTIONS,
    columns: &[
        column("address", "Address"),
        column("inspection_date", "Date"),
        column("inspector", "Inspector"),
        column("status", "Status"),
    ],
    newest_first: Some("inspection_date"),
};

pub const INSPECTION_REPORT: RecordView = RecordView {
    title: "Inspection Report",
    table: table::INSPECTIONS,
    columns: &[
        column("address", "Address"),
        column("inspection_date", "Date"),
        column("damage_type", "Damage"),
        column("findings", "Findings"),
    ],
    newest_first: Some("inspection_date"),
};

pub const INSTALLATIONS: RecordView = RecordView {
    title: "Installation Tracking",
    table: table::INSTALLATIONS,
    columns: &[
        column("address", "Address"),
        column("installation_date", "Date"),
        column("crew", "Crew"),
        column("status", "Status"),
    ],
    newest_first: Some("installation_date"),
};

pub const LEADS: RecordView = RecordView {
    title: "Find Leads",
    table: table::LEADS,
    columns: &[
        column("full_name", "Name"),
        column("address", "Address"),
        column("phone", "Phone"),
        column("source", "Source"),
    ],
    newest_first: None,
};

pub const CONTACTS: RecordView = RecordView {
    title: "Contacts",
    table: table::CONTACTS,
    columns: &[
        column("full_name", "Name"),
        column("email", "Email"),
        column("phone", "Phone"),
        column("address", "Address"),
    ],
    newest_first: None,
};

pub const SUPPLEMENTS: RecordView = RecordView {
    title: "Supplement Tracking",
    table: table::SUPPLEMENTS,
    columns: &[
        column("claim_number", "Claim"),
        column("insurance_company", "Insurer"),
        column("amount", "Amount"),
        column("status", "Status"),
    ],
    newest_first: None,
};

pub const TASKS: RecordView = RecordView {
    title: "Tasks",
    table: table::TASKS,
    columns: &[
        column("title", "Task"),
        column("assigned_to", "Assigned To"),
        column("due_date", "Due"),
        column("status", "Status"),
    ],
    newest_first: Some("due_date"),
};

pub const INSURANCE_MORTGAGE: RecordView = RecordView {
    title: "Insurance & Mortgage Tracker",
    table: table::INSURANCE_MORTGAGE,
    columns: &[
        column("policy_number", "Policy"),
        column("insurance_company", "Insurer"),
        column("mortgage_company", "Mortgage Company"),
        column("status", "Status"),
    ],
    newest_first: None,
};

/// Reads `table`, serving repeated reads from the user-scoped cache.
pub async fn load_rows(
    cache: &QueryCache,
    data: &dyn DataService,
    table: &str,
    filter: &Filter,
) -> Result<Vec<Row>, RecordError> {
    let key = QueryKey::user(std::iter::once(table.to_string()).chain(filter.key_parts()));
    let value = cache
        .fetch(key, || async {
            let rows = data
                .read(table, filter)
                .await
                .map_err(|e| RecordError::data(table, e))?;
            Ok::<_, RecordError>(Value::Array(rows.into_iter().map(Value::Object).collect()))
        })
        .await?;

    let Value::Array(items) = value else {
        return Err(malformed(table, "expected a list of rows"));
    };
    items
        .into_iter()
        .map(|item| match item {
            Value::Object(row) => Ok(row),
            _ => Err(malformed(table, "expected an object row")),
        })
        .collect()
}

/// Reads `table` and deserializes each row.
pub async fn load_as<T: DeserializeOwned>(
    cache: &QueryCache,
    data: &dyn DataService,
    table: &str,
    filter: &Filter,
) -> Result<Vec<T>, RecordError> {
    load_rows(cache, data, table, filter)
        .await?
        .into_iter()
        .map(|row| {
            serde_json::from_value(Value::Object(row)).map_err(|e| malformed(table, &e.to_string()))
        })
        .collect()
}

fn malformed(table: &str, details: &str) -> RecordError {
    RecordError::Malformed {
        table: table.to_string(),
        details: details.to_string(),
    }
}

/// Text shown for `key` of `row`.
pub fn cell_text(row: &Row, key: &str) -> String {
    match row.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(true)) => "Yes".to_string(),
        Some(Value::Bool(false)) => "No".to_string(),
        Some(other) => other.to_string(),
    }
}

/// Case-insensitive match of `term` against the displayed columns.
pub fn row_matches(row: &Row, columns: &[Column], term: &str) -> bool {
    let term = term.trim().to_lowercase();
    term.is_empty()
        || columns
            .iter()
            .any(|c| cell_text(row, c.key).to_lowercase().contains(&term))
}

/// Searchable list of one table.
#[component]
pub fn RecordsPage(records: &'static RecordView) -> impl IntoView {
    let auth = use_auth();
    let (search, set_search) = signal(String::new());

    let rows = LocalResource::new(move || {
        let context = auth.watch_context();
        async move {
            let context = context.ok_or(RecordError::NotConnected)?;
            load_rows(
                context.cache(),
                context.data().as_ref(),
                records.table,
                &records.filter(),
            )
            .await
        }
    });

    view! {
        <div class="records-page">
            <h1>{records.title}</h1>
            <input
                type="search"
                class="search"
                placeholder="Search..."
                prop:value=move || search.get()
                on:input=move |ev| set_search.set(event_target_value(&ev))
            />
            <Suspense fallback=move || view! { <p>"Loading..."</p> }>
                {move || {
                    rows.get().map(|result| match result {
                        Ok(rows) => {
                            let term = search.get();
                            let visible: Vec<Row> = rows
                                .into_iter()
                                .filter(|row| row_matches(row, records.columns, &term))
                                .collect();
                            if visible.is_empty() {
                                view! { <p class="empty-state">"No records found."</p> }.into_any()
                            } else {
                                view! {
                                    <table class="records-table">
                                        <thead>
                                            <tr>
                                                {records.columns.iter().map(|c| view! { <th>{c.label}</th> }).collect_view()}
                                            </tr>
                                        </thead>
                                        <tbody>
                                            {visible.into_iter().map(|row| view! {
                                                <tr>
                                                    {records.columns.iter().map(|c| view! {
                                                        <td>{cell_text(&row, c.key)}</td>
                                                    }).collect_view()}
                                                </tr>
                                            }).collect_view()}
                                        </tbody>
                                    </table>
                                }.into_any()
                            }
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, table = records.table, "Failed to load records");
                            view! { <p class="error">{e.user_message()}</p> }.into_any()
                        }
                    })
                }}
            </Suspense>
        </div>
    }
}
