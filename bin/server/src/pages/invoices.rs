//! Invoice list, creation and payment status updates.

use crate::auth::use_auth;
use crate::error::RecordError;
use crate::pages::records::load_as;
use crate::types::{ContactOption, Invoice, JobOption, PaymentStatus};
use chrono::{NaiveDate, Utc};
use leptos::prelude::*;
use leptos::task::spawn_local;
use roofclaim_core::{InvoiceId, table};
use roofclaim_platform_access::{DataService, Direction, Filter, QueryCache, Row};
use serde_json::{Value, json};

const INVOICE_COLUMNS: &str = "*, contacts(full_name), jobs(job_type)";
const REQUIRED_FIELDS: &str = "Please fill in all required fields";

/// Unsaved invoice form.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InvoiceDraft {
    pub contact_id: String,
    pub job_id: String,
    pub amount_due: String,
    /// `YYYY-MM-DD`, or blank.
    pub payment_due_date: String,
}

impl InvoiceDraft {
    /// Validates the form and builds the row to insert.
    ///
    /// New invoices start unpaid, dated `today`, without late fees.
    pub fn to_row(&self, today: NaiveDate) -> Result<Row, RecordError> {
        let contact_id = required("contact_id", &self.contact_id)?;
        let job_id = required("job_id", &self.job_id)?;
        let amount = required("amount_due", &self.amount_due)?;
        let amount_due: f64 = amount
            .parse()
            .ok()
            .filter(|value: &f64| value.is_finite() && *value >= 0.0)
            .ok_or_else(|| RecordError::Invalid {
                field: "amount_due",
                reason: "Amount due must be a positive number".to_string(),
            })?;

        let due = self.payment_due_date.trim();
        let payment_due_date = if due.is_empty() {
            Value::Null
        } else {
            let date = NaiveDate::parse_from_str(due, "%Y-%m-%d").map_err(|_| {
                RecordError::Invalid {
                    field: "payment_due_date",
                    reason: "Payment due date must be a valid date".to_string(),
                }
            })?;
            Value::String(date.to_string())
        };

        let mut row = Row::new();
        row.insert("contact_id".to_string(), json!(contact_id));
        row.insert("job_id".to_string(), json!(job_id));
        row.insert("amount_due".to_string(), json!(amount_due));
        row.insert(
            "payment_status".to_string(),
            json!(PaymentStatus::default().as_str()),
        );
        row.insert("invoice_date".to_string(), json!(today.to_string()));
        row.insert("payment_due_date".to_string(), payment_due_date);
        row.insert("late_payment_fees".to_string(), json!(0));
        Ok(row)
    }
}

fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str, RecordError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(RecordError::Invalid {
            field,
            reason: REQUIRED_FIELDS.to_string(),
        });
    }
    Ok(value)
}

/// Invoices whose contact name or job type contains `term`, ignoring case.
pub fn filter_invoices(invoices: &[Invoice], term: &str) -> Vec<Invoice> {
    let term = term.trim().to_lowercase();
    invoices
        .iter()
        .filter(|invoice| {
            term.is_empty()
                || invoice.contact_name().to_lowercase().contains(&term)
                || invoice.job_type().to_lowercase().contains(&term)
        })
        .cloned()
        .collect()
}

/// Invoices with their contact and job, newest first.
pub async fn load_invoices(
    cache: &QueryCache,
    data: &dyn DataService,
) -> Result<Vec<Invoice>, RecordError> {
    let filter = Filter::new()
        .select(INVOICE_COLUMNS)
        .order_by("invoice_date", Direction::Descending);
    load_as(cache, data, table::INVOICES, &filter).await
}

async fn load_options(
    cache: &QueryCache,
    data: &dyn DataService,
) -> Result<(Vec<ContactOption>, Vec<JobOption>), RecordError> {
    let contacts = load_as(
        cache,
        data,
        table::CONTACTS,
        &Filter::new().select("id, full_name"),
    )
    .await?;
    let jobs = load_as(
        cache,
        data,
        table::JOBS,
        &Filter::new().select("id, job_type, contact_id"),
    )
    .await?;
    Ok((contacts, jobs))
}

/// Validates and stores a new invoice.
pub async fn create_invoice(
    data: &dyn DataService,
    draft: &InvoiceDraft,
    today: NaiveDate,
) -> Result<(), RecordError> {
    let row = draft.to_row(today)?;
    data.insert(table::INVOICES, vec![row])
        .await
        .map_err(|e| RecordError::data(table::INVOICES, e))?;
    tracing::info!(
        contact_id = %draft.contact_id,
        job_id = %draft.job_id,
        "Created invoice"
    );
    Ok(())
}

/// Changes the payment status of one invoice.
pub async fn set_payment_status(
    data: &dyn DataService,
    id: &InvoiceId,
    status: PaymentStatus,
) -> Result<(), RecordError> {
    let mut patch = Row::new();
    patch.insert("payment_status".to_string(), json!(status.as_str()));
    let updated = data
        .write(table::INVOICES, &Filter::new().eq("id", id.as_str()), patch)
        .await
        .map_err(|e| RecordError::data(table::INVOICES, e))?;
    if updated.is_empty() {
        return Err(RecordError::Data {
            table: table::INVOICES.to_string(),
            details: format!("invoice '{}' not found", id),
        });
    }
    tracing::info!(invoice_id = %id, status = %status, "Updated invoice status");
    Ok(())
}

/// Invoices page.
#[component]
pub fn InvoicesPage() -> impl IntoView {
    let auth = use_auth();
    let (search, set_search) = signal(String::new());
    let (draft, set_draft) = signal(InvoiceDraft::default());
    let (creating, set_creating) = signal(false);

    let invoices = LocalResource::new(move || {
        let context = auth.watch_context();
        async move {
            let context = context.ok_or(RecordError::NotConnected)?;
            load_invoices(context.cache(), context.data().as_ref()).await
        }
    });
    let options = LocalResource::new(move || {
        let context = auth.watch_context();
        async move {
            let context = context.ok_or(RecordError::NotConnected)?;
            load_options(context.cache(), context.data().as_ref()).await
        }
    });

    let on_create = move |_| {
        let Some(context) = auth.context() else {
            return;
        };
        let current = draft.get_untracked();
        set_creating.set(true);
        spawn_local(async move {
            let today = Utc::now().date_naive();
            match create_invoice(context.data().as_ref(), &current, today).await {
                Ok(()) => {
                    context.cache().invalidate_user();
                    context.notifier().success("Invoice created successfully");
                    set_draft.set(InvoiceDraft::default());
                }
                Err(RecordError::Invalid { reason, .. }) => context.notifier().error(reason),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to create invoice");
                    context.notifier().error("Failed to create invoice");
                }
            }
            set_creating.set(false);
        });
    };

    let update_status = move |id: InvoiceId, status: PaymentStatus| {
        let Some(context) = auth.context() else {
            return;
        };
        spawn_local(async move {
            match set_payment_status(context.data().as_ref(), &id, status).await {
                Ok(()) => {
                    context.cache().invalidate_user();
                    context.notifier().success("Invoice status updated successfully");
                }
                Err(e) => {
                    tracing::error!(error = %e, invoice_id = %id, "Failed to update invoice status");
                    context.notifier().error("Failed to update invoice status");
                }
            }
        });
    };

    view! {
        <div class="invoices-page">
            <h1>"Invoices"</h1>
            <input
                type="search"
                class="search"
                placeholder="Search invoices..."
                prop:value=move || search.get()
                on:input=move |ev| set_search.set(event_target_value(&ev))
            />

            <section class="create-invoice">
                <h2>"Create New Invoice"</h2>
                <Suspense fallback=move || view! { <p>"Loading..."</p> }>
                    {move || options.get().map(|result| match result {
                        Ok((contacts, jobs)) => view! {
                            <div class="create-form">
                                <select
                                    prop:value=move || draft.get().contact_id
                                    on:change=move |ev| {
                                        let value = event_target_value(&ev);
                                        set_draft.update(|d| d.contact_id = value);
                                    }
                                >
                                    <option value="">"Select a contact"</option>
                                    {contacts.into_iter().map(|c| view! {
                                        <option value=c.id.to_string()>{c.full_name.unwrap_or_default()}</option>
                                    }).collect_view()}
                                </select>
                                <select
                                    prop:value=move || draft.get().job_id
                                    on:change=move |ev| {
                                        let value = event_target_value(&ev);
                                        set_draft.update(|d| d.job_id = value);
                                    }
                                >
                                    <option value="">"Select a job"</option>
                                    {jobs.into_iter().map(|j| view! {
                                        <option value=j.id.to_string()>{j.job_type.unwrap_or_default()}</option>
                                    }).collect_view()}
                                </select>
                                <input
                                    type="number"
                                    placeholder="Amount Due"
                                    prop:value=move || draft.get().amount_due
                                    on:input=move |ev| {
                                        let value = event_target_value(&ev);
                                        set_draft.update(|d| d.amount_due = value);
                                    }
                                />
                                <input
                                    type="date"
                                    placeholder="Payment Due Date"
                                    prop:value=move || draft.get().payment_due_date
                                    on:input=move |ev| {
                                        let value = event_target_value(&ev);
                                        set_draft.update(|d| d.payment_due_date = value);
                                    }
                                />
                                <button on:click=on_create disabled=move || creating.get()>
                                    {move || if creating.get() { "Creating..." } else { "Create Invoice" }}
                                </button>
                            </div>
                        }.into_any(),
                        Err(e) => {
                            tracing::warn!(error = %e, "Failed to load invoice form options");
                            view! { <p class="error">{e.user_message()}</p> }.into_any()
                        }
                    })}
                </Suspense>
            </section>

            <section class="invoice-list">
                <h2>"Invoice List"</h2>
                <Suspense fallback=move || view! { <p>"Loading invoices..."</p> }>
                    {move || invoices.get().map(|result| match result {
                        Ok(items) => {
                            let visible = filter_invoices(&items, &search.get());
                            if visible.is_empty() {
                                return view! { <p class="empty-state">"No invoices found."</p> }.into_any();
                            }
                            view! {
                                <ul class="invoices">
                                    {visible.into_iter().map(|invoice| {
                                        let id = invoice.id.clone();
                                        let current = invoice.status();
                                        let amount = invoice
                                            .amount_due
                                            .map(|a| format!("${:.2}", a))
                                            .unwrap_or_default();
                                        view! {
                                            <li class="invoice">
                                                <div>
                                                    <p class="contact-name">{invoice.contact_name().to_string()}</p>
                                                    <p>"Job: "{invoice.job_type().to_string()}</p>
                                                    <p>"Amount: "{amount}</p>
                                                    <p>"Status: "{invoice.payment_status.clone().unwrap_or_default()}</p>
                                                </div>
                                                <select on:change=move |ev| {
                                                    if let Ok(status) = event_target_value(&ev).parse::<PaymentStatus>() {
                                                        update_status(id.clone(), status);
                                                    }
                                                }>
                                                    {PaymentStatus::ALL.into_iter().map(|status| view! {
                                                        <option value=status.as_str() selected={current == Some(status)}>
                                                            {status.as_str()}
                                                        </option>
                                                    }).collect_view()}
                                                </select>
                                            </li>
                                        }
                                    }).collect_view()}
                                </ul>
                            }.into_any()
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "Failed to load invoices");
                            view! { <p class="error">{e.user_message()}</p> }.into_any()
                        }
                    })}
                </Suspense>
            </section>
        </div>
    }
}
