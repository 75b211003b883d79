//! Role dashboards served at `/`.

use crate::auth::use_auth;
use crate::error::RecordError;
use crate::pages::project_manager::ProjectManagerPage;
use crate::pages::records::load_rows;
use leptos::prelude::*;
use leptos::task::spawn_local;
use roofclaim_core::table;
use roofclaim_platform_access::routes::{HOME_PATH, navigable_for};
use roofclaim_platform_access::{Filter, ProfileUpdate, Role};

/// `(label, table)` pairs counted on a dashboard.
type Counts = &'static [(&'static str, &'static str)];

const ADMIN_COUNTS: Counts = &[
    ("Leads", table::LEADS),
    ("Jobs", table::JOBS),
    ("Invoices", table::INVOICES),
];
const EMPLOYEE_COUNTS: Counts = &[
    ("Tasks", table::TASKS),
    ("Inspections", table::INSPECTIONS),
    ("Installations", table::INSTALLATIONS),
];
const SALES_COUNTS: Counts = &[("Leads", table::LEADS), ("Contacts", table::CONTACTS)];
const SUPPLEMENT_COUNTS: Counts = &[("Supplements", table::SUPPLEMENTS)];

/// Builds a profile update from the non-blank form fields.
pub fn profile_update(full_name: &str, phone: &str) -> ProfileUpdate {
    [("full_name", full_name), ("phone", phone)]
        .into_iter()
        .map(|(column, value)| (column, value.trim()))
        .filter(|(_, value)| !value.is_empty())
        .fold(ProfileUpdate::new(), |update, (column, value)| {
            update.set(column, value)
        })
}

/// Dashboard for the signed-in role.
#[component]
pub fn DashboardPage() -> impl IntoView {
    let auth = use_auth();

    move || match auth.role() {
        Some(Role::Admin) => view! {
            <StaffDashboard
                title="Admin Dashboard"
                role=Role::Admin
                counts=ADMIN_COUNTS
            />
        }
        .into_any(),
        Some(Role::Employee) => view! {
            <StaffDashboard
                title="Employee Dashboard"
                role=Role::Employee
                counts=EMPLOYEE_COUNTS
            />
        }
        .into_any(),
        Some(Role::Sales) => view! {
            <StaffDashboard
                title="Sales Dashboard"
                role=Role::Sales
                counts=SALES_COUNTS
            />
        }
        .into_any(),
        Some(Role::SupplementSpecialist) => view! {
            <StaffDashboard
                title="Supplement Specialist Dashboard"
                role=Role::SupplementSpecialist
                counts=SUPPLEMENT_COUNTS
            />
        }
        .into_any(),
        Some(Role::ProjectManager) => view! { <ProjectManagerPage/> }.into_any(),
        Some(Role::Customer) | None => view! { <CustomerDashboard/> }.into_any(),
    }
}

#[component]
fn StaffDashboard(
    title: &'static str,
    role: Role,
    counts: Counts,
) -> impl IntoView {
    view! {
        <div class="dashboard">
            <h1>{title}</h1>
            <section class="stats">
                {counts
                    .iter()
                    .map(|&(label, table)| view! { <RecordCount label=label table=table/> })
                    .collect_view()}
            </section>
            <QuickLinks role=role/>
        </div>
    }
}

/// Number of rows of `table` visible to the user.
#[component]
fn RecordCount(label: &'static str, table: &'static str) -> impl IntoView {
    let auth = use_auth();
    let count = LocalResource::new(move || {
        let context = auth.watch_context();
        async move {
            let context = context.ok_or(RecordError::NotConnected)?;
            let rows = load_rows(
                context.cache(),
                context.data().as_ref(),
                table,
                &Filter::new().select("id"),
            )
            .await?;
            Ok::<_, RecordError>(rows.len())
        }
    });

    view! {
        <div class="stat-card">
            <h3>{label}</h3>
            <Suspense fallback=move || view! { <p>"..."</p> }>
                {move || count.get().map(|result| match result {
                    Ok(n) => view! { <p class="stat-value">{n}</p> }.into_any(),
                    Err(e) => {
                        tracing::warn!(error = %e, table, "Failed to count records");
                        view! { <p class="error">"-"</p> }.into_any()
                    }
                })}
            </Suspense>
        </div>
    }
}

#[component]
fn QuickLinks(role: Role) -> impl IntoView {
    view! {
        <section class="quick-links">
            <h2>"Quick Links"</h2>
            <ul>
                {navigable_for(role)
                    .filter(|entry| entry.path != HOME_PATH)
                    .map(|entry| view! { <li><a href=entry.path>{entry.label}</a></li> })
                    .collect_view()}
            </ul>
        </section>
    }
}

/// Customers see their own profile.
#[component]
fn CustomerDashboard() -> impl IntoView {
    let auth = use_auth();
    let (full_name, set_full_name) = signal(String::new());
    let (phone, set_phone) = signal(String::new());
    let (saving, set_saving) = signal(false);

    let on_save = move |_| {
        let Some(context) = auth.context() else {
            return;
        };
        let update = profile_update(&full_name.get_untracked(), &phone.get_untracked());
        set_saving.set(true);
        spawn_local(async move {
            // Failures reach the user as a notice.
            if context.update_profile(update).await.is_ok() {
                set_full_name.set(String::new());
                set_phone.set(String::new());
            }
            set_saving.set(false);
        });
    };

    view! {
        <div class="dashboard customer-dashboard">
            <h1>"Welcome to roofClaim"</h1>
            <p>"Track your claim and keep your contact details up to date."</p>
            <section class="profile-form">
                <h2>"Your Profile"</h2>
                <input
                    type="text"
                    placeholder="Full name"
                    prop:value=move || full_name.get()
                    on:input=move |ev| set_full_name.set(event_target_value(&ev))
                />
                <input
                    type="tel"
                    placeholder="Phone"
                    prop:value=move || phone.get()
                    on:input=move |ev| set_phone.set(event_target_value(&ev))
                />
                <button on:click=on_save disabled=move || saving.get()>
                    {move || if saving.get() { "Saving..." } else { "Save" }}
                </button>
            </section>
        </div>
    }
}
