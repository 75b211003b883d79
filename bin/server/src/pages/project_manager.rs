//! Project manager dashboard.

use crate::auth::use_auth;
use crate::error::RecordError;
use crate::types::ProjectStatus;
use leptos::prelude::*;
use roofclaim_core::table::RPC_PROJECT_STATUS;
use roofclaim_platform_access::{DataService, QueryCache, QueryKey, Row};
use serde_json::Value;

/// Calls the project status report, caching it for the signed-in user.
pub async fn load_project_status(
    cache: &QueryCache,
    data: &dyn DataService,
) -> Result<Vec<ProjectStatus>, RecordError> {
    let value = cache
        .fetch(QueryKey::user([RPC_PROJECT_STATUS]), || async {
            data.rpc(RPC_PROJECT_STATUS, Row::new())
                .await
                .map_err(|e| RecordError::Rpc {
                    function: RPC_PROJECT_STATUS.to_string(),
                    details: e.to_string(),
                })
        })
        .await?;
    parse_project_status(value)
}

fn parse_project_status(value: Value) -> Result<Vec<ProjectStatus>, RecordError> {
    if value.is_null() {
        return Ok(Vec::new());
    }
    serde_json::from_value(value).map_err(|e| RecordError::Malformed {
        table: RPC_PROJECT_STATUS.to_string(),
        details: e.to_string(),
    })
}

/// Share of the largest count, as a percentage for bar widths.
fn bar_width(count: i64, largest: i64) -> i64 {
    if largest <= 0 {
        0
    } else {
        (count.max(0) * 100) / largest
    }
}

/// Project status by pipeline stage.
#[component]
pub fn ProjectManagerPage() -> impl IntoView {
    let auth = use_auth();
    let statuses = LocalResource::new(move || {
        let context = auth.watch_context();
        async move {
            let context = context.ok_or(RecordError::NotConnected)?;
            load_project_status(context.cache(), context.data().as_ref()).await
        }
    });

    view! {
        <div class="project-manager-page">
            <h1>"Project Manager Dashboard"</h1>
            <section class="project-status">
                <h2>"Project Status Overview"</h2>
                <Suspense fallback=move || view! { <p>"Loading dashboard..."</p> }>
                    {move || statuses.get().map(|result| match result {
                        Ok(rows) if rows.is_empty() => {
                            view! { <p class="empty-state">"No projects yet."</p> }.into_any()
                        }
                        Ok(rows) => {
                            let largest = rows.iter().map(|r| r.project_count).max().unwrap_or(0);
                            view! {
                                <table class="status-table">
                                    <thead>
                                        <tr>
                                            <th>"Status"</th>
                                            <th>"Number of Projects"</th>
                                            <th>"Total Value"</th>
                                        </tr>
                                    </thead>
                                    <tbody>
                                        {rows.into_iter().map(|row| {
                                            let width = format!("width: {}%", bar_width(row.project_count, largest));
                                            view! {
                                                <tr>
                                                    <td>{row.status}</td>
                                                    <td>
                                                        <div class="bar" style=width></div>
                                                        <span>{row.project_count}</span>
                                                    </td>
                                                    <td>{format!("${:.2}", row.total_value.unwrap_or(0.0))}</td>
                                                </tr>
                                            }
                                        }).collect_view()}
                                    </tbody>
                                </table>
                            }.into_any()
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "Failed to load project status");
                            view! { <p class="error">{e.user_message()}</p> }.into_any()
                        }
                    })}
                </Suspense>
            </section>
        </div>
    }
}
