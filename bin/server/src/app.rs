//! Main Leptos application component and routing.

use crate::auth::{Auth, Toast, use_auth};
use crate::pages::{
    DashboardPage, ForgotPasswordPage, InvoicesPage, LoginPage, ProjectManagerPage,
    RecordsPage, SignUpPage, UnauthorizedPage, records,
};
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_meta::{Title, provide_meta_context};
use leptos_router::{
    components::{Redirect, Route, Router, Routes},
    path,
};
use roofclaim_platform_access::routes::{HOME_PATH, SIGN_IN_PATH, navigable_for, permission_for};
use roofclaim_platform_access::{GuardDecision, RouteGuard};

/// The main application component.
#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();
    Auth::provide();

    view! {
        <Title text="roofClaim"/>
        <Router>
            <Connect/>
            <Header/>
            <Toasts/>
            <main class="container">
                <Routes fallback=|| "Page not found.".into_view()>
                    <Route path=path!("/") view=|| view! {
                        <Guarded path=HOME_PATH><DashboardPage/></Guarded>
                    }/>
                    <Route path=path!("/inspection-scheduling") view=|| view! {
                        <Guarded path="/inspection-scheduling">
                            <RecordsPage records=&records::INSPECTION_SCHEDULING/>
                        </Guarded>
                    }/>
                    <Route path=path!("/inspection-report") view=|| view! {
                        <Guarded path="/inspection-report">
                            <RecordsPage records=&records::INSPECTION_REPORT/>
                        </Guarded>
                    }/>
                    <Route path=path!("/installation-tracking") view=|| view! {
                        <Guarded path="/installation-tracking">
                            <RecordsPage records=&records::INSTALLATIONS/>
                        </Guarded>
                    }/>
                    <Route path=path!("/find-leads") view=|| view! {
                        <Guarded path="/find-leads">
                            <RecordsPage records=&records::LEADS/>
                        </Guarded>
                    }/>
                    <Route path=path!("/contacts") view=|| view! {
                        <Guarded path="/contacts">
                            <RecordsPage records=&records::CONTACTS/>
                        </Guarded>
                    }/>
                    <Route path=path!("/supplement-tracking") view=|| view! {
                        <Guarded path="/supplement-tracking">
                            <RecordsPage records=&records::SUPPLEMENTS/>
                        </Guarded>
                    }/>
                    <Route path=path!("/tasks") view=|| view! {
                        <Guarded path="/tasks">
                            <RecordsPage records=&records::TASKS/>
                        </Guarded>
                    }/>
                    <Route path=path!("/insurance-mortgage-tracker") view=|| view! {
                        <Guarded path="/insurance-mortgage-tracker">
                            <RecordsPage records=&records::INSURANCE_MORTGAGE/>
                        </Guarded>
                    }/>
                    <Route path=path!("/invoices") view=|| view! {
                        <Guarded path="/invoices"><InvoicesPage/></Guarded>
                    }/>
                    <Route path=path!("/project-manager") view=|| view! {
                        <Guarded path="/project-manager"><ProjectManagerPage/></Guarded>
                    }/>
                    <Route path=path!("/login") view=LoginPage/>
                    <Route path=path!("/signup") view=SignUpPage/>
                    <Route path=path!("/forgot-password") view=ForgotPasswordPage/>
                    <Route path=path!("/unauthorized") view=UnauthorizedPage/>
                </Routes>
            </main>
        </Router>
    }
}

/// Starts the auth context once the app is running in the browser.
#[component]
fn Connect() -> impl IntoView {
    #[cfg(feature = "hydrate")]
    {
        let auth = use_auth();
        let navigate = leptos_router::hooks::use_navigate();
        Effect::new(move || {
            let navigate = navigate.clone();
            crate::auth::connect(auth, move |path| navigate(path, Default::default()));
        });
    }
}

/// Renders `children` only when the route table admits the current user.
///
/// Unknown and public paths are not guarded.
#[component]
fn Guarded(path: &'static str, children: ChildrenFn) -> impl IntoView {
    let auth = use_auth();
    let guard = permission_for(path).and_then(RouteGuard::for_route);
    let decision = Memo::new(move |_| match &guard {
        Some(guard) => auth.decision(guard.allowed()),
        None => GuardDecision::Allowed(auth.role().unwrap_or_default()),
    });

    move || match decision.get() {
        GuardDecision::Allowed(_) => children().into_any(),
        GuardDecision::Pending => view! { <p class="loading">"Loading..."</p> }.into_any(),
        denied => {
            let target = denied.redirect().unwrap_or(SIGN_IN_PATH);
            tracing::debug!(path, target, "Route guard redirect");
            view! { <Redirect path=target/> }.into_any()
        }
    }
}

/// Header with navigation for the signed-in role.
#[component]
fn Header() -> impl IntoView {
    let auth = use_auth();

    let on_logout = move |_| {
        let Some(context) = auth.context() else {
            return;
        };
        spawn_local(async move {
            // Failures reach the user as a notice.
            if let Err(report) = context.logout().await {
                tracing::debug!(error = %report, "Logout not confirmed");
            }
        });
    };

    view! {
        <header class="header">
            <div class="header-left">
                <a href="/" class="logo">"roofClaim"</a>
            </div>
            {move || auth.role().map(|role| view! {
                <nav class="nav-links">
                    {navigable_for(role)
                        .map(|entry| view! { <a href=entry.path>{entry.label}</a> })
                        .collect_view()}
                </nav>
            })}
            <div class="header-right">
                {move || {
                    let state = auth.state();
                    match state.session() {
                        Some(session) if !state.is_loading() => {
                            let name = session.email().unwrap_or("Signed in").to_string();
                            view! {
                                <span class="user-name">{name}</span>
                                <button class="logout-button" on:click=on_logout>"Log out"</button>
                            }.into_any()
                        }
                        _ => view! {
                            <a href=SIGN_IN_PATH class="login-button">"Log in"</a>
                        }.into_any(),
                    }
                }}
            </div>
        </header>
    }
}

/// Success and error notices.
#[component]
fn Toasts() -> impl IntoView {
    let auth = use_auth();

    view! {
        <div class="toasts">
            <For
                each=move || auth.toasts()
                key=|toast| toast.id
                children=move |toast: Toast| {
                    let id = toast.id;
                    let class = if toast.notice.is_error() { "toast toast-error" } else { "toast toast-success" };
                    view! {
                        <div class=class>
                            <span>{toast.notice.message().to_string()}</span>
                            <button class="toast-close" on:click=move |_| auth.dismiss(id)>"x"</button>
                        </div>
                    }
                }
            />
        </div>
    }
}
