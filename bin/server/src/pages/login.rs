//! Login page component.

use crate::auth::use_auth;
use crate::error::RecordError;
use leptos::ev::SubmitEvent;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::hooks::use_navigate;
use roofclaim_platform_access::AuthError;
use roofclaim_platform_access::routes::HOME_PATH;

/// Inline message for a failed login.
pub fn login_message(err: &AuthError) -> String {
    match err {
        AuthError::InvalidCredentials => "Invalid login credentials".to_string(),
        _ => "Login failed. Please try again.".to_string(),
    }
}

/// Email and password login. Leaves for the dashboard once a session exists.
#[component]
pub fn LoginPage() -> impl IntoView {
    let auth = use_auth();
    let navigate = use_navigate();
    let (email, set_email) = signal(String::new());
    let (password, set_password) = signal(String::new());
    let (error, set_error) = signal(Option::<String>::None);
    let (submitting, set_submitting) = signal(false);

    Effect::new(move || {
        if auth.is_authenticated() {
            navigate(HOME_PATH, Default::default());
        }
    });

    let on_submit = move |ev: SubmitEvent| {
        ev.prevent_default();
        set_error.set(None);
        let Some(context) = auth.context() else {
            set_error.set(Some(RecordError::NotConnected.user_message()));
            return;
        };
        let email = email.get_untracked();
        let password = password.get_untracked();
        set_submitting.set(true);
        spawn_local(async move {
            if let Err(report) = context.login(&email, &password).await {
                set_error.set(Some(login_message(report.current_context())));
            }
            set_submitting.set(false);
        });
    };

    view! {
        <div class="login-page">
            <div class="login-box">
                <h1>"roofClaim Login"</h1>
                {move || error.get().map(|message| view! {
                    <div class="alert alert-error">
                        <strong>"Error"</strong>
                        <p>{message}</p>
                    </div>
                })}
                <form on:submit=on_submit>
                    <label for="email">"Email"</label>
                    <input
                        id="email"
                        type="email"
                        required
                        prop:value=move || email.get()
                        on:input=move |ev| set_email.set(event_target_value(&ev))
                    />
                    <label for="password">"Password"</label>
                    <input
                        id="password"
                        type="password"
                        required
                        prop:value=move || password.get()
                        on:input=move |ev| set_password.set(event_target_value(&ev))
                    />
                    <button type="submit" class="login-button" disabled=move || submitting.get()>
                        {move || if submitting.get() { "Logging in..." } else { "Login" }}
                    </button>
                </form>
                <div class="login-links">
                    <a href="/forgot-password">"Forgot Password?"</a>
                    <a href="/signup">"Need to register? Sign up"</a>
                </div>
            </div>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_credentials_are_named() {
        assert_eq!(
            login_message(&AuthError::InvalidCredentials),
            "Invalid login credentials"
        );
    }

    #[test]
    fn other_failures_hide_details() {
        let message = login_message(&AuthError::LoginFailed {
            reason: "provider answered 502".to_string(),
        });
        assert!(!message.contains("502"));
    }
}
