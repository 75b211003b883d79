//! Pages open to everyone.

use leptos::prelude::*;
use roofclaim_platform_access::routes::{HOME_PATH, SIGN_IN_PATH};

/// Shown when the signed-in role may not open a route.
#[component]
pub fn UnauthorizedPage() -> impl IntoView {
    view! {
        <div class="unauthorized-page">
            <h1>"Access Denied"</h1>
            <p>"You do not have permission to view this page."</p>
            <a href=HOME_PATH class="cta-button">"Back to dashboard"</a>
        </div>
    }
}

#[component]
pub fn SignUpPage() -> impl IntoView {
    view! {
        <div class="signup-page">
            <h1>"Sign Up"</h1>
            <p>"Accounts are created by the roofClaim office. Contact your representative to get access."</p>
            <a href=SIGN_IN_PATH>"Back to login"</a>
        </div>
    }
}

#[component]
pub fn ForgotPasswordPage() -> impl IntoView {
    view! {
        <div class="forgot-password-page">
            <h1>"Forgot Password"</h1>
            <p>"Contact the roofClaim office to have your password reset."</p>
            <a href=SIGN_IN_PATH>"Back to login"</a>
        </div>
    }
}
