//! roofclaim web server and UI.
//!
//! This crate provides the Leptos-based web interface for roofclaim. The
//! server renders the shell and hands the browser its backend settings; all
//! authentication and data access happen in the browser against the hosted
//! backend.

#![allow(non_snake_case)]

pub mod app;
pub mod auth;
#[cfg(feature = "ssr")]
pub mod config;
pub mod error;
pub mod pages;
pub mod types;

#[cfg(feature = "hydrate")]
#[wasm_bindgen::prelude::wasm_bindgen]
pub fn hydrate() {
    use crate::app::App;
    console_error_panic_hook::set_once();
    leptos::mount::hydrate_body(App);
}
