//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `coachdesk_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

fn main() {
    // Why: keep a tiny CLI probe to validate core crate wiring independently
    // from any host application runtime setup.
    println!("coachdesk_core ping={}", coachdesk_core::ping());
    println!("coachdesk_core version={}", coachdesk_core::core_version());
}
