//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `stayhub_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

fn main() {
    println!("stayhub_core ping={}", stayhub_core::ping());
    println!("stayhub_core version={}", stayhub_core::core_version());
}
