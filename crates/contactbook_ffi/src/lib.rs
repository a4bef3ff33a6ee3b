//! Flutter-facing bindings for ContactBook core.
//!
//! Functions in `api` are picked up by `flutter_rust_bridge` codegen.

pub mod api;
