//! The expression language used to defer ports and addresses until the whole
//! manifest is known.
//!
//! Components write expressions into argument, environment and label strings
//! with the helpers below. [`Manifest::resolve`] later replaces them with
//! concrete values.
//!
//! | expression                         | resolves to                          |
//! |------------------------------------|--------------------------------------|
//! | `{{Port "http" 8545}}`             | port of the current service          |
//! | `{{Addr "http" 8545}}`             | `0.0.0.0:<port>` of current service  |
//! | `{{Dir}}`                          | absolute output directory of the run |
//! | `{{Connect "el" "authrpc"}}`       | `http://el:<port>`                   |
//! | `{{Connect "el" "p2p" ""}}`        | `el:<port>`                          |
//!
//! [`Manifest::resolve`]: crate::Manifest::resolve

mod allocator;
pub use allocator::PortAllocator;

pub mod expr;
pub use expr::{Expr, Segment};

mod resolve;
pub use resolve::BIND_ALL;
pub(crate) use resolve::{has_expressions, resolve};

/// A port of the current service.
pub fn port(name: &str, default: u16) -> String {
    format!("{{{{Port \"{name}\" {default}}}}}")
}

/// A bind-all listen address on a port of the current service.
pub fn addr(name: &str, default: u16) -> String {
    format!("{{{{Addr \"{name}\" {default}}}}}")
}

/// The run's output directory.
pub fn dir() -> String {
    "{{Dir}}".to_string()
}

/// The `http://` address of another service's port inside the run's network.
pub fn connect(service: &str, port: &str) -> String {
    format!("{{{{Connect \"{service}\" \"{port}\"}}}}")
}

/// Like [`connect`] with an explicit scheme. An empty scheme yields `host:port`.
pub fn connect_with_scheme(service: &str, port: &str, scheme: &str) -> String {
    format!("{{{{Connect \"{service}\" \"{port}\" \"{scheme}\"}}}}")
}
