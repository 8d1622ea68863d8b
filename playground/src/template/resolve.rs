//! Deferred resolution of expressions over a finished set of services.

use std::collections::HashMap;

use tracing::trace;

use super::{
    PortAllocator,
    expr::{self, Expr, Segment},
};
use crate::{
    error::{ManifestError, Result},
    manifest::{ExContext, Protocol, Service},
};

/// Bind-all host used by `Addr`.
pub const BIND_ALL: &str = "0.0.0.0";

/// Concrete ports of every service, keyed by service then logical name.
type PortTable = HashMap<String, HashMap<String, u16>>;

/// Resolves every expression in `services` in place.
///
/// Runs three passes: ports referenced through `Port`/`Addr` are declared on
/// their owning service, every port is allocated in `(service, port)` name
/// order, and finally all strings are substituted. Allocation order does not
/// depend on the order services were registered in.
pub(crate) fn resolve(
    services: &mut [Service],
    ctx: &ExContext,
    allocator: &PortAllocator,
) -> Result<()> {
    declare_ports(services)?;
    let table = allocate_ports(services, allocator)?;

    for service in services.iter_mut() {
        let name = service.name().to_string();
        for field in service.templated_fields_mut() {
            if field.contains("{{") {
                let rendered = render(field, &name, &table, ctx)?;
                trace!(service = %name, from = %field, to = %rendered, "resolved expression");
                *field = rendered;
            }
        }
    }

    Ok(())
}

/// Returns true when any string field still holds an expression.
pub(crate) fn has_expressions(services: &[Service]) -> bool {
    services.iter().flat_map(Service::templated_fields).any(|field| field.contains("{{"))
}

fn declare_ports(services: &mut [Service]) -> Result<()> {
    for service in services.iter_mut() {
        let mut declared = Vec::new();
        for field in service.templated_fields() {
            for expr in expr::expressions(field)? {
                if let Expr::Port { name, default } | Expr::Addr { name, default } = expr {
                    declared.push((name, default));
                }
            }
        }
        for (name, default) in declared {
            if service.port(&name).is_none() {
                service.with_port(name, default, Protocol::Tcp);
            }
        }
    }
    Ok(())
}

fn allocate_ports(services: &mut [Service], allocator: &PortAllocator) -> Result<PortTable> {
    let mut order: Vec<(usize, usize)> = services
        .iter()
        .enumerate()
        .flat_map(|(s, service)| (0..service.ports.len()).map(move |p| (s, p)))
        .collect();
    order.sort_by(|&(sa, pa), &(sb, pb)| {
        (services[sa].name(), &services[sa].ports[pa].name)
            .cmp(&(services[sb].name(), &services[sb].ports[pb].name))
    });

    let mut table = PortTable::new();
    for (s, p) in order {
        let service_name = services[s].name().to_string();
        let port = &mut services[s].ports[p];
        port.port = allocator.allocate(&service_name, &port.name, port.port)?;
        table.entry(service_name).or_default().insert(port.name.clone(), port.port);
    }
    for service in services.iter() {
        table.entry(service.name().to_string()).or_default();
    }

    Ok(table)
}

fn render(input: &str, current: &str, table: &PortTable, ctx: &ExContext) -> Result<String> {
    let mut out = String::with_capacity(input.len());
    for segment in expr::parse(input)? {
        match segment {
            Segment::Literal(text) => out.push_str(text),
            Segment::Expr(Expr::Port { name, .. }) => {
                out.push_str(&lookup(table, current, &name)?.to_string());
            }
            Segment::Expr(Expr::Addr { name, .. }) => {
                out.push_str(&format!("{BIND_ALL}:{}", lookup(table, current, &name)?));
            }
            Segment::Expr(Expr::Dir) => out.push_str(&ctx.output_dir().to_string_lossy()),
            Segment::Expr(Expr::Connect { service, port, scheme }) => {
                let port = lookup(table, &service, &port)?;
                if scheme.is_empty() {
                    out.push_str(&format!("{service}:{port}"));
                } else {
                    out.push_str(&format!("{scheme}://{service}:{port}"));
                }
            }
        }
    }
    Ok(out)
}

fn lookup(table: &PortTable, service: &str, port: &str) -> Result<u16> {
    let ports = table
        .get(service)
        .ok_or_else(|| ManifestError::UnknownServiceReference(service.to_string()))?;
    ports.get(port).copied().ok_or_else(|| ManifestError::UnknownPortReference {
        service: service.to_string(),
        port: port.to_string(),
    })
}
