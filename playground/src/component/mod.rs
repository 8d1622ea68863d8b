//! Components know how to populate the service descriptor for one kind of node.
//!
//! A component only writes its own service. Anything that depends on another
//! service (its ports, its address) is written as an expression from
//! [`crate::template`] and filled in once the whole manifest is known.

use std::fmt;

use crate::manifest::{ExContext, Service};

mod l1;
pub use l1::{LighthouseBeaconNode, LighthouseValidator, RethEl};

mod l2;
pub use l2::{OpBatcher, OpGeth, OpNode, RollupBoost};

mod phylax;
pub use phylax::{AssertionDa, OpTalos};

/// Label holding a service's devp2p enode once it is known.
pub const ENODE_LABEL: &str = "enode";

/// Label overriding the metrics scrape path of a service.
pub const METRICS_PATH_LABEL: &str = "metrics_path";

/// A kind of service that can be added to a [`Manifest`].
///
/// [`Manifest`]: crate::Manifest
pub trait Component: fmt::Debug {
    /// Component name, recorded on the service it populates.
    fn name(&self) -> &str;

    /// Populates `service`.
    fn run(&self, service: &mut Service, ctx: &ExContext);
}

impl<C: Component + ?Sized> Component for &C {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn run(&self, service: &mut Service, ctx: &ExContext) {
        (**self).run(service, ctx)
    }
}

impl<C: Component + ?Sized> Component for Box<C> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn run(&self, service: &mut Service, ctx: &ExContext) {
        (**self).run(service, ctx)
    }
}

/// Allow-any-origin flags for each endpoint in `flags`, set only behind the proxy.
pub(crate) fn cors_flags(ctx: &ExContext, flags: &[&str]) -> Vec<String> {
    if !ctx.reverse_proxy() {
        return Vec::new();
    }
    flags.iter().flat_map(|flag| [flag.to_string(), "*".to_string()]).collect()
}
