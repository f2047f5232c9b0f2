//! # jet9-mods
//!
//! Action modules linked into the server binary. [`catalog`] lists them for
//! the router builder.

#![deny(unsafe_code)]

pub mod dns;

use jet9_rpc::ModuleCatalog;

/// Every module shipped with the server, in load order.
pub fn catalog() -> ModuleCatalog {
    ModuleCatalog::new().with_module(dns::MODULE, dns::load)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jet9_rpc::RouterBuilder;

    #[test]
    fn catalog_builds_cleanly() {
        let table = RouterBuilder::new(catalog()).build().unwrap();
        assert_eq!(table.subsystems(), vec!["dns"]);
        assert_eq!(table.get("dns").unwrap().module(), dns::MODULE);
    }
}
