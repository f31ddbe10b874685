//! Goder Module Locator
//!
//! Finds the on-disk source of external Go packages. This crate provides:
//! - Module cache discovery (`GOMODCACHE`, `GOPATH/pkg/mod`, `~/go/pkg/mod`)
//! - Import path resolution against versioned `name@version` directories
//! - Module path escaping as used by the module cache
//! - `go.mod` parsing for version pins
//! - Host allow-list checks deciding which imports are external

pub mod escape;
pub mod gomod;
pub mod host;
pub mod locator;

pub use escape::{escape_path, unescape_path};
pub use gomod::{find_go_mod, GoMod, GoModError, Require};
pub use host::{host_of, is_allowed, is_external, DEFAULT_HOSTS};
pub use locator::{source_files, LocateError, Location, ModuleLocator};
