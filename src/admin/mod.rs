//! Administrative overlay writes
//!
//! Every write resolves the actor, checks the administrative threshold,
//! validates, writes, invalidates the department's composed menus and then
//! publishes an activity event. Errors propagate to the caller.

mod menus;
mod roles;

pub use menus::MenuAdmin;
pub use roles::RoleAdmin;
