//! Core domain entities representing the business data model.
//!
//! # Entity Types
//!
//! - [`User`] - An account owning links, with a role and a link quota
//! - [`Link`] - A slug → target URL mapping, anonymous or owned
//! - [`Click`] - A single redirect through a link
//! - [`Session`] - A server-side login session
//!
//! # Design Pattern
//!
//! Entities have separate structs for creation (`NewUser`, `NewLink`,
//! `NewClick`, `NewSession`) and partial updates (`LinkPatch`).

pub mod click;
pub mod link;
pub mod session;
pub mod user;

pub use click::{Click, DailyClicks, NewClick, ValueCount};
pub use link::{Link, LinkCounts, LinkPatch, NewLink};
pub use session::{NewSession, Session};
pub use user::{AuthProvider, NewUser, Role, User, UserSummary};
