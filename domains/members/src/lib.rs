//! Members domain: the community gate new members must pass, and their profiles

pub mod api;
pub mod domain;
pub mod repository;

// Re-export domain types at the crate root for convenience
pub use domain::entities::Member;
pub use domain::gate::{CommunityGate, CommunityQuestion, GateConfig, ACCESS_DENIED};

// Re-export repository types
pub use repository::{InMemoryMemberRepository, MemberRepository, PgMemberRepository};

// Re-export API types
pub use api::routes;
pub use api::MembersState;
