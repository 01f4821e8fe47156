// Entity Models
//
// Member owns zero or more Contributions. Each entity has a stored record type,
// an input type for creation, and (for members) a partial-update patch.

pub mod member;
pub mod contribution;

pub use member::{Member, MemberPatch, NewMember};
pub use contribution::{Contribution, MemberContribution, NewContribution};
