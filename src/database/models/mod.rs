pub mod document;
pub mod handbook;
pub mod membership;
pub mod organization;
pub mod subscription;
pub mod user;

pub use document::Document;
pub use handbook::{
    Handbook, HandbookTree, HandbookUpdate, NewPage, NewSection, Page, PageUpdate, Section,
    SectionUpdate, SectionWithPages,
};
pub use membership::{Member, Membership, OrganizationMembership};
pub use organization::{validate_slug, NewOrganization, Organization, OrganizationUpdate};
pub use subscription::{Plan, Subscription};
pub use user::User;
