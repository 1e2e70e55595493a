//! Record types stored by the application.

mod post;
mod rsvp;
mod user;

pub use post::Post;
pub use rsvp::Rsvp;
pub use user::User;
