mod post;
mod user;

pub use post::{Author, Post, PostWithAuthor};
pub use user::User;
