mod health;
mod post;
mod profile;
mod user;

pub use health::health_check;
pub use post::{create_post, get_post, get_posts, get_posts_by_user};
pub use profile::get_user_by_username;
pub use user::{get_current_user, login, signup};
