pub mod login; // POST /auth/login - authenticate and get a session token

pub use login::login_post;
