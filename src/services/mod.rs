pub mod user_service;

pub use user_service::{UserCreate, UserError, UserLogin, UserRegister, UserService};
