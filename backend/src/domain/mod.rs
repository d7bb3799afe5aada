pub mod export;
pub mod periods;
pub mod roster;
pub mod session;
pub mod validator;
