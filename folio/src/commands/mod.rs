pub mod check_config;
pub mod contact;
pub mod email;
pub mod serve;
