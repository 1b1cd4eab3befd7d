pub mod auth;
pub mod blogs;
pub mod categories;
pub mod client;
pub mod contracts;
pub mod courses;
pub mod enrollments;
pub mod error;
pub mod feed;
pub mod files;
pub mod lessons;
pub mod modules;
pub mod session;
pub mod tags;
pub mod users;
