pub mod about;
pub mod auth;
pub mod category;
pub mod dashboard;
pub mod drawing;
pub mod feedback;
pub mod post;
pub mod project;
pub mod settings;
pub mod site;
pub mod slide;
pub mod upload;
pub mod users;
pub mod video;
