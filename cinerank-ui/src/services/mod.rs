//! External service clients

pub mod poster;

pub use poster::PosterClient;
