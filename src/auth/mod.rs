mod claims;
pub mod extractors;
pub mod jwt;
