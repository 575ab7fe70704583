pub mod combine;
pub mod entities;
pub mod import;
pub mod serve;
