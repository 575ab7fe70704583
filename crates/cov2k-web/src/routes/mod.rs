mod combine;
mod entities;
mod health;

pub use combine::combine_routes;
pub use entities::entity_routes;
pub use health::health_routes;
