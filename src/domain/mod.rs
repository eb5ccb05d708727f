// Domain layer: cart model and the persistence port. No runtime or adapter dependencies.

pub mod model;
pub mod ports;
