// Domain layer: the tabular model and the ports stages depend on.

pub mod model;
pub mod ports;
