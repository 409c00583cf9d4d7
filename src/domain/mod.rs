// Domain layer: plain models and ports. No process or network access here.

pub mod model;
pub mod ports;
