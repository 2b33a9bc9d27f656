//! Sample entities served by the demo

mod localidad;
mod provincia;

pub use localidad::Localidad;
pub use provincia::Provincia;
