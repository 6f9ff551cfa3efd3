pub mod accessors;
pub mod bounds;
pub mod constructors;
