pub mod builder_file;
pub mod builder_output;
pub mod dependencies;
pub mod swift_ring_builder;
