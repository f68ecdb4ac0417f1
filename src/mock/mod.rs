pub mod generator;
pub mod negotiation;
pub mod server;

pub use generator::{example_for_format, ExampleGenerator, FirstChoice, FixedChoice, RandomSource, ThreadRandom};
pub use negotiation::negotiate;
pub use server::MockServer;
