mod accuracy;

pub use accuracy::Accuracy;
