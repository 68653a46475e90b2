mod momentum;
mod optimizer;

pub use momentum::GradientDescentWithMomentum;
pub use optimizer::Optimizer;
