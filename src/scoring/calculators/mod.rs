pub use capture::CaptureCalculator;
pub use genocide::GenocideCalculator;
pub use kill::KillCalculator;
pub use rampage::RampageCalculator;

mod capture;
mod genocide;
mod kill;
mod rampage;
