pub use tracker::PlayingTimeTracker;

mod tracker;
