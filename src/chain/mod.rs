pub mod accessor;
pub mod committer;

pub use committer::ScoreCommitter;
