pub mod event;
pub mod game;
pub mod scores;
pub mod session;
pub mod step;
