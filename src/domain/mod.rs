pub mod cell;
pub mod entity;
pub mod grid;
pub mod rules;
pub mod visibility;
