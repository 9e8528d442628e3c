// Git plumbing: command worker and working-copy preparation.

pub mod repository;
pub mod worker;
