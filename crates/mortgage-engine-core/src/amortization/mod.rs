pub mod combined;
pub mod schedule;
pub mod summary;
