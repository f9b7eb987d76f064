//! Persistence abstractions the domain depends on but does not implement.

mod processed_file_repository;

pub use processed_file_repository::ProcessedFileRepository;
