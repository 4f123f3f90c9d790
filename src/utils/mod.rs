pub mod growth;
pub mod sentinel;
pub mod sort;
