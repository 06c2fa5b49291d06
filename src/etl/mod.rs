/// ETL Pipeline Module
///
/// The stages a dropped file passes through:
/// - Extract: Parse raw file bytes into ordered records
/// - Transform: Chunk records and coerce them into typed rows
/// - Load: Persist each chunk under its own transaction
pub mod extract;
pub mod load;
pub mod transform;
