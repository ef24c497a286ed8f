/// Data ingestion from the document store.
///
/// `store` defines the narrow read interface and the raw record format,
/// `firestore` implements it over the Firestore REST API, and `assembler`
/// turns per-day documents into sorted per-kind series.

pub mod assembler;
pub mod firestore;
pub mod store;
