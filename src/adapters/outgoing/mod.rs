pub mod kraft_metadata_store;

pub use kraft_metadata_store::KraftMetadataStore;
