pub mod mock_metadata_client;

#[allow(unused_imports)]
pub use mock_metadata_client::{MockFailure, MockMetadataClient};
