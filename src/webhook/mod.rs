pub mod composer;
pub mod decoder;
pub mod transport;

pub use composer::{Payload, PayloadKind, PayloadMetadata, RequestComposer};
pub use decoder::{decode, EMPTY_BODY};
pub use transport::{HttpTransport, RawResponse, Transport};
