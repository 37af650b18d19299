pub mod descriptor;
pub mod formats;
pub mod headers;

pub use descriptor::StreamDescriptor;
pub use formats::{EndpointKind, PlaylistKind};
pub use headers::RequestHeaders;
