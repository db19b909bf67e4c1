/// Failure while fetching or decoding an asset.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to read {location}: {source}")]
    Read {
        location: String,
        #[source]
        source: std::io::Error,
    },
    #[error("request for {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },
    #[error("failed to decode HDR image {location}: {source}")]
    Hdr {
        location: String,
        #[source]
        source: image::ImageError,
    },
    #[error("environment map {location} has unusable dimensions {width}x{height}")]
    EmptyImage {
        location: String,
        width: u32,
        height: u32,
    },
    #[error("failed to decode glTF {location}: {source}")]
    Gltf {
        location: String,
        #[source]
        source: ::gltf::Error,
    },
    #[error("{location} contains no triangle mesh")]
    NoMesh { location: String },
    #[error("could not start loader thread: {source}")]
    Spawn {
        #[source]
        source: std::io::Error,
    },
}
