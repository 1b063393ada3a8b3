pub mod metadata;
pub mod movie;

pub use metadata::{CollectionDetails, CollectionPart, CollectionRef, MovieDetails, MovieHit};
pub use movie::{Movie, MovieFields};
