pub mod fallback;
pub mod profile_builder;
pub mod ranking;
pub mod recommender;
pub mod text;
pub mod vector_space;

pub use fallback::FallbackRecommender;
pub use profile_builder::{ProfileBuilder, UserProfile};
pub use ranking::SimilarityRanker;
pub use recommender::EventRecommender;
pub use text::TextPipeline;
pub use vector_space::{VocabularyCache, VocabularyModel};
