mod user_repository;
mod event_repository;
mod post_repository;
mod like_repository;
mod comment_repository;
mod follow_repository;
mod hotspot_repository;

pub use user_repository::UserRepository;
pub use event_repository::EventRepository;
pub use post_repository::{PostRepository, FEED_LIMIT};
pub use like_repository::LikeRepository;
pub use comment_repository::CommentRepository;
pub use follow_repository::FollowRepository;
pub use hotspot_repository::HotspotRepository;
