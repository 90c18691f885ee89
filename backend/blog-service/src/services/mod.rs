/// Business logic layer
pub mod comments;
pub mod feed;
pub mod follow;
pub mod groups;
pub mod posts;

pub use comments::CommentService;
pub use feed::{FeedComposer, FeedScope};
pub use follow::{FollowGraph, FollowOutcome, UnfollowOutcome};
pub use groups::GroupService;
pub use posts::PostService;
