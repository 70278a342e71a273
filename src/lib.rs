pub mod feed;
pub mod http_client;
pub mod leaderboard;
pub mod leaderboard_fetch;
pub mod state;
pub mod viewer;
