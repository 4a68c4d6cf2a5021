pub mod fixtures;
pub mod mock_ai;
pub mod mock_git;
pub mod mock_ticket;
