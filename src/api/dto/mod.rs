pub mod migration;

pub use migration::{
    BoardCardsRequest, CardOption, ListCardsRequest, LoadBoardsRequest, LoadBoardsResponse,
    MigrationStarted, StartMigrationRequest,
};
